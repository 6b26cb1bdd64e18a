use std::io::{Read, Write};

use crate::disk::ImageFile;
use crate::fs::config::BLOCK_SIZE;
use crate::fs::error::Result;
use crate::fs::inode_table::Inode;
use crate::fs::super_block::SuperBlock;

/// 数据块在镜像文件中的字节偏移
pub fn block_offset(sb: &SuperBlock, block: u64) -> u64 {
    sb.data_offset + block * BLOCK_SIZE
}

/// 把 source 按块大小分块写进 inode 的 extent 序列。
/// extent 按分配顺序访问，extent 内块号递增；
/// 末块只写实际剩余的字节，磁盘上不做零填充。
pub fn write_stream(
    img: &mut ImageFile,
    sb: &SuperBlock,
    inode: &Inode,
    source: &mut impl Read,
) -> Result<()> {
    let mut remaining = inode.size;
    let mut buf = [0u8; BLOCK_SIZE as usize];
    for extent in inode.extents() {
        for block in extent.blocks() {
            if remaining == 0 {
                break;
            }
            let chunk = remaining.min(BLOCK_SIZE) as usize;
            source.read_exact(&mut buf[..chunk])?;
            img.write_at(block_offset(sb, block), &buf[..chunk])?;
            remaining -= chunk as u64;
        }
        if remaining == 0 {
            break;
        }
    }
    Ok(())
}

/// 从 inode 的 extent 序列读出恰好 size 字节写到 sink，
/// 字节数凑够即停，哪怕 extent 还有剩余容量
pub fn read_stream(
    img: &mut ImageFile,
    sb: &SuperBlock,
    inode: &Inode,
    sink: &mut impl Write,
) -> Result<()> {
    let mut remaining = inode.size;
    let mut buf = [0u8; BLOCK_SIZE as usize];
    for extent in inode.extents() {
        for block in extent.blocks() {
            if remaining == 0 {
                break;
            }
            let chunk = remaining.min(BLOCK_SIZE) as usize;
            img.read_at(block_offset(sb, block), &mut buf[..chunk])?;
            sink.write_all(&buf[..chunk])?;
            remaining -= chunk as u64;
        }
        if remaining == 0 {
            break;
        }
    }
    Ok(())
}
