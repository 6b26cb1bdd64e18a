use serde::{Deserialize, Serialize};

use crate::disk::ImageFile;
use crate::fs::config::{INODE_COUNT, MAGIC, SUPER_BLOCK_SIZE};
use crate::fs::error::{FsError, Result};
use crate::fs::layout::Layout;

/// 超级块：镜像的整体几何信息，固定存放在偏移 0 处。
/// 各区域偏移在格式化时算好，此后不再变化；
/// free_blocks 必须始终等于位图中 0 字节的个数。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub signature: [u8; 4],
    pub block_count: u32,
    pub inode_count: u32,
    pub free_blocks: u32,
    pub inode_table_offset: u64,
    pub block_bitmap_offset: u64,
    pub data_offset: u64,
}

impl SuperBlock {
    pub fn new(layout: &Layout) -> Self {
        Self {
            signature: MAGIC,
            block_count: layout.block_count,
            inode_count: INODE_COUNT,
            free_blocks: layout.block_count,
            inode_table_offset: layout.inode_table_offset,
            block_bitmap_offset: layout.block_bitmap_offset,
            data_offset: layout.data_offset,
        }
    }

    /// 从镜像头部读出超级块；签名不符时在读任何其他字段之前拒绝
    pub fn load(img: &mut ImageFile) -> Result<Self> {
        let mut buf = [0u8; SUPER_BLOCK_SIZE as usize];
        img.read_at(0, &mut buf)?;
        let sb: SuperBlock = bincode::deserialize(&buf)
            .map_err(|e| FsError::Corrupted(format!("superblock: {}", e)))?;
        if sb.signature != MAGIC {
            return Err(FsError::BadSignature);
        }
        Ok(sb)
    }

    /// 写回镜像头部，编码后补零到固定区域大小
    pub fn save(&self, img: &mut ImageFile) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| FsError::Corrupted(format!("superblock: {}", e)))?;
        let mut buf = [0u8; SUPER_BLOCK_SIZE as usize];
        buf[..bytes.len()].copy_from_slice(&bytes);
        img.write_at(0, &buf)?;
        Ok(())
    }
}
