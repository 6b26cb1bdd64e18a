use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::disk::ImageFile;
use crate::fs::block_bitmap::BlockBitmap;
use crate::fs::config::{BLOCK_SIZE, HIDDEN_PREFIX, MAX_NAME_LEN};
use crate::fs::error::{FsError, Result};
use crate::fs::inode_table::{Inode, InodeTable};
use crate::fs::layout::Layout;
use crate::fs::super_block::SuperBlock;

pub mod block_bitmap;
pub mod config;
pub mod data_area;
pub mod error;
pub mod extent_alloc;
pub mod inode_table;
pub mod layout;
pub mod super_block;

/// 镜像文件系统门面，唯一直接改写持久化状态的组件。
/// 不持有打开的句柄：每个操作打开镜像、完成读写、随作用域关闭；
/// 多个进程并发操作同一镜像不受支持。
#[derive(Debug, Clone)]
pub struct FileSystem {
    path: PathBuf,
}

/// format 的结果摘要
#[derive(Debug)]
pub struct FormatReport {
    pub block_count: u32,
    pub total_size: u64,
}

/// ls 的一行
#[derive(Debug)]
pub struct FileEntry {
    pub index: u32,
    pub name: String,
    pub size: u64,
    pub extent_count: u32,
}

#[derive(Debug)]
pub struct ListReport {
    pub entries: Vec<FileEntry>,
    pub free_blocks: u32,
    pub block_count: u32,
}

/// map 输出：区域偏移加位图的游程汇总
#[derive(Debug)]
pub struct LayoutReport {
    pub inode_table_offset: u64,
    pub block_bitmap_offset: u64,
    pub data_offset: u64,
    pub block_count: u32,
    pub free_blocks: u32,
    pub runs: Vec<BitmapRun>,
}

/// 位图中一段状态相同的连续块（闭区间）
#[derive(Debug, PartialEq, Eq)]
pub struct BitmapRun {
    pub start: u64,
    pub end: u64,
    pub used: bool,
    pub owner: Option<String>,
}

impl FileSystem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 格式化：按申请大小计算布局，写入空 inode 表、全零位图和超级块。
    /// 重复执行会直接覆盖已有镜像。
    pub fn format(&self, requested_size: u64) -> Result<FormatReport> {
        let layout = Layout::compute(requested_size)?;
        let mut img = ImageFile::create_sized(&self.path, layout.total_size)?;

        let sb = SuperBlock::new(&layout);
        let table = InodeTable::new(&sb);
        let empty = Inode::empty();
        for i in 0..sb.inode_count {
            table.write_inode(&mut img, i, &empty)?;
        }
        BlockBitmap::new_empty(&sb).save(&mut img)?;
        sb.save(&mut img)?;

        Ok(FormatReport {
            block_count: sb.block_count,
            total_size: layout.total_size,
        })
    }

    /// 导入：占一个空闲 inode，为内容分配 extent，再把 source 流式写入数据区。
    /// 持久化顺序固定：inode → 位图 → 超级块。
    /// 返回占用的 inode 下标。
    pub fn import(&self, source: &mut impl Read, size: u64, name: &str) -> Result<u32> {
        if name.len() > MAX_NAME_LEN {
            return Err(FsError::NameTooLong(name.to_string()));
        }

        let mut img = ImageFile::open_rw(&self.path)?;
        let mut sb = SuperBlock::load(&mut img)?;
        let table = InodeTable::new(&sb);

        let index = table
            .find_first_free(&mut img)?
            .ok_or(FsError::DirectoryFull)?;

        let mut bitmap = BlockBitmap::load(&mut img, &sb)?;
        let blocks_needed = (size + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let extents = extent_alloc::allocate(&mut bitmap, &mut sb, blocks_needed)?;

        let mut inode = Inode::new(name, size);
        for (slot, extent) in inode.extents.iter_mut().zip(extents.iter()) {
            *slot = *extent;
        }
        inode.extent_count = extents.len() as u32;

        data_area::write_stream(&mut img, &sb, &inode, source)?;
        table.write_inode(&mut img, index, &inode)?;
        bitmap.save(&mut img)?;
        sb.save(&mut img)?;
        Ok(index)
    }

    /// 导出：把名字精确匹配的文件内容原样写到 sink，返回字节数
    pub fn export(&self, name: &str, sink: &mut impl Write) -> Result<u64> {
        let mut img = ImageFile::open_ro(&self.path)?;
        let sb = SuperBlock::load(&mut img)?;
        let (_, inode) = InodeTable::new(&sb)
            .find_by_name(&mut img, name)?
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        data_area::read_stream(&mut img, &sb, &inode, sink)?;
        Ok(inode.size)
    }

    /// 删除：释放位图中该文件的所有块，回加 free_blocks，inode 槽位清零
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut img = ImageFile::open_rw(&self.path)?;
        let mut sb = SuperBlock::load(&mut img)?;
        let table = InodeTable::new(&sb);
        let (index, inode) = table
            .find_by_name(&mut img, name)?
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;

        let mut bitmap = BlockBitmap::load(&mut img, &sb)?;
        let freed = extent_alloc::release(&mut bitmap, inode.extents());
        sb.free_blocks += freed as u32;

        table.write_inode(&mut img, index, &Inode::empty())?;
        bitmap.save(&mut img)?;
        sb.save(&mut img)?;
        Ok(())
    }

    /// 列目录：按 inode 下标顺序；默认跳过以隐藏前缀开头的名字
    pub fn list(&self, include_hidden: bool) -> Result<ListReport> {
        let mut img = ImageFile::open_ro(&self.path)?;
        let sb = SuperBlock::load(&mut img)?;
        let table = InodeTable::new(&sb);

        let mut entries = Vec::new();
        for i in 0..sb.inode_count {
            let inode = table.read_inode(&mut img, i)?;
            if !inode.is_used {
                continue;
            }
            if !include_hidden && inode.name.starts_with(HIDDEN_PREFIX) {
                continue;
            }
            entries.push(FileEntry {
                index: i,
                name: inode.name,
                size: inode.size,
                extent_count: inode.extent_count,
            });
        }
        Ok(ListReport {
            entries,
            free_blocks: sb.free_blocks,
            block_count: sb.block_count,
        })
    }

    /// 镜像结构汇总：各区域偏移加位图的游程编码。
    /// with_owners 时重扫全部 inode 建立块到文件名的映射，
    /// 每块 O(inodeCount·extents) 的诊断路径，后扫到的 inode 覆盖先扫到的。
    pub fn describe_layout(&self, with_owners: bool) -> Result<LayoutReport> {
        let mut img = ImageFile::open_ro(&self.path)?;
        let sb = SuperBlock::load(&mut img)?;

        let mut owners: Vec<Option<String>> = vec![None; sb.block_count as usize];
        if with_owners {
            let table = InodeTable::new(&sb);
            for i in 0..sb.inode_count {
                let inode = table.read_inode(&mut img, i)?;
                if !inode.is_used {
                    continue;
                }
                for extent in inode.extents() {
                    for block in extent.blocks() {
                        owners[block as usize] = Some(inode.name.clone());
                    }
                }
            }
        }

        let bitmap = BlockBitmap::load(&mut img, &sb)?;
        let mut runs: Vec<BitmapRun> = Vec::new();
        for block in 0..bitmap.block_count() {
            let used = !bitmap.is_free(block);
            let owner = owners[block as usize].clone();
            match runs.last_mut() {
                Some(run) if run.used == used && run.owner == owner => run.end = block,
                _ => runs.push(BitmapRun {
                    start: block,
                    end: block,
                    used,
                    owner,
                }),
            }
        }

        Ok(LayoutReport {
            inode_table_offset: sb.inode_table_offset,
            block_bitmap_offset: sb.block_bitmap_offset,
            data_offset: sb.data_offset,
            block_count: sb.block_count,
            free_blocks: sb.free_blocks,
            runs,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::PathBuf;

    /// 每个测试用独立的临时镜像文件，结束时自动清理
    pub struct TempImage(pub PathBuf);

    impl TempImage {
        pub fn new(tag: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("fragfs-{}-{}.img", tag, uuid::Uuid::new_v4()));
            Self(path)
        }
    }

    impl Drop for TempImage {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }
}
