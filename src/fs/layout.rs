use crate::fs::config::{BLOCK_SIZE, INODE_COUNT, INODE_SIZE, SUPER_BLOCK_SIZE};
use crate::fs::error::{FsError, Result};

/// 格式化时算出的镜像布局，此后各偏移不再变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub block_count: u32,
    pub inode_table_offset: u64,
    pub block_bitmap_offset: u64,
    pub data_offset: u64,
    /// 镜像文件的最终大小（数据区末尾）
    pub total_size: u64,
}

impl Layout {
    /// 按两段式流程计算布局：
    /// 第一段用"总大小 / 块大小"估算位图开销，
    /// 开销 = 超级块 + inode 表 + 估算位图，剩余空间除以块大小得到最终块数；
    /// 第二段位图按最终块数定尺寸（每块一字节）。
    pub fn compute(requested: u64) -> Result<Layout> {
        let estimated_blocks = requested / BLOCK_SIZE;
        if estimated_blocks < 1 {
            return Err(FsError::TooSmall { requested });
        }

        let inode_table_size = INODE_COUNT as u64 * INODE_SIZE;
        let overhead = SUPER_BLOCK_SIZE + inode_table_size + estimated_blocks;
        if requested <= overhead {
            return Err(FsError::TooSmall { requested });
        }

        let data_space = requested - overhead;
        let block_count = data_space / BLOCK_SIZE;
        if block_count < 1 {
            return Err(FsError::TooSmall { requested });
        }

        let inode_table_offset = SUPER_BLOCK_SIZE;
        let block_bitmap_offset = inode_table_offset + inode_table_size;
        let data_offset = block_bitmap_offset + block_count;
        let total_size = data_offset + block_count * BLOCK_SIZE;

        Ok(Layout {
            block_count: block_count as u32,
            inode_table_offset,
            block_bitmap_offset,
            data_offset,
            total_size,
        })
    }
}
