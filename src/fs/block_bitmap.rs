use crate::disk::ImageFile;
use crate::fs::error::Result;
use crate::fs::super_block::SuperBlock;

/// 空闲块位图：每个数据块一个字节，0 = 空闲，1 = 已用，
/// 在镜像中作为一整段连续区域读写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBitmap {
    bytes: Vec<u8>,
    offset: u64,
}

impl BlockBitmap {
    /// 全空位图（格式化用）
    pub fn new_empty(sb: &SuperBlock) -> Self {
        Self {
            bytes: vec![0; sb.block_count as usize],
            offset: sb.block_bitmap_offset,
        }
    }

    pub fn load(img: &mut ImageFile, sb: &SuperBlock) -> Result<Self> {
        let mut bytes = vec![0u8; sb.block_count as usize];
        img.read_at(sb.block_bitmap_offset, &mut bytes)?;
        Ok(Self {
            bytes,
            offset: sb.block_bitmap_offset,
        })
    }

    pub fn save(&self, img: &mut ImageFile) -> Result<()> {
        img.write_at(self.offset, &self.bytes)?;
        Ok(())
    }

    pub fn block_count(&self) -> u64 {
        self.bytes.len() as u64
    }

    // 越界的块号属于调用方的编程错误，直接终止而不是默默忽略

    pub fn is_free(&self, block: u64) -> bool {
        assert!(
            block < self.block_count(),
            "block index {} out of range",
            block
        );
        self.bytes[block as usize] == 0
    }

    pub fn mark_used(&mut self, block: u64) {
        assert!(
            block < self.block_count(),
            "block index {} out of range",
            block
        );
        self.bytes[block as usize] = 1;
    }

    pub fn mark_free(&mut self, block: u64) {
        assert!(
            block < self.block_count(),
            "block index {} out of range",
            block
        );
        self.bytes[block as usize] = 0;
    }

    /// 统计空闲块数，用于校验 free_blocks 与位图一致
    pub fn free_count(&self) -> u64 {
        self.bytes.iter().filter(|&&b| b == 0).count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::BlockBitmap;
    use crate::fs::layout::Layout;
    use crate::fs::super_block::SuperBlock;

    fn bitmap() -> BlockBitmap {
        let layout = Layout::compute(200_000).unwrap();
        BlockBitmap::new_empty(&SuperBlock::new(&layout))
    }

    #[test]
    fn mark_and_query() {
        let mut bm = bitmap();
        assert!(bm.is_free(0));
        bm.mark_used(0);
        assert!(!bm.is_free(0));
        bm.mark_free(0);
        assert!(bm.is_free(0));
    }

    #[test]
    fn free_count_tracks_marks() {
        let mut bm = bitmap();
        let total = bm.block_count();
        assert_eq!(bm.free_count(), total);
        bm.mark_used(1);
        bm.mark_used(3);
        assert_eq!(bm.free_count(), total - 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_is_fatal() {
        let bm = bitmap();
        bm.is_free(bm.block_count());
    }
}
