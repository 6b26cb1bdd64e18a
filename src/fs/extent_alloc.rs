use crate::fs::block_bitmap::BlockBitmap;
use crate::fs::config::MAX_FRAGS;
use crate::fs::error::{FsError, Result};
use crate::fs::inode_table::Extent;
use crate::fs::super_block::SuperBlock;

/// 为 `blocks_needed` 个数据块挑选 extent。
///
/// 从块 0 开始贪心扫描，每段连续空闲区间构成一个 extent，
/// 末段截断到恰好凑齐所需块数，不会多占。
/// 先做只读的规划扫描，确认整个请求能在 MAX_FRAGS 个 extent
/// 内满足之后才改写位图和 free_blocks，
/// 因此失败的分配不会在位图里留下任何已标记的块。
pub fn allocate(
    bitmap: &mut BlockBitmap,
    sb: &mut SuperBlock,
    blocks_needed: u64,
) -> Result<Vec<Extent>> {
    if blocks_needed == 0 {
        return Ok(Vec::new());
    }

    // 规划阶段
    let total = bitmap.block_count();
    let mut plan: Vec<Extent> = Vec::with_capacity(MAX_FRAGS);
    let mut allocated = 0u64;
    let mut i = 0u64;
    while i < total && allocated < blocks_needed {
        if bitmap.is_free(i) {
            let start = i;
            let mut length = 0u64;
            while i < total && bitmap.is_free(i) && allocated + length < blocks_needed {
                i += 1;
                length += 1;
            }
            if plan.len() == MAX_FRAGS {
                return Err(over_limit_error(bitmap, blocks_needed));
            }
            plan.push(Extent {
                start: start as i64,
                count: length,
            });
            allocated += length;
        } else {
            i += 1;
        }
    }

    if allocated < blocks_needed {
        return Err(FsError::InsufficientSpace {
            needed: blocks_needed,
            free: bitmap.free_count(),
        });
    }

    // 提交阶段：位图与 free_blocks 同步更新
    for extent in &plan {
        for block in extent.blocks() {
            bitmap.mark_used(block);
        }
    }
    sb.free_blocks -= blocks_needed as u32;
    Ok(plan)
}

// 碎片超限时区分两种失败：空闲总量本来就不够报 InsufficientSpace，
// 够但拼不进 MAX_FRAGS 个 extent 才报 TooFragmented
fn over_limit_error(bitmap: &BlockBitmap, blocks_needed: u64) -> FsError {
    let free = bitmap.free_count();
    if free < blocks_needed {
        FsError::InsufficientSpace {
            needed: blocks_needed,
            free,
        }
    } else {
        FsError::TooFragmented {
            needed: blocks_needed,
        }
    }
}

/// 释放 extent 覆盖的所有块，返回释放的块总数。
/// 调用方负责把返回值加回 free_blocks 并清空对应 inode。
pub fn release(bitmap: &mut BlockBitmap, extents: &[Extent]) -> u64 {
    let mut freed = 0u64;
    for extent in extents {
        for block in extent.blocks() {
            bitmap.mark_free(block);
        }
        freed += extent.count;
    }
    freed
}

#[cfg(test)]
mod tests {
    use super::{allocate, release};
    use crate::fs::block_bitmap::BlockBitmap;
    use crate::fs::config::MAX_FRAGS;
    use crate::fs::error::FsError;
    use crate::fs::layout::Layout;
    use crate::fs::super_block::SuperBlock;

    fn setup() -> (BlockBitmap, SuperBlock) {
        let layout = Layout::compute(200_000).unwrap();
        let sb = SuperBlock::new(&layout);
        (BlockBitmap::new_empty(&sb), sb)
    }

    #[test]
    fn single_extent_when_space_is_contiguous() {
        let (mut bm, mut sb) = setup();
        let extents = allocate(&mut bm, &mut sb, 10).unwrap();
        assert_eq!(extents.len(), 1);
        assert_eq!((extents[0].start, extents[0].count), (0, 10));
        assert!(!bm.is_free(9));
        // 长空闲段被截断，不多占
        assert!(bm.is_free(10));
        assert_eq!(sb.free_blocks, sb.block_count - 10);
        assert_eq!(bm.free_count(), sb.free_blocks as u64);
    }

    #[test]
    fn zero_blocks_allocates_nothing() {
        let (mut bm, mut sb) = setup();
        let free_before = sb.free_blocks;
        assert!(allocate(&mut bm, &mut sb, 0).unwrap().is_empty());
        assert_eq!(sb.free_blocks, free_before);
        assert_eq!(bm.free_count(), free_before as u64);
    }

    #[test]
    fn spans_fragmented_free_space() {
        let (mut bm, mut sb) = setup();
        // 占住 5..8 制造一个空洞
        for block in 5..8 {
            bm.mark_used(block);
        }
        sb.free_blocks -= 3;

        let extents = allocate(&mut bm, &mut sb, 10).unwrap();
        assert_eq!(extents.len(), 2);
        assert_eq!((extents[0].start, extents[0].count), (0, 5));
        assert_eq!((extents[1].start, extents[1].count), (8, 5));
        assert_eq!(bm.free_count(), sb.free_blocks as u64);
    }

    #[test]
    fn insufficient_space_leaves_bitmap_untouched() {
        let (mut bm, mut sb) = setup();
        let total = sb.block_count as u64;
        let err = allocate(&mut bm, &mut sb, total + 1).unwrap_err();
        assert!(matches!(err, FsError::InsufficientSpace { .. }));
        assert_eq!(bm.free_count(), total);
        assert_eq!(sb.free_blocks as u64, total);
    }

    #[test]
    fn too_fragmented_rolls_back_nothing() {
        let (mut bm, mut sb) = setup();
        // 隔一块占一块，空闲空间全是单块碎片
        let total = sb.block_count as u64;
        let mut used = 0u32;
        for block in (1..total).step_by(2) {
            bm.mark_used(block);
            used += 1;
        }
        sb.free_blocks -= used;

        let before = bm.clone();
        let err = allocate(&mut bm, &mut sb, MAX_FRAGS as u64 + 1).unwrap_err();
        assert!(matches!(err, FsError::TooFragmented { .. }));
        // 位图与计数都必须原封不动
        assert_eq!(bm, before);
        assert_eq!(sb.free_blocks as u64, bm.free_count());
    }

    #[test]
    fn exactly_max_frags_succeeds() {
        let (mut bm, mut sb) = setup();
        let total = sb.block_count as u64;
        let mut used = 0u32;
        for block in (1..total).step_by(2) {
            bm.mark_used(block);
            used += 1;
        }
        sb.free_blocks -= used;

        let extents = allocate(&mut bm, &mut sb, MAX_FRAGS as u64).unwrap();
        assert_eq!(extents.len(), MAX_FRAGS);
        assert_eq!(extents.iter().map(|e| e.count).sum::<u64>(), MAX_FRAGS as u64);
    }

    #[test]
    fn release_restores_free_space() {
        let (mut bm, mut sb) = setup();
        let total = sb.block_count as u64;
        let extents = allocate(&mut bm, &mut sb, 10).unwrap();

        let freed = release(&mut bm, &extents);
        assert_eq!(freed, 10);
        sb.free_blocks += freed as u32;
        assert_eq!(bm.free_count(), total);
        assert_eq!(sb.free_blocks as u64, total);

        // 释放后的块可以立刻重新分配到同样的位置
        let again = allocate(&mut bm, &mut sb, 10).unwrap();
        assert_eq!(again, extents);
    }
}
