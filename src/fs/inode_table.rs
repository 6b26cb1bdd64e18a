use serde::{Deserialize, Serialize};

use crate::disk::ImageFile;
use crate::fs::config::{INODE_SIZE, MAX_FRAGS};
use crate::fs::error::{FsError, Result};
use crate::fs::super_block::SuperBlock;

/// 一段连续的数据块区间（碎片）
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub start: i64,
    pub count: u64,
}

impl Extent {
    /// 空槽哨兵值
    pub const EMPTY: Extent = Extent { start: -1, count: 0 };

    /// 该区间覆盖的块号范围
    pub fn blocks(&self) -> std::ops::Range<u64> {
        let start = self.start.max(0) as u64;
        start..start + self.count
    }
}

/// 一个文件的元数据记录，定长存储于 inode 表中。
/// is_used 为 false 时其余字段无意义。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Inode {
    pub is_used: bool,
    pub name: String,
    pub size: u64,
    pub extents: [Extent; MAX_FRAGS],
    pub extent_count: u32,
}

impl Inode {
    pub fn empty() -> Self {
        Self {
            is_used: false,
            name: String::new(),
            size: 0,
            extents: [Extent::EMPTY; MAX_FRAGS],
            extent_count: 0,
        }
    }

    pub fn new(name: &str, size: u64) -> Self {
        let mut inode = Self::empty();
        inode.is_used = true;
        inode.name = name.to_string();
        inode.size = size;
        inode
    }

    /// 有效的 extent 切片，按分配顺序排列
    pub fn extents(&self) -> &[Extent] {
        &self.extents[..self.extent_count as usize]
    }

    /// 该文件占用的数据块总数
    pub fn block_count(&self) -> u64 {
        self.extents().iter().map(|e| e.count).sum()
    }
}

/// inode 表：容量固定，按 `offset + index * INODE_SIZE` 随机访问单条记录
#[derive(Debug, Clone, Copy)]
pub struct InodeTable {
    offset: u64,
    count: u32,
}

impl InodeTable {
    pub fn new(sb: &SuperBlock) -> Self {
        Self {
            offset: sb.inode_table_offset,
            count: sb.inode_count,
        }
    }

    fn slot_offset(&self, index: u32) -> Result<u64> {
        if index >= self.count {
            return Err(FsError::OutOfRange {
                index,
                limit: self.count,
            });
        }
        Ok(self.offset + index as u64 * INODE_SIZE)
    }

    pub fn read_inode(&self, img: &mut ImageFile, index: u32) -> Result<Inode> {
        let offset = self.slot_offset(index)?;
        let mut buf = [0u8; INODE_SIZE as usize];
        img.read_at(offset, &mut buf)?;
        bincode::deserialize(&buf).map_err(|e| FsError::Corrupted(format!("inode {}: {}", index, e)))
    }

    pub fn write_inode(&self, img: &mut ImageFile, index: u32, inode: &Inode) -> Result<()> {
        let offset = self.slot_offset(index)?;
        let bytes = bincode::serialize(inode)
            .map_err(|e| FsError::Corrupted(format!("inode {}: {}", index, e)))?;
        // 记录必须放得进固定槽位，否则表就无法按固定步长索引
        assert!(
            bytes.len() as u64 <= INODE_SIZE,
            "inode record overflows its slot"
        );
        let mut buf = [0u8; INODE_SIZE as usize];
        buf[..bytes.len()].copy_from_slice(&bytes);
        img.write_at(offset, &buf)?;
        Ok(())
    }

    /// 线性扫描第一个空闲槽位；None 表示目录已满
    pub fn find_first_free(&self, img: &mut ImageFile) -> Result<Option<u32>> {
        for i in 0..self.count {
            if !self.read_inode(img, i)?.is_used {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// 按名字线性查找已用 inode。
    /// 重名不做防范，低下标的记录会遮蔽后面的同名记录。
    pub fn find_by_name(&self, img: &mut ImageFile, name: &str) -> Result<Option<(u32, Inode)>> {
        for i in 0..self.count {
            let inode = self.read_inode(img, i)?;
            if inode.is_used && inode.name == name {
                return Ok(Some((i, inode)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::{Extent, Inode, InodeTable};
    use crate::disk::ImageFile;
    use crate::fs::config::{INODE_COUNT, INODE_SIZE, MAX_FRAGS, MAX_NAME_LEN};
    use crate::fs::error::FsError;
    use crate::fs::super_block::SuperBlock;
    use crate::fs::test_util::TempImage;
    use crate::fs::FileSystem;

    #[test]
    fn record_fits_fixed_slot_at_worst_case() {
        let mut inode = Inode::new(&"x".repeat(MAX_NAME_LEN), u64::MAX);
        inode.extents = [Extent {
            start: i64::MAX,
            count: u64::MAX,
        }; MAX_FRAGS];
        inode.extent_count = MAX_FRAGS as u32;
        let bytes = bincode::serialize(&inode).unwrap();
        assert!(bytes.len() as u64 <= INODE_SIZE);
    }

    #[test]
    fn read_write_round_trip() {
        let tmp = TempImage::new("inode-rw");
        FileSystem::new(&tmp.0).format(200_000).unwrap();

        let mut img = ImageFile::open_rw(&tmp.0).unwrap();
        let sb = SuperBlock::load(&mut img).unwrap();
        let table = InodeTable::new(&sb);

        let mut inode = Inode::new("hello.txt", 1234);
        inode.extents[0] = Extent { start: 3, count: 5 };
        inode.extent_count = 1;
        table.write_inode(&mut img, 7, &inode).unwrap();

        assert_eq!(table.read_inode(&mut img, 7).unwrap(), inode);
        assert_eq!(inode.block_count(), 5);
        // 相邻槽位不受影响
        assert!(!table.read_inode(&mut img, 6).unwrap().is_used);
        assert!(!table.read_inode(&mut img, 8).unwrap().is_used);
    }

    #[test]
    fn index_out_of_range() {
        let tmp = TempImage::new("inode-oob");
        FileSystem::new(&tmp.0).format(200_000).unwrap();

        let mut img = ImageFile::open_rw(&tmp.0).unwrap();
        let sb = SuperBlock::load(&mut img).unwrap();
        let table = InodeTable::new(&sb);
        assert!(matches!(
            table.read_inode(&mut img, INODE_COUNT),
            Err(FsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn first_free_and_name_shadowing() {
        let tmp = TempImage::new("inode-scan");
        FileSystem::new(&tmp.0).format(200_000).unwrap();

        let mut img = ImageFile::open_rw(&tmp.0).unwrap();
        let sb = SuperBlock::load(&mut img).unwrap();
        let table = InodeTable::new(&sb);

        table
            .write_inode(&mut img, 2, &Inode::new("dup", 10))
            .unwrap();
        table
            .write_inode(&mut img, 5, &Inode::new("dup", 20))
            .unwrap();

        assert_eq!(table.find_first_free(&mut img).unwrap(), Some(0));
        // 重名时低下标者优先
        let (index, inode) = table.find_by_name(&mut img, "dup").unwrap().unwrap();
        assert_eq!(index, 2);
        assert_eq!(inode.size, 10);
        assert!(table.find_by_name(&mut img, "missing").unwrap().is_none());
    }
}
