use std::fs::{File, OpenOptions};
use std::io::{Read, Result, Seek, SeekFrom, Write};
use std::path::Path;

/// 镜像文件句柄。
/// 每个文件系统操作打开一次，离开作用域即关闭，不存在跨操作的常驻句柄；
/// 多进程同时操作同一镜像不受支持。
#[derive(Debug)]
pub struct ImageFile {
    file: File,
}

impl ImageFile {
    /// 以读写方式打开已有镜像（import / rm）
    pub fn open_rw(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// 只读打开（export / ls / map）
    pub fn open_ro(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self { file })
    }

    /// 创建（或覆盖）镜像文件并扩展到指定大小
    pub fn create_sized(path: &Path, size: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size)?;
        Ok(Self { file })
    }

    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }

    pub fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)
    }
}
