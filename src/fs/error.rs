use std::fmt;

use crate::fs::config::{MAX_FRAGS, MAX_NAME_LEN};

/// 文件系统统一错误类型
#[derive(Debug)]
pub enum FsError {
    Io(std::io::Error),                           // 底层 I/O 错误
    BadSignature,                                 // 超级块签名不符
    Corrupted(String),                            // 结构无法解码
    TooSmall { requested: u64 },                  // 镜像太小，放不下任何数据块
    DirectoryFull,                                // 没有空闲 inode
    InsufficientSpace { needed: u64, free: u64 }, // 空闲块总量不足
    TooFragmented { needed: u64 },                // 空闲块够，但碎片数超过上限
    NotFound(String),                             // 按名字找不到文件
    NameTooLong(String),                          // 文件名超长
    OutOfRange { index: u32, limit: u32 },        // inode 下标越界
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        FsError::Io(e)
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "disk I/O error: {}", e),
            Self::BadSignature => write!(f, "not a fragfs image (bad superblock signature)"),
            Self::Corrupted(what) => write!(f, "image corrupted: {}", what),
            Self::TooSmall { requested } => write!(
                f,
                "requested image size {} bytes is too small to hold a single data block",
                requested
            ),
            Self::DirectoryFull => write!(f, "no free inode available (directory full)"),
            Self::InsufficientSpace { needed, free } => {
                write!(f, "not enough free blocks: need {}, have {}", needed, free)
            }
            Self::TooFragmented { needed } => write!(
                f,
                "free space too fragmented: {} blocks would need more than {} extents",
                needed, MAX_FRAGS
            ),
            Self::NotFound(name) => write!(f, "no such file in image: {}", name),
            Self::NameTooLong(name) => {
                write!(f, "file name exceeds {} bytes: {}", MAX_NAME_LEN, name)
            }
            Self::OutOfRange { index, limit } => {
                write!(f, "inode index {} out of range (limit {})", index, limit)
            }
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FsError>;
