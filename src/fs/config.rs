/// 超级块签名，用于识别镜像格式
pub const MAGIC: [u8; 4] = *b"FGFS";

/// 每个数据块的大小：512 字节
pub const BLOCK_SIZE: u64 = 512;

/// inode 表固定容量
pub const INODE_COUNT: u32 = 128;

/// 单个文件最多允许的 extent（碎片）数
pub const MAX_FRAGS: usize = 16;

/// 文件名最大长度（字节）
pub const MAX_NAME_LEN: usize = 128;

/// 超级块区域在镜像中占用的字节数，bincode 编码后不足部分补零
pub const SUPER_BLOCK_SIZE: u64 = 64;

/// 每个 inode 记录在磁盘上的固定槽位大小，
/// 定长保证 inode 表可以按 `offset + index * INODE_SIZE` 随机访问
pub const INODE_SIZE: u64 = 512;

/// 隐藏文件的名字前缀，ls 默认不显示
pub const HIDDEN_PREFIX: char = '.';

// 以上常量不写入超级块：读一个镜像前必须先知道这组常量
