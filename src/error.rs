use thiserror::Error;

use crate::mm::PageType;

/// 存储引擎统一的结果类型
pub type Result<T> = std::result::Result<T, StorageError>;

/// 存储引擎的错误分类
///
/// 所有错误直接返回给调用方，引擎内部不做重试，也不吞掉错误。
#[derive(Debug, Error)]
pub enum StorageError {
    // 底层 I/O 错误（权限、磁盘已满、文件不存在等）原样透传
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    // 魔数或版本号不匹配
    #[error("无效的数据库文件: {0}")]
    InvalidFile(String),

    #[error("页 {page} 不存在（当前页数量 {page_count}）")]
    PageNotFound { page: u32, page_count: u32 },

    // 结构校验失败：文件头字段越界、空闲链表损坏等
    #[error("数据库文件已损坏: {0}")]
    FileCorrupted(String),

    #[error("页空间不足: 偏移 {offset} + 长度 {len} 超过页体容量 {capacity}")]
    PageFull {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("读取越界: 偏移 {offset} + 长度 {len} 超过页体容量 {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("页数据长度 {actual} 与页大小 {expected} 不一致")]
    InvalidSize { expected: usize, actual: usize },

    #[error("页 {0} 已在空闲链表中，不能重复释放")]
    PageAlreadyFree(u32),

    // Free 类型只由分配器写入空闲哨兵
    #[error("调用方不能使用页类型 {0:?}")]
    InvalidPageType(PageType),

    #[error("页号空间已耗尽")]
    PageSpaceExhausted,

    #[error("文件句柄已关闭")]
    Closed,

    #[error("序列化错误: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
