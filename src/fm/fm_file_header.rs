use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::fm::fm_bid::{PageId, NO_PAGE};

/// 识别本格式文件的魔数（"Anon"）
pub const MAGIC_NUMBER: u32 = 0x416E_6F6E;

/// 当前磁盘格式版本：32 字节文件头 + 24 字节页头
pub const FORMAT_VERSION: u32 = 1;

// 持久化的文件头，存放在文件偏移 0 处
// 字段：
// - page_count: 已分配过的页数量（下一个新页号），只增不减
// - first_free: 空闲页链表头（NO_PAGE 表示链表为空）
// - root_page: 预留给上层索引的根页（NO_PAGE 表示没有）
// 由 bincode 以小端定长编码，共 32 字节
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u32,
    pub page_count: u32,
    pub first_free: u32,
    pub root_page: u32,
    reserved: [u8; 12],
}

impl FileHeader {
    // 文件头在磁盘上占用的字节数
    pub const BYTE_SIZE: usize = 32;

    // 新文件的文件头：page_count 从 1 开始（页 0 随文件一起创建）
    pub fn new() -> Self {
        Self {
            magic: MAGIC_NUMBER,
            version: FORMAT_VERSION,
            page_count: 1,
            first_free: NO_PAGE,
            root_page: NO_PAGE,
            reserved: [0u8; 12],
        }
    }

    pub fn first_free(&self) -> Option<PageId> {
        PageId::from_link(self.first_free)
    }

    pub fn root_page(&self) -> Option<PageId> {
        PageId::from_link(self.root_page)
    }

    // 从小端字节序反序列化，并校验魔数、版本和字段范围
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::BYTE_SIZE {
            return Err(StorageError::InvalidFile(format!(
                "文件头只有 {} 字节，至少需要 {} 字节",
                bytes.len(),
                Self::BYTE_SIZE
            )));
        }
        let header: FileHeader = bincode::deserialize(&bytes[..Self::BYTE_SIZE])?;
        header.validate()?;
        Ok(header)
    }

    // 序列化为小端字节数组用于写回磁盘
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), Self::BYTE_SIZE);
        Ok(bytes)
    }

    fn validate(&self) -> Result<()> {
        if self.magic != MAGIC_NUMBER {
            return Err(StorageError::InvalidFile(format!(
                "魔数 0x{:08X} 不匹配",
                self.magic
            )));
        }
        if self.version != FORMAT_VERSION {
            return Err(StorageError::InvalidFile(format!(
                "不支持的格式版本 {}（期望 {}）",
                self.version, FORMAT_VERSION
            )));
        }
        if self.page_count == 0 || self.page_count == NO_PAGE {
            return Err(StorageError::FileCorrupted(format!(
                "页数量 {} 无效",
                self.page_count
            )));
        }
        for (name, link) in [("first_free", self.first_free), ("root_page", self.root_page)] {
            if link != NO_PAGE && link >= self.page_count {
                return Err(StorageError::FileCorrupted(format!(
                    "{} = {} 超出页数量 {}",
                    name, link, self.page_count
                )));
            }
        }
        Ok(())
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}
