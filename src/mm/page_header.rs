use crate::error::{Result, StorageError};
use crate::fm::NO_PAGE;

/// 页类型，序列化为页头的第 1 个字节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Data,
    Index,
    Overflow,
    /// 空闲链表中的哨兵页，只由分配器写入
    Free,
}

impl PageType {
    pub fn as_byte(self) -> u8 {
        match self {
            PageType::Data => 0,
            PageType::Index => 1,
            PageType::Overflow => 2,
            PageType::Free => 0xFF,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(PageType::Data),
            1 => Ok(PageType::Index),
            2 => Ok(PageType::Overflow),
            0xFF => Ok(PageType::Free),
            other => Err(StorageError::FileCorrupted(format!(
                "未知的页类型字节 0x{:02X}",
                other
            ))),
        }
    }
}

/// 页头元数据，位于每个页记录的起始处
///
/// 磁盘布局（小端）：
/// `[0]` 类型，`[1..5]` 页号，`[5..7]` 剩余空间，`[7..9]` 记录数，
/// `[9..13]` 下一页，`[13..21]` 最后更新时间，`[21..24]` 保留（置零）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub page_num: u32,
    /// 页体中尚未使用的字节数
    pub free_space: u16,
    pub num_records: u16,
    /// 空闲时指向下一个空闲页，否则留给上层做链式结构；NO_PAGE 表示没有
    pub next_page: u32,
    pub last_updated: u64,
}

impl PageHeader {
    /// 页头在页记录中的字节长度
    pub const SIZE: usize = 24;

    pub fn new(page_num: u32, page_type: PageType, free_space: u16) -> Self {
        PageHeader {
            page_type,
            page_num,
            free_space,
            num_records: 0,
            next_page: NO_PAGE,
            last_updated: 0,
        }
    }

    /// 从字节缓冲区解析出 PageHeader，要求 buf.len() >= SIZE
    pub fn from_bytes(buf: &[u8]) -> Result<PageHeader> {
        if buf.len() < PageHeader::SIZE {
            return Err(StorageError::InvalidSize {
                expected: PageHeader::SIZE,
                actual: buf.len(),
            });
        }
        let page_type = PageType::from_byte(buf[0])?;
        let page_num = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
        let free_space = u16::from_le_bytes([buf[5], buf[6]]);
        let num_records = u16::from_le_bytes([buf[7], buf[8]]);
        let next_page = u32::from_le_bytes([buf[9], buf[10], buf[11], buf[12]]);
        let mut stamp = [0u8; 8];
        stamp.copy_from_slice(&buf[13..21]);
        let last_updated = u64::from_le_bytes(stamp);
        Ok(PageHeader {
            page_type,
            page_num,
            free_space,
            num_records,
            next_page,
            last_updated,
        })
    }

    /// 将 PageHeader 序列化为定长字节数组，保留字节为 0
    pub fn to_bytes(&self) -> [u8; PageHeader::SIZE] {
        let mut buf = [0u8; PageHeader::SIZE];
        buf[0] = self.page_type.as_byte();
        buf[1..5].copy_from_slice(&self.page_num.to_le_bytes());
        buf[5..7].copy_from_slice(&self.free_space.to_le_bytes());
        buf[7..9].copy_from_slice(&self.num_records.to_le_bytes());
        buf[9..13].copy_from_slice(&self.next_page.to_le_bytes());
        buf[13..21].copy_from_slice(&self.last_updated.to_le_bytes());
        buf
    }
}
