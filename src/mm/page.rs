use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, StorageError};
use crate::fm::NO_PAGE;
use crate::mm::page_header::{PageHeader, PageType};
use crate::mm::{PAGE_BODY_SIZE, PAGE_SIZE};

/// 内存页结构：页头 + 定长页体
///
/// 从 FileHandle 返回的 Page 都是独立副本，修改后需要调用 `write_page` 写回。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    header: PageHeader,
    body: Box<[u8]>,
}

impl Page {
    /// 构造一个全新的页：页体清零，剩余空间为整个页体
    pub fn new(page_num: u32, page_type: PageType) -> Page {
        Page {
            header: PageHeader::new(page_num, page_type, PAGE_BODY_SIZE as u16),
            body: vec![0u8; PAGE_BODY_SIZE].into_boxed_slice(),
        }
    }

    // 空闲链表中的哨兵记录，next 指向原先的链表头
    pub(crate) fn new_free(page_num: u32, next: u32) -> Page {
        let mut page = Page::new(page_num, PageType::Free);
        page.header.next_page = next;
        page
    }

    /// 在页体 offset 处写入 data
    ///
    /// 不记录哪些区间已被占用，重叠写入由调用方负责；
    /// 成功后 free_space 减少 data.len()（最低为 0）。
    pub fn write_data(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len());
        match end {
            Some(end) if end <= PAGE_BODY_SIZE => {
                self.body[offset..end].copy_from_slice(data);
                self.header.free_space = self.header.free_space.saturating_sub(data.len() as u16);
                Ok(())
            }
            _ => Err(StorageError::PageFull {
                offset,
                len: data.len(),
                capacity: PAGE_BODY_SIZE,
            }),
        }
    }

    /// 读取页体 [offset, offset + len) 的副本
    pub fn read_data(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        match offset.checked_add(len) {
            Some(end) if end <= PAGE_BODY_SIZE => Ok(self.body[offset..end].to_vec()),
            _ => Err(StorageError::OutOfBounds {
                offset,
                len,
                capacity: PAGE_BODY_SIZE,
            }),
        }
    }

    /// 序列化为恰好 PAGE_SIZE 字节
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; PAGE_SIZE];
        buf[..PageHeader::SIZE].copy_from_slice(&self.header.to_bytes());
        buf[PageHeader::SIZE..].copy_from_slice(&self.body);
        buf
    }

    /// 从恰好 PAGE_SIZE 字节的缓冲区还原页
    pub fn deserialize(bytes: &[u8]) -> Result<Page> {
        if bytes.len() != PAGE_SIZE {
            return Err(StorageError::InvalidSize {
                expected: PAGE_SIZE,
                actual: bytes.len(),
            });
        }
        let header = PageHeader::from_bytes(&bytes[..PageHeader::SIZE])?;
        Ok(Page {
            header,
            body: bytes[PageHeader::SIZE..].to_vec().into_boxed_slice(),
        })
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn page_num(&self) -> u32 {
        self.header.page_num
    }

    pub fn free_space(&self) -> u16 {
        self.header.free_space
    }

    pub fn num_records(&self) -> u16 {
        self.header.num_records
    }

    pub fn set_num_records(&mut self, num_records: u16) {
        self.header.num_records = num_records;
    }

    pub fn next_page(&self) -> Option<u32> {
        match self.header.next_page {
            NO_PAGE => None,
            next => Some(next),
        }
    }

    pub fn set_next_page(&mut self, next: Option<u32>) {
        self.header.next_page = next.unwrap_or(NO_PAGE);
    }

    pub fn last_updated(&self) -> u64 {
        self.header.last_updated
    }

    /// 用当前时间（Unix 毫秒）更新 last_updated
    pub fn touch(&mut self) {
        // 系统时钟早于 1970 时记为 0
        self.header.last_updated = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 页体容量（字节）
    pub fn capacity(&self) -> usize {
        PAGE_BODY_SIZE
    }
}
