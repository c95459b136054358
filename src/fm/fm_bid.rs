use crate::fm::fm_file_header::FileHeader;
use crate::mm::PAGE_SIZE;

/// 表示“没有页”的专用标记，不会与任何有效页号冲突
pub const NO_PAGE: u32 = u32::MAX;

// 页标识符（简单封装）
// 页号即页在页区中的位置，页 0 紧跟在文件头之后
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageId {
    pub number: u32,
}

impl PageId {
    pub fn new(number: u32) -> Self {
        Self { number }
    }

    // 把链表指针字段还原为 Option，NO_PAGE 表示链表末端
    pub fn from_link(raw: u32) -> Option<Self> {
        if raw == NO_PAGE {
            None
        } else {
            Some(Self::new(raw))
        }
    }

    pub fn to_link(page: Option<PageId>) -> u32 {
        page.map_or(NO_PAGE, |p| p.number)
    }

    // 页在文件中的起始字节偏移：HEADER_SIZE + number × PAGE_SIZE
    pub fn offset(self) -> u64 {
        FileHeader::BYTE_SIZE as u64 + self.number as u64 * PAGE_SIZE as u64
    }
}
