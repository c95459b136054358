pub mod page;
pub mod page_header;

/// 导出 Page 和 PageType
pub use page::Page;
pub use page_header::{PageHeader, PageType};

/// 每个页记录在磁盘上的固定字节数
pub const PAGE_SIZE: usize = 4096;

/// 页体字节数（页大小减去页头）
pub const PAGE_BODY_SIZE: usize = PAGE_SIZE - PageHeader::SIZE;
