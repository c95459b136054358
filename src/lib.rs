//! 基于定长页的磁盘存储引擎
//!
//! - `mm`：内存中的页结构及其二进制编解码
//! - `fm`：文件头、空闲链表分配器与页级读写

pub mod error;
pub mod fm;
pub mod mm;

#[cfg(test)]
mod test;

pub use error::{Result, StorageError};
pub use fm::{FileHandle, FileHeader, FileManager, FileManagerConfig, NO_PAGE};
pub use mm::{Page, PageType, PAGE_BODY_SIZE, PAGE_SIZE};
