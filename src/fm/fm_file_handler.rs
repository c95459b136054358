use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{debug, info, trace, warn};
use parking_lot::RwLock;

use super::fm_bid::{PageId, NO_PAGE};
use super::fm_file_header::FileHeader;
use super::fm_io::{read_exact_at, write_all_at};
use super::fm_manager::FileManagerConfig;
use crate::error::{Result, StorageError};
use crate::mm::{Page, PageType, PAGE_SIZE};

// 受读写锁保护的共享状态：OS 文件句柄 + 内存中的文件头
// file 为 None 表示句柄已关闭
struct HandleState {
    file: Option<File>,
    header: FileHeader,
}

// FileHandle: 对单个数据库文件的抽象，封装了页的读写、分配和释放逻辑
//
// 所有方法都是同步阻塞的，可以通过 &FileHandle / Arc<FileHandle> 在多个线程间共享。
// 读页和同步走读锁，可以并行；分配、释放、写页、关闭走写锁，互斥执行。
pub struct FileHandle {
    path: PathBuf,
    config: FileManagerConfig,
    state: RwLock<HandleState>,
}

impl FileHandle {
    /// 用默认配置创建新文件，路径已存在时失败
    pub fn create<P: AsRef<Path>>(path: P) -> Result<FileHandle> {
        Self::create_with(path.as_ref(), FileManagerConfig::default())
    }

    /// 用默认配置打开已有文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FileHandle> {
        Self::open_with(path.as_ref(), FileManagerConfig::default())
    }

    pub(crate) fn create_with(path: &Path, config: FileManagerConfig) -> Result<FileHandle> {
        if config.create_parent_dirs {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        // 初始化失败时删除半成品文件，不留下孤儿文件
        let header = match Self::initialize(&file, &config) {
            Ok(header) => header,
            Err(err) => {
                drop(file);
                if let Err(rm_err) = fs::remove_file(path) {
                    warn!("无法删除初始化失败的文件 {}: {}", path.display(), rm_err);
                }
                return Err(err);
            }
        };
        info!("已创建数据库文件 {}", path.display());
        Ok(FileHandle {
            path: path.to_path_buf(),
            config,
            state: RwLock::new(HandleState {
                file: Some(file),
                header,
            }),
        })
    }

    pub(crate) fn open_with(path: &Path, config: FileManagerConfig) -> Result<FileHandle> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < FileHeader::BYTE_SIZE as u64 {
            return Err(StorageError::InvalidFile(format!(
                "文件 {} 只有 {} 字节，小于文件头",
                path.display(),
                file_len
            )));
        }
        let mut buf = [0u8; FileHeader::BYTE_SIZE];
        read_exact_at(&file, &mut buf, 0)?;
        let header = FileHeader::from_bytes(&buf)?;

        let required_len = PageId::new(header.page_count).offset();
        if file_len < required_len {
            return Err(StorageError::FileCorrupted(format!(
                "文件长度 {} 不足以容纳 {} 个页（至少需要 {} 字节）",
                file_len, header.page_count, required_len
            )));
        }
        info!(
            "已打开数据库文件 {}（页数量 {}）",
            path.display(),
            header.page_count
        );
        Ok(FileHandle {
            path: path.to_path_buf(),
            config,
            state: RwLock::new(HandleState {
                file: Some(file),
                header,
            }),
        })
    }

    // 写入初始文件头和页 0，按配置预分配空间
    fn initialize(file: &File, config: &FileManagerConfig) -> Result<FileHeader> {
        let header = FileHeader::new();
        if config.preallocate_pages > 0 {
            file.set_len(PageId::new(config.preallocate_pages).offset())?;
        }
        write_page_to(file, &Page::new(0, PageType::Data))?;
        write_header_to(file, &header)?;
        file.sync_all()?;
        Ok(header)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &FileManagerConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().file.is_none()
    }

    /// 文件头的快照副本
    pub fn header(&self) -> Result<FileHeader> {
        let state = self.state.read();
        open_file(&state)?;
        Ok(state.header)
    }

    pub fn page_count(&self) -> Result<u32> {
        Ok(self.header()?.page_count)
    }

    pub fn first_free(&self) -> Result<Option<u32>> {
        Ok(self.header()?.first_free().map(|p| p.number))
    }

    pub fn root_page(&self) -> Result<Option<u32>> {
        Ok(self.header()?.root_page().map(|p| p.number))
    }

    /// 分配一个页：优先复用空闲链表头（LIFO），否则在末尾追加新页
    pub fn allocate_page(&self, page_type: PageType) -> Result<Page> {
        reject_free_type(page_type)?;
        let mut guard = self.state.write();
        let HandleState { file, header } = &mut *guard;
        let file = file.as_ref().ok_or(StorageError::Closed)?;

        // 先修改副本，写盘成功后才替换内存中的文件头
        let mut next = *header;
        let reused = header.first_free != NO_PAGE;
        let page_num = match header.first_free() {
            Some(head) => {
                let free = read_page_from(file, head)?;
                if free.page_type() != PageType::Free {
                    return Err(StorageError::FileCorrupted(format!(
                        "空闲链表头 {} 的页类型为 {:?}",
                        head.number,
                        free.page_type()
                    )));
                }
                let link = free.header().next_page;
                if link != NO_PAGE && link >= header.page_count {
                    return Err(StorageError::FileCorrupted(format!(
                        "空闲页 {} 指向越界页 {}",
                        head.number, link
                    )));
                }
                next.first_free = link;
                head.number
            }
            None => {
                // NO_PAGE 不能作为页号分配
                if header.page_count >= NO_PAGE {
                    return Err(StorageError::PageSpaceExhausted);
                }
                next.page_count += 1;
                header.page_count
            }
        };

        let page = Page::new(page_num, page_type);
        write_page_to(file, &page)?;
        write_header_to(file, &next)?;
        if self.config.sync_on_write {
            file.sync_data()?;
        }
        *header = next;
        debug!(
            "分配页 {}（{:?}，{}）",
            page_num,
            page_type,
            if reused { "复用空闲页" } else { "新页" }
        );
        Ok(page)
    }

    /// 释放一个页，将其插入空闲链表头
    ///
    /// 页内容会被空闲哨兵记录覆盖。对已空闲的页再次释放会返回 `PageAlreadyFree`。
    pub fn free_page(&self, page_num: u32) -> Result<()> {
        let mut guard = self.state.write();
        let HandleState { file, header } = &mut *guard;
        let file = file.as_ref().ok_or(StorageError::Closed)?;
        let page = ensure_valid_page(header, page_num)?;

        let current = read_page_from(file, page)?;
        if current.page_type() == PageType::Free {
            return Err(StorageError::PageAlreadyFree(page_num));
        }

        let mut next = *header;
        next.first_free = page_num;
        write_page_to(file, &Page::new_free(page_num, header.first_free))?;
        write_header_to(file, &next)?;
        if self.config.sync_on_write {
            file.sync_data()?;
        }
        *header = next;
        debug!("释放页 {}", page_num);
        Ok(())
    }

    /// 从磁盘读取一个页的独立副本
    pub fn read_page(&self, page_num: u32) -> Result<Page> {
        let state = self.state.read();
        let file = open_file(&state)?;
        let page = ensure_valid_page(&state.header, page_num)?;
        read_page_from(file, page)
    }

    /// 将页写回其页号对应的位置
    pub fn write_page(&self, page: &Page) -> Result<()> {
        reject_free_type(page.page_type())?;
        let state = self.state.write();
        let file = open_file(&state)?;
        ensure_valid_page(&state.header, page.page_num())?;
        write_page_to(file, page)
    }

    /// 设置（或清除）上层索引的根页号，立即持久化
    pub fn set_root_page(&self, root: Option<u32>) -> Result<()> {
        let mut guard = self.state.write();
        let HandleState { file, header } = &mut *guard;
        let file = file.as_ref().ok_or(StorageError::Closed)?;
        if let Some(page_num) = root {
            ensure_valid_page(header, page_num)?;
        }
        let mut next = *header;
        next.root_page = root.unwrap_or(NO_PAGE);
        write_header_to(file, &next)?;
        if self.config.sync_on_write {
            file.sync_data()?;
        }
        *header = next;
        Ok(())
    }

    /// 沿空闲链表遍历，返回从链表头开始的空闲页号
    pub fn free_pages(&self) -> Result<Vec<u32>> {
        let state = self.state.read();
        let file = open_file(&state)?;
        let header = &state.header;
        let mut pages = Vec::new();
        let mut cursor = header.first_free();
        while let Some(page) = cursor {
            // 链表长度不可能超过页数量，否则必然有环
            if pages.len() >= header.page_count as usize {
                return Err(StorageError::FileCorrupted(format!(
                    "空闲链表在页 {} 处出现环",
                    page.number
                )));
            }
            if page.number >= header.page_count {
                return Err(StorageError::FileCorrupted(format!(
                    "空闲链表指向越界页 {}",
                    page.number
                )));
            }
            let free = read_page_from(file, page)?;
            if free.page_type() != PageType::Free {
                return Err(StorageError::FileCorrupted(format!(
                    "空闲链表中的页 {} 类型为 {:?}",
                    page.number,
                    free.page_type()
                )));
            }
            pages.push(page.number);
            cursor = PageId::from_link(free.header().next_page);
        }
        Ok(pages)
    }

    /// 将缓冲的写入强制落盘，不关闭句柄
    pub fn sync(&self) -> Result<()> {
        // sync_all 只需要 &File，读锁即可，不阻塞并发读页
        let state = self.state.read();
        open_file(&state)?.sync_all()?;
        Ok(())
    }

    /// 写回文件头并关闭句柄；之后该句柄上的任何操作都返回 `Closed`
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        let file = state.file.take().ok_or(StorageError::Closed)?;
        write_header_to(&file, &state.header)?;
        file.sync_all()?;
        info!("已关闭数据库文件 {}", self.path.display());
        Ok(())
    }
}

// 当 FileHandle 在未关闭的情况下被 Drop 时，尝试持久化文件头
impl Drop for FileHandle {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(file) = state.file.take() {
            if let Err(err) = write_header_to(&file, &state.header) {
                warn!("无法持久化文件头到 {}: {}", self.path.display(), err);
            }
        }
    }
}

fn open_file(state: &HandleState) -> Result<&File> {
    state.file.as_ref().ok_or(StorageError::Closed)
}

// 验证页号是否在 [0, page_count) 范围内
fn ensure_valid_page(header: &FileHeader, page_num: u32) -> Result<PageId> {
    if page_num >= header.page_count {
        return Err(StorageError::PageNotFound {
            page: page_num,
            page_count: header.page_count,
        });
    }
    Ok(PageId::new(page_num))
}

// 空闲哨兵只能由分配器写入
fn reject_free_type(page_type: PageType) -> Result<()> {
    if page_type == PageType::Free {
        return Err(StorageError::InvalidPageType(page_type));
    }
    Ok(())
}

fn read_page_from(file: &File, page: PageId) -> Result<Page> {
    let mut buf = vec![0u8; PAGE_SIZE];
    read_exact_at(file, &mut buf, page.offset())?;
    trace!("读取页 {}", page.number);
    Page::deserialize(&buf)
}

fn write_page_to(file: &File, page: &Page) -> Result<()> {
    let id = PageId::new(page.page_num());
    write_all_at(file, &page.serialize(), id.offset())?;
    trace!("写入页 {}", id.number);
    Ok(())
}

fn write_header_to(file: &File, header: &FileHeader) -> Result<()> {
    write_all_at(file, &header.to_bytes()?, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_stops_before_no_page() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FileHandle::create(dir.path().join("full.pdb")).unwrap();
        // 直接把内存中的页数量推到上限，不需要真的写出 16 TiB
        handle.state.write().header.page_count = NO_PAGE;
        assert!(matches!(
            handle.allocate_page(PageType::Data),
            Err(StorageError::PageSpaceExhausted)
        ));
        assert_eq!(handle.page_count().unwrap(), NO_PAGE);
        assert_eq!(handle.first_free().unwrap(), None);
    }

    #[test]
    fn sync_runs_alongside_readers() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FileHandle::create(dir.path().join("sync.pdb")).unwrap();
        // 持有读锁时 sync 仍能完成；若 sync 取写锁这里会死锁
        let reader = handle.state.read();
        handle.sync().unwrap();
        drop(reader);
        handle.close().unwrap();
    }
}
