use std::path::Path;

use super::fm_file_handler::FileHandle;
use crate::error::Result;

// FileManager 配置：写后同步、预分配页数、是否自动创建上级目录
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileManagerConfig {
    // 每次分配/释放/更新根页后调用 sync_data
    pub sync_on_write: bool,
    // 创建文件时预先扩展到可容纳的页数（不影响 page_count）
    pub preallocate_pages: u32,
    pub create_parent_dirs: bool,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        const DEFAULT_PREALLOC_PAGES: u32 = 16;
        Self {
            sync_on_write: false,
            // 默认预分配若干页以减少小文件增长时的开销
            preallocate_pages: DEFAULT_PREALLOC_PAGES,
            create_parent_dirs: true,
        }
    }
}

// FileManager 是按统一配置创建/打开数据库文件的工厂
#[derive(Clone, Debug, Default)]
pub struct FileManager {
    config: FileManagerConfig,
}

impl FileManager {
    pub fn new(config: FileManagerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FileManagerConfig {
        &self.config
    }

    /// 独占创建新文件并写入初始文件头，路径已存在时失败
    pub fn create_file<P: AsRef<Path>>(&self, path: P) -> Result<FileHandle> {
        FileHandle::create_with(path.as_ref(), self.config)
    }

    /// 打开已有文件，校验魔数与版本
    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> Result<FileHandle> {
        FileHandle::open_with(path.as_ref(), self.config)
    }

    /// 文件存在则打开，否则创建
    pub fn open_or_create<P: AsRef<Path>>(&self, path: P) -> Result<FileHandle> {
        let path = path.as_ref();
        if path.exists() {
            self.open_file(path)
        } else {
            self.create_file(path)
        }
    }
}
