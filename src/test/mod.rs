mod test_free_list;

use std::path::PathBuf;

use tempfile::TempDir;

use crate::fm::{FileHandle, FileManager, FileManagerConfig};

// 每个测试独占一个临时目录，TempDir 被 drop 时清理
pub(crate) fn scratch() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.pdb");
    (dir, path)
}

pub(crate) fn create_unpadded(path: &PathBuf) -> FileHandle {
    let config = FileManagerConfig {
        preallocate_pages: 0,
        ..FileManagerConfig::default()
    };
    FileManager::new(config).create_file(path).unwrap()
}
