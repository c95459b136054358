// fm 模块的子模块导出（文件管理相关的子组件）
pub mod fm_bid; // 页标识符与 NO_PAGE 标记
pub mod fm_file_handler; // 文件句柄：页读写、分配/回收、生命周期
pub mod fm_file_header; // 文件头结构和序列化
mod fm_io; // 按偏移读写
pub mod fm_manager; // 按配置创建/打开文件

// 便捷重导出，便于外部使用统一类型名
pub use fm_bid::{PageId, NO_PAGE};
pub use fm_file_handler::FileHandle;
pub use fm_file_header::{FileHeader, FORMAT_VERSION, MAGIC_NUMBER};
pub use fm_manager::{FileManager, FileManagerConfig};
