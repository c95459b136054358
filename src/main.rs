use std::error::Error;
use std::path::PathBuf;

use pagedb::{FileManager, FileManagerConfig, PageType};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // 数据文件路径：命令行第一个参数，默认 data/example.pdb
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data").join("example.pdb"));

    let file_manager = FileManager::new(FileManagerConfig::default());
    let handle = file_manager.open_or_create(&path)?;
    println!("文件路径: {:?}", path);

    // 分配一个数据页，写入 u32 数据并写回
    let mut page = handle.allocate_page(PageType::Data)?;
    let page_num = page.page_num();
    page.write_data(0, &42u32.to_le_bytes())?;
    page.set_num_records(1);
    page.touch();
    handle.write_page(&page)?;
    println!("写入值 42 到页 {}", page_num);

    // 重新读取验证
    let read_back = handle.read_page(page_num)?;
    let bytes = read_back.read_data(0, 4)?;
    let val = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    println!("读取到的值 = {}（剩余空间 {} 字节）", val, read_back.free_space());

    // 释放后该页进入空闲链表头
    handle.free_page(page_num)?;

    let header = handle.header()?;
    println!("页数量: {}", header.page_count);
    println!("空闲链表: {:?}", handle.free_pages()?);
    match header.root_page() {
        Some(root) => println!("根页: {}", root.number),
        None => println!("根页: 无"),
    }

    handle.close()?;
    Ok(())
}
