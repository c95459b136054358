use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use super::scratch;
use crate::error::StorageError;
use crate::fm::{FileHandle, PageId, NO_PAGE};
use crate::mm::PageType;

// 直接改写磁盘上某页页头的字节，用于构造损坏场景
fn patch_page(path: &std::path::Path, page_num: u32, at: usize, bytes: &[u8]) {
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(PageId::new(page_num).offset() + at as u64))
        .unwrap();
    file.write_all(bytes).unwrap();
}

#[test]
fn freed_page_is_reused_first() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    let a = handle.allocate_page(PageType::Data).unwrap().page_num();
    handle.free_page(a).unwrap();
    assert_eq!(handle.first_free().unwrap(), Some(a));

    let again = handle.allocate_page(PageType::Index).unwrap();
    assert_eq!(again.page_num(), a);
    assert_eq!(again.page_type(), PageType::Index);
    assert_eq!(handle.page_count().unwrap(), 2);
    assert_eq!(handle.first_free().unwrap(), None);
}

#[test]
fn reuse_order_is_lifo() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    let pages: Vec<u32> = (0..4)
        .map(|_| handle.allocate_page(PageType::Data).unwrap().page_num())
        .collect();
    assert_eq!(pages, vec![1, 2, 3, 4]);

    handle.free_page(2).unwrap();
    handle.free_page(4).unwrap();
    handle.free_page(1).unwrap();
    assert_eq!(handle.free_pages().unwrap(), vec![1, 4, 2]);

    let count_before = handle.page_count().unwrap();
    for expected in [1, 4, 2] {
        assert_eq!(
            handle.allocate_page(PageType::Data).unwrap().page_num(),
            expected
        );
        assert_eq!(handle.page_count().unwrap(), count_before);
    }
    assert_eq!(handle.allocate_page(PageType::Data).unwrap().page_num(), 5);
    assert_eq!(handle.page_count().unwrap(), count_before + 1);
}

#[test]
fn allocated_page_is_below_page_count() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    for round in 0..20u32 {
        let page = handle.allocate_page(PageType::Data).unwrap();
        assert!(page.page_num() < handle.page_count().unwrap());
        if round % 3 == 0 {
            handle.free_page(page.page_num()).unwrap();
        }
    }
}

#[test]
fn page_zero_can_join_the_free_list() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    handle.free_page(0).unwrap();
    assert_eq!(handle.first_free().unwrap(), Some(0));
    assert_eq!(handle.free_pages().unwrap(), vec![0]);

    let page = handle.allocate_page(PageType::Data).unwrap();
    assert_eq!(page.page_num(), 0);
    assert_eq!(handle.first_free().unwrap(), None);
}

#[test]
fn freed_page_holds_sentinel_record() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    let mut page = handle.allocate_page(PageType::Data).unwrap();
    page.write_data(0, b"secret").unwrap();
    handle.write_page(&page).unwrap();
    handle.allocate_page(PageType::Data).unwrap();

    handle.free_page(2).unwrap();
    handle.free_page(1).unwrap();
    let sentinel = handle.read_page(1).unwrap();
    assert_eq!(sentinel.page_type(), PageType::Free);
    assert_eq!(sentinel.next_page(), Some(2));
    assert!(sentinel.body().iter().all(|&b| b == 0));
    assert_eq!(handle.read_page(2).unwrap().next_page(), None);
}

#[test]
fn double_free_is_rejected() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    let a = handle.allocate_page(PageType::Data).unwrap().page_num();
    let b = handle.allocate_page(PageType::Data).unwrap().page_num();
    handle.free_page(a).unwrap();
    handle.free_page(b).unwrap();

    assert!(matches!(handle.free_page(a), Err(StorageError::PageAlreadyFree(p)) if p == a));
    assert!(matches!(handle.free_page(b), Err(StorageError::PageAlreadyFree(p)) if p == b));
    assert_eq!(handle.free_pages().unwrap(), vec![b, a]);

    // 链表完好：依次取回 b、a，然后才分配新页
    assert_eq!(handle.allocate_page(PageType::Data).unwrap().page_num(), b);
    assert_eq!(handle.allocate_page(PageType::Data).unwrap().page_num(), a);
    assert_eq!(handle.allocate_page(PageType::Data).unwrap().page_num(), 3);
}

#[test]
fn non_free_list_head_is_corruption() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    let a = handle.allocate_page(PageType::Data).unwrap().page_num();
    handle.free_page(a).unwrap();
    handle.close().unwrap();

    // 把空闲页的类型改回 Data
    patch_page(&path, a, 0, &[PageType::Data.as_byte()]);
    let reopened = FileHandle::open(&path).unwrap();
    assert!(matches!(
        reopened.allocate_page(PageType::Data),
        Err(StorageError::FileCorrupted(_))
    ));
    assert!(matches!(
        reopened.free_pages(),
        Err(StorageError::FileCorrupted(_))
    ));
    // 失败的分配不改变内存中的文件头
    assert_eq!(reopened.first_free().unwrap(), Some(a));
    assert_eq!(reopened.page_count().unwrap(), 2);
}

#[test]
fn dangling_free_link_is_corruption() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    let a = handle.allocate_page(PageType::Data).unwrap().page_num();
    handle.free_page(a).unwrap();
    handle.close().unwrap();

    patch_page(&path, a, 9, &500u32.to_le_bytes());
    let reopened = FileHandle::open(&path).unwrap();
    assert!(matches!(
        reopened.allocate_page(PageType::Data),
        Err(StorageError::FileCorrupted(_))
    ));
}

#[test]
fn free_list_cycle_is_detected() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    handle.allocate_page(PageType::Data).unwrap();
    handle.allocate_page(PageType::Data).unwrap();
    handle.free_page(1).unwrap();
    handle.free_page(2).unwrap();
    handle.close().unwrap();

    // 2 -> 1 -> NO_PAGE 改成 2 -> 1 -> 2
    patch_page(&path, 1, 9, &2u32.to_le_bytes());
    let reopened = FileHandle::open(&path).unwrap();
    assert!(matches!(
        reopened.free_pages(),
        Err(StorageError::FileCorrupted(_))
    ));
}

#[test]
fn list_terminator_is_no_page() {
    let (_dir, path) = scratch();
    let handle = FileHandle::create(&path).unwrap();
    handle.free_page(0).unwrap();
    let header = handle.header().unwrap();
    assert_eq!(header.first_free, 0);
    let sentinel = handle.read_page(0).unwrap();
    assert_eq!(sentinel.header().next_page, NO_PAGE);
}
