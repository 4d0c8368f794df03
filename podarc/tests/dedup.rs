//! Content-hash deduplication of written payloads.

use podarc::Container;

#[test]
fn identical_payloads_share_one_physical_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dedup.pod");

    let payload: Vec<u32> = (0..64 * 1024).map(|i| i ^ 0xdead_beef).collect();
    let payload_bytes = payload.len() as u64 * 4;

    let container = Container::create(&path).unwrap();
    let root = container.root();
    root.write("first", &payload).unwrap();
    container.flush().unwrap();
    let after_first = std::fs::metadata(&path).unwrap().len();

    root.write("second", &payload).unwrap();
    let sub = root.create_subdirectory("nested").unwrap();
    sub.write("third", &payload).unwrap();
    container.flush().unwrap();
    let after_third = std::fs::metadata(&path).unwrap().len();

    let first = root.entry("first").unwrap();
    let second = root.entry("second").unwrap();
    let third = sub.entry("third").unwrap();
    assert_eq!(first.offset, second.offset);
    assert_eq!(first.offset, third.offset);

    // The file grew by index overhead only, not by another copy.
    assert!(after_first >= payload_bytes);
    assert!(
        after_third - after_first < payload_bytes / 2,
        "file grew by {} bytes for deduplicated writes",
        after_third - after_first
    );

    assert_eq!(root.read::<u32>("second").unwrap(), payload);
    assert_eq!(sub.read::<u32>("third").unwrap(), payload);
}

#[test]
fn distinct_payloads_do_not_alias() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dedup.pod");

    let container = Container::create(&path).unwrap();
    let root = container.root();
    root.write("a", &[1u8, 2, 3]).unwrap();
    root.write("b", &[1u8, 2, 4]).unwrap();

    let a = root.entry("a").unwrap();
    let b = root.entry("b").unwrap();
    assert_ne!(a.offset, b.offset);
}

#[test]
fn removing_one_alias_keeps_the_shared_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dedup.pod");

    let container = Container::create(&path).unwrap();
    let root = container.root();
    root.write("keep", &[5u64; 100]).unwrap();
    root.write("drop", &[5u64; 100]).unwrap();
    root.remove("drop").unwrap();
    container.flush().unwrap();
    drop(container);

    let container = Container::open(&path).unwrap();
    assert_eq!(container.root().read::<u64>("keep").unwrap(), [5u64; 100]);
}
