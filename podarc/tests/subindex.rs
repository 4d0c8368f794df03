//! Committed subtrees: subindex blocks are transparent to readers and
//! permanently read-only to writers.

use std::path::PathBuf;

use podarc::{Container, Error, MissingBehavior};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn scratch() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("subindex.pod");
    (dir, path)
}

#[test]
fn commit_is_transparent_to_reads() {
    let (_dir, path) = scratch();
    let container = Container::create(&path).unwrap();
    let root = container.root();

    let geo = root.create_subdirectory("geometry").unwrap();
    geo.write("points", &[[1.0f32, 2.0, 3.0]]).unwrap();
    let inner = geo.create_subdirectory("uv").unwrap();
    inner.write("s", &[0.25f32, 0.75]).unwrap();

    let names_before = geo.child_names().unwrap();
    geo.commit().unwrap();

    // Same listing and same payloads, served from the subindex block.
    assert_eq!(geo.child_names().unwrap(), names_before);
    assert_eq!(geo.read::<[f32; 3]>("points").unwrap(), [[1.0, 2.0, 3.0]]);
    let inner = geo
        .subdirectory("uv", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert_eq!(inner.read::<f32>("s").unwrap(), [0.25, 0.75]);

    container.flush().unwrap();
    drop(container);

    let reopened = Container::open(&path).unwrap();
    let geo = reopened
        .root()
        .subdirectory("geometry", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert_eq!(geo.child_names().unwrap(), names_before);
    assert_eq!(geo.read::<[f32; 3]>("points").unwrap(), [[1.0, 2.0, 3.0]]);
    let inner = geo
        .subdirectory("uv", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert_eq!(inner.read::<f32>("s").unwrap(), [0.25, 0.75]);
}

#[test]
fn committed_locations_reject_mutation() {
    let (_dir, path) = scratch();
    let container = Container::create(&path).unwrap();
    let root = container.root();

    let geo = root.create_subdirectory("geometry").unwrap();
    geo.write("points", &[1.0f32]).unwrap();
    geo.create_subdirectory("uv").unwrap();
    geo.commit().unwrap();

    assert!(matches!(
        geo.write("more", &[2.0f32]),
        Err(Error::AlreadyCommitted(_))
    ));
    assert!(matches!(
        geo.create_subdirectory("d"),
        Err(Error::AlreadyCommitted(_))
    ));
    assert!(matches!(geo.remove("points"), Err(Error::AlreadyCommitted(_))));
    // A second commit is itself a mutation.
    assert!(matches!(geo.commit(), Err(Error::AlreadyCommitted(_))));

    // The read-only state is inherited by everything underneath.
    let inner = geo
        .subdirectory("uv", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert!(matches!(
        inner.write("s", &[0.5f32]),
        Err(Error::AlreadyCommitted(_))
    ));

    // Siblings and the parent stay writable.
    root.write("frame", &[1u32]).unwrap();
    let other = root.create_subdirectory("other").unwrap();
    other.write("x", &[1u8]).unwrap();
}

#[test]
fn committed_locations_stay_read_only_after_reopen() {
    let (_dir, path) = scratch();
    {
        let container = Container::create(&path).unwrap();
        let geo = container.root().create_subdirectory("geometry").unwrap();
        geo.write("points", &[1.0f32, 2.0]).unwrap();
        geo.commit().unwrap();
        container.flush().unwrap();
    }

    let container = Container::append(&path).unwrap();
    let root = container.root();
    let geo = root
        .subdirectory("geometry", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert_eq!(geo.read::<f32>("points").unwrap(), [1.0, 2.0]);
    assert!(matches!(
        geo.write("more", &[3.0f32]),
        Err(Error::AlreadyCommitted(_))
    ));

    // New work next to the committed subtree still lands.
    root.write("frame", &[7u32]).unwrap();
    container.flush().unwrap();
    drop(container);

    let reopened = Container::open(&path).unwrap();
    assert_eq!(reopened.root().read::<u32>("frame").unwrap(), [7]);
    let geo = reopened
        .root()
        .subdirectory("geometry", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert_eq!(geo.read::<f32>("points").unwrap(), [1.0, 2.0]);
}

#[test]
fn nested_commits_round_trip() {
    let (_dir, path) = scratch();
    {
        let container = Container::create(&path).unwrap();
        let root = container.root();
        let a = root.create_subdirectory("a").unwrap();
        let b = a.create_subdirectory("b").unwrap();
        b.write("v", &[1u64, 2, 3]).unwrap();
        // Inner first, then the enclosing subtree.
        b.commit().unwrap();
        a.commit().unwrap();
        container.flush().unwrap();
    }

    let container = Container::open(&path).unwrap();
    let b = container
        .root()
        .subdirectory("a", MissingBehavior::Error)
        .unwrap()
        .unwrap()
        .subdirectory("b", MissingBehavior::Error)
        .unwrap()
        .unwrap();
    assert_eq!(b.read::<u64>("v").unwrap(), [1, 2, 3]);
}
