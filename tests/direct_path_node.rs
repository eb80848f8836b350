use std::fs;
use std::sync::Arc;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use filetime::FileTime;

use docnode::mime::{StaticMimeTable, OCTET_STREAM};
use docnode::{Node, StorageContext};

fn fixture_ctx() -> StorageContext {
    let table: StaticMimeTable = [("jpg", "image/jpeg"), ("txt", "text/plain")]
        .into_iter()
        .collect();
    StorageContext::builder().mime_table(Arc::new(table)).build()
}

#[test]
fn create_then_find_returns_same_reference() {
    let temp = TempDir::new().unwrap();
    let ctx = StorageContext::local();
    let root = Node::from_path(&ctx, temp.path()).unwrap();

    let created = root.create_child(None, "notes").unwrap().expect("created");
    let found = root.find_child("notes").expect("found");
    assert_eq!(found.reference(), created.reference());
    assert_eq!(created.parent().unwrap().reference(), root.reference());
    assert!(temp.child("notes").path().is_file());
}

#[test]
fn mime_type_appends_registered_extension() {
    let temp = TempDir::new().unwrap();
    let ctx = fixture_ctx();
    let root = Node::from_path(&ctx, temp.path()).unwrap();

    let photo = root.create_child(Some("image/jpeg"), "photo").unwrap().unwrap();
    assert_eq!(photo.name(), "photo.jpg");
    assert!(temp.child("photo.jpg").path().is_file());

    // unknown type: name used as given
    let blob = root.create_child(Some("application/x-nope"), "blob").unwrap().unwrap();
    assert_eq!(blob.name(), "blob");
}

#[test]
fn default_table_appends_conventional_extension() {
    let temp = TempDir::new().unwrap();
    let ctx = StorageContext::local();
    let root = Node::from_path(&ctx, temp.path()).unwrap();

    let photo = root.create_child(Some("image/jpeg"), "photo").unwrap().unwrap();
    assert_eq!(photo.name(), "photo.jpg");
    assert_eq!(photo.mime_type().as_deref(), Some("image/jpeg"));

    let notes = root.create_child(Some("text/plain"), "notes").unwrap().unwrap();
    assert_eq!(notes.name(), "notes.txt");
    assert_eq!(notes.mime_type().as_deref(), Some("text/plain"));

    let song = root.create_child(Some("audio/mpeg"), "song").unwrap().unwrap();
    assert_eq!(song.name(), "song.mp3");
    assert!(temp.child("song.mp3").path().is_file());
}

#[test]
fn tree_shaped_file_reference_stays_direct() {
    let ctx = StorageContext::local();
    let node = Node::parse(&ctx, "file:///tree/photos").unwrap();
    assert!(node.is_direct_path());
    assert_eq!(node.reference().as_str(), "file:///tree/photos");
    assert_eq!(node.document_id(), None);
    assert_eq!(node.reference().tree_document_id(), None);
}

#[test]
fn create_child_fails_soft_when_target_exists() {
    let temp = TempDir::new().unwrap();
    temp.child("taken.txt").write_str("x").unwrap();
    let ctx = StorageContext::local();
    let root = Node::from_path(&ctx, temp.path()).unwrap();

    assert!(root.create_child(None, "taken.txt").unwrap().is_none());
    assert_eq!(fs::read_to_string(temp.child("taken.txt").path()).unwrap(), "x");
}

#[test]
fn create_directory_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let ctx = StorageContext::local();
    let root = Node::from_path(&ctx, temp.path()).unwrap();

    let first = root.create_directory("photos").unwrap().expect("created");
    let second = root.create_directory("photos").unwrap().expect("existing dir accepted");
    assert_eq!(first.reference(), second.reference());
    assert!(second.is_directory());

    // a file with that name is not a directory
    temp.child("file").touch().unwrap();
    assert!(root.create_directory("file").unwrap().is_none());
}

#[test]
fn getters_reflect_the_filesystem() {
    let temp = TempDir::new().unwrap();
    let f = temp.child("photo.JPG");
    f.write_binary(&[0u8; 42]).unwrap();
    filetime::set_file_mtime(f.path(), FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
    temp.child("sub").create_dir_all().unwrap();

    let ctx = fixture_ctx();
    let node = Node::from_path(&ctx, f.path()).unwrap();
    assert!(node.exists());
    assert!(node.is_file());
    assert!(!node.is_directory());
    assert_eq!(node.length(), 42);
    assert_eq!(node.last_modified(), 1_600_000_000_000);
    assert_eq!(node.mime_type().as_deref(), Some("image/jpeg"));
    assert_eq!(node.name(), "photo.JPG");
    assert!(node.can_read());

    let dir = Node::from_path(&ctx, &temp.path().join("sub")).unwrap();
    assert!(dir.is_directory());
    assert_eq!(dir.mime_type(), None);

    let missing = Node::from_path(&ctx, &temp.path().join("gone.bin")).unwrap();
    assert!(!missing.exists());
    assert_eq!(missing.length(), 0);
    assert_eq!(missing.last_modified(), 0);
    assert!(!missing.can_read());
    assert_eq!(missing.mime_type().as_deref(), Some(OCTET_STREAM));
}

#[test]
fn rename_mutates_the_same_node() {
    let temp = TempDir::new().unwrap();
    temp.child("old.txt").write_str("data").unwrap();
    let ctx = StorageContext::local();
    let mut node = Node::from_path(&ctx, &temp.path().join("old.txt")).unwrap();
    node.capture_snapshot();

    assert!(node.rename("new.txt").unwrap());
    assert_eq!(node.name(), "new.txt");
    assert!(node.snapshot().is_none());
    assert!(node.exists());
    assert!(!temp.child("old.txt").path().exists());
    assert_eq!(fs::read_to_string(temp.child("new.txt").path()).unwrap(), "data");
}

#[test]
fn failed_rename_keeps_reference() {
    let temp = TempDir::new().unwrap();
    let ctx = StorageContext::local();
    let mut node = Node::from_path(&ctx, &temp.path().join("nothing-here")).unwrap();
    let before = node.reference().clone();
    assert!(!node.rename("other").unwrap());
    assert_eq!(node.reference(), &before);
}

#[test]
fn listing_a_missing_directory_is_empty() {
    let temp = TempDir::new().unwrap();
    let ctx = StorageContext::local();
    let node = Node::from_path(&ctx, &temp.path().join("absent")).unwrap();
    assert!(node.list_children().is_empty());
    assert!(node.find_child("x").is_none());
}

#[test]
fn derived_parent_is_the_containing_directory() {
    let temp = TempDir::new().unwrap();
    temp.child("a").create_dir_all().unwrap();
    temp.child("a/b.txt").touch().unwrap();
    let ctx = StorageContext::local();
    let node = Node::from_path(&ctx, &temp.path().join("a/b.txt")).unwrap();
    let parent = node.parent().unwrap();
    assert_eq!(parent.name(), "a");
    assert!(parent.is_directory());
}
