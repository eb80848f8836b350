use std::sync::{Arc, Mutex};

use docnode::mime::StaticMimeTable;
use docnode::provider::{DocumentFlags, MemoryProvider};
use docnode::reference::Reference;
use docnode::{API_KITKAT, DocError, Node, StorageContext};

const AUTHORITY: &str = "test.documents";

fn store() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::new(AUTHORITY, "primary"))
}

fn ctx_for(provider: &Arc<MemoryProvider>) -> StorageContext {
    let table: StaticMimeTable = [("png", "image/png"), ("jpg", "image/jpeg")]
        .into_iter()
        .collect();
    StorageContext::builder()
        .document_source(provider.clone())
        .mime_table(Arc::new(table))
        .build()
}

#[test]
fn create_then_find_returns_same_reference() {
    let provider = store();
    let ctx = ctx_for(&provider);
    let root = Node::from_reference(&ctx, provider.tree_reference().unwrap());

    let pictures = root.create_directory("Pictures").unwrap().expect("dir created");
    assert!(pictures.is_directory());
    let created = pictures.create_child(None, "a.png").unwrap().expect("file created");
    let found = pictures.find_child("a.png").expect("found");

    assert_eq!(found.reference(), created.reference());
    assert_eq!(created.document_id().as_deref(), Some("primary:Pictures/a.png"));
    // type inferred from the name
    assert_eq!(created.mime_type().as_deref(), Some("image/png"));
}

#[test]
fn explicit_type_leaves_name_alone() {
    let provider = store();
    let ctx = ctx_for(&provider);
    let root = Node::from_reference(&ctx, provider.tree_reference().unwrap());

    let photo = root.create_child(Some("image/jpeg"), "photo").unwrap().unwrap();
    assert_eq!(photo.name(), "photo");
    assert_eq!(photo.mime_type().as_deref(), Some("image/jpeg"));
}

#[test]
fn rename_adopts_provider_reference() {
    let provider = store();
    provider.add_file("DCIM/a.jpg", "image/jpeg", 7);
    let ctx = ctx_for(&provider);
    let root = Node::from_reference(&ctx, provider.tree_reference().unwrap());
    let mut file = root.find_child("DCIM").unwrap().find_child("a.jpg").unwrap();

    assert!(file.rename("b.jpg").unwrap());
    assert_eq!(file.name(), "b.jpg");
    assert_eq!(file.document_id().as_deref(), Some("primary:DCIM/b.jpg"));
    assert_eq!(file.length(), 7);
    assert!(!provider.contains("primary:DCIM/a.jpg"));
}

#[test]
fn rename_conflict_keeps_reference() {
    let provider = store();
    provider.add_file("a.txt", "text/plain", 1);
    provider.add_file("b.txt", "text/plain", 1);
    let ctx = ctx_for(&provider);
    let mut a = Node::from_reference(&ctx, provider.document_reference("a.txt").unwrap());
    let before = a.reference().clone();

    assert!(!a.rename("b.txt").unwrap());
    assert_eq!(a.reference(), &before);
    assert_eq!(a.name(), "a.txt");
}

#[test]
fn mutations_below_lollipop_are_unsupported() {
    let provider = store();
    provider.add_file("a.txt", "text/plain", 1);
    let ctx = StorageContext::builder()
        .document_source(provider.clone())
        .api_level(API_KITKAT)
        .build();
    let root = Node::from_reference(&ctx, provider.tree_reference().unwrap());

    assert!(matches!(
        root.create_child(Some("text/plain"), "x"),
        Err(DocError::Unsupported { required: 21, actual: 19, .. })
    ));
    assert!(matches!(root.create_directory("d"), Err(DocError::Unsupported { .. })));

    let mut file = Node::from_reference(&ctx, provider.document_reference("a.txt").unwrap());
    assert!(matches!(file.rename("b.txt"), Err(DocError::Unsupported { .. })));

    // listing is not a mutation: empty, not an error
    assert!(root.list_children().is_empty());
    // queries still work
    assert!(file.exists());
    assert_eq!(file.name(), "a.txt");
}

#[test]
fn read_write_follow_grants_type_and_flags() {
    let provider = store();
    let file_id = provider.add_file("doc.txt", "text/plain", 3);
    let dir_id = provider.add_dir("folder");
    let ctx = ctx_for(&provider);
    let file = Node::from_reference(&ctx, provider.document_reference("doc.txt").unwrap());
    let dir = Node::from_reference(&ctx, provider.document_reference("folder").unwrap());

    assert!(file.can_read());
    assert!(file.can_write());

    provider.set_flags(&file_id, DocumentFlags::SUPPORTS_WRITE);
    assert!(file.can_write());
    provider.set_flags(&file_id, DocumentFlags::SUPPORTS_RENAME);
    assert!(!file.can_write());

    provider.set_flags(&dir_id, DocumentFlags::DIR_SUPPORTS_CREATE);
    assert!(dir.can_write());
    // SUPPORTS_WRITE on a directory counts too: it has a type
    provider.set_flags(&dir_id, DocumentFlags::SUPPORTS_WRITE);
    assert!(dir.can_write());
    provider.set_flags(&dir_id, DocumentFlags::empty());
    assert!(!dir.can_write());

    provider.set_flags(&file_id, DocumentFlags::SUPPORTS_DELETE);
    provider.set_grants(true, false);
    assert!(file.can_read());
    assert!(!file.can_write());

    provider.set_grants(true, true);
    provider.set_mime_type(&file_id, None);
    assert!(!file.can_read());
    assert!(!file.is_file());
    assert!(!file.is_directory());
    // delete flag alone still makes it writable
    assert!(file.can_write());
}

#[test]
fn name_falls_back_to_identifier_then_sentinel() {
    let provider = store();
    let id = provider.add_file(".hidden/config", "text/plain", 0);
    provider.hide_display_name(&id);
    let ctx = ctx_for(&provider);

    let node = Node::from_reference(&ctx, provider.document_reference(".hidden/config").unwrap());
    assert_eq!(node.name(), "config");

    let opaque = Node::from_reference(&ctx, Reference::build_document_uri(AUTHORITY, "8842").unwrap());
    assert!(!opaque.exists());
    assert_eq!(opaque.name(), "error");
}

#[test]
fn transport_errors_read_as_missing_and_reach_the_hook() {
    let provider = store();
    provider.add_file("a.txt", "text/plain", 1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let ctx = StorageContext::builder()
        .document_source(provider.clone())
        .diagnostic_hook(move |d| sink.lock().unwrap().push(d.operation))
        .build();
    let mut node = Node::from_reference(&ctx, provider.document_reference("a.txt").unwrap());

    provider.set_fail_queries(true);
    assert!(!node.exists());
    assert_eq!(node.length(), 0);
    node.capture_snapshot();
    assert!(node.snapshot().is_none());

    let ops = seen.lock().unwrap().clone();
    assert_eq!(ops, vec!["exists", "length", "capture snapshot"]);

    provider.set_fail_queries(false);
    assert!(node.exists());
}

#[test]
fn delete_reports_provider_outcome() {
    let provider = store();
    provider.add_file("music/a.flac", "audio/flac", 10);
    let ctx = ctx_for(&provider);
    let root = Node::from_reference(&ctx, provider.tree_reference().unwrap());
    let music = root.find_child("music").unwrap();

    assert!(music.delete());
    assert!(!music.exists());
    assert!(!provider.contains("primary:music/a.flac"));
    // the provider refuses to delete its root
    assert!(!root.delete());
    assert!(root.exists());
}

#[test]
fn listing_wraps_children_with_owning_parent() {
    let provider = store();
    provider.add_file("x/1.txt", "text/plain", 1);
    provider.add_file("x/2.txt", "text/plain", 2);
    provider.add_dir("x/sub");
    let ctx = ctx_for(&provider);
    let x = Node::from_reference(&ctx, provider.document_reference("x").unwrap());

    let mut names: Vec<String> = x.list_children().iter().map(Node::name).collect();
    names.sort();
    assert_eq!(names, vec!["1.txt", "2.txt", "sub"]);
    for child in x.list_children() {
        assert_eq!(child.parent().unwrap().reference(), x.reference());
    }

    let file = x.find_child("1.txt").unwrap();
    assert!(file.list_children().is_empty());
}
