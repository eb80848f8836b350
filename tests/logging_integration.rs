use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;
use assert_fs::TempDir;
use tempfile::tempdir;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tsfmt, registry};

use docnode::logging::{maybe_open_non_blocking_writer, LocalHumanTime};
use docnode::provider::MemoryProvider;
use docnode::{API_KITKAT, Node, StorageContext};

/// Appends written bytes into a shared Vec<u8>.
#[derive(Clone)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a scoped subscriber at `level`; returns what it logged.
fn capture_logs(level: &str, f: impl FnOnce()) -> String {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buf = buf.clone();
        move || BufferWriter(buf.clone())
    };
    let layer = tsfmt::layer()
        .with_writer(make_writer)
        .with_ansi(false)
        .with_target(false)
        .compact();
    let subscriber = registry().with(EnvFilter::new(level)).with(layer);
    let dispatch = tracing::Dispatch::new(subscriber);
    tracing::dispatcher::with_default(&dispatch, f);

    let guard = buf.lock().unwrap();
    String::from_utf8_lossy(&guard[..]).to_string()
}

#[test]
fn failed_create_is_logged_at_warn() {
    let temp = TempDir::new().unwrap();
    temp.child("taken").touch().unwrap();
    let ctx = StorageContext::local();
    let root = Node::from_path(&ctx, temp.path()).unwrap();

    let contents = capture_logs("warn", || {
        assert!(root.create_child(None, "taken").unwrap().is_none());
    });
    assert!(contents.contains("WARN"), "contents={contents}");
    assert!(contents.contains("create child"), "contents={contents}");
    assert!(contents.contains("already exists"), "contents={contents}");
}

#[test]
fn swallowed_query_errors_stay_below_warn() {
    let provider = Arc::new(MemoryProvider::new("test.documents", "primary"));
    provider.add_file("a.txt", "text/plain", 1);
    provider.set_fail_queries(true);
    let ctx = StorageContext::builder().document_source(provider.clone()).build();
    let node = Node::from_reference(&ctx, provider.document_reference("a.txt").unwrap());

    let at_warn = capture_logs("warn", || {
        assert!(!node.exists());
    });
    assert!(at_warn.is_empty(), "contents={at_warn}");

    let at_debug = capture_logs("debug", || {
        assert!(!node.exists());
    });
    assert!(at_debug.contains("exists"), "contents={at_debug}");
}

#[test]
fn listing_below_lollipop_warns() {
    let provider = Arc::new(MemoryProvider::new("test.documents", "primary"));
    provider.add_file("a.txt", "text/plain", 1);
    let ctx = StorageContext::builder()
        .document_source(provider.clone())
        .api_level(API_KITKAT)
        .build();
    let root = Node::from_reference(&ctx, provider.tree_reference().unwrap());

    let contents = capture_logs("warn", || {
        assert!(root.list_children().is_empty());
    });
    assert!(contents.contains("list children"), "contents={contents}");
}

#[test]
fn file_logging_writes_to_custom_path() {
    let td = tempdir().expect("tempdir");
    let log_path: PathBuf = td.path().join("docnode_test.log");

    // the production path refuses symlinked ancestors (macOS /var -> /private/var)
    if docnode::config::path_has_symlink_ancestor(&log_path).unwrap() {
        eprintln!("Skipping file logging test: path has symlink ancestor: {}", log_path.display());
        return;
    }

    let (writer, guard) = maybe_open_non_blocking_writer(&log_path).expect("writer");
    let file_layer = tsfmt::layer()
        .with_writer(move || writer.clone())
        .with_timer(LocalHumanTime)
        .with_ansi(false)
        .with_target(false)
        .compact();
    let subscriber = registry().with(EnvFilter::new("info")).with(file_layer);
    let dispatch = tracing::Dispatch::new(subscriber);
    tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!("file-logging-test: written");
    });

    // flush the worker
    drop(guard);

    let contents = std::fs::read_to_string(&log_path).expect("read log file");
    assert!(contents.contains("file-logging-test"), "contents={contents}");
}

#[cfg(unix)]
#[test]
fn symlinked_log_directory_is_refused() {
    let td = tempdir().unwrap();
    let real = td.path().join("real");
    std::fs::create_dir(&real).unwrap();
    let link = td.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    assert!(maybe_open_non_blocking_writer(&link.join("x.log")).is_none());
    assert!(!real.join("x.log").exists());
}
