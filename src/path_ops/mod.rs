//! Path primitives.
//!
//! The direct-path side of a node never touches `std::fs` itself; it goes
//! through [`PathPrimitives`] so that a context can swap in another
//! implementation (tests force individual failures this way).
//! [`LocalPaths`] is the real thing.

mod helpers;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;
use walkdir::WalkDir;

use crate::platform;

pub use helpers::{describe_io_error, io_error_with_help_io};

/// One stat call's worth of metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathStat {
    pub is_dir: bool,
    pub is_file: bool,
    pub len: u64,
    /// Milliseconds since the Unix epoch; 0 when unknown.
    pub modified_ms: i64,
    pub readable: bool,
    pub writable: bool,
}

/// Synchronous filesystem primitives with plain std semantics.
pub trait PathPrimitives: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;

    /// True only for the link itself; used to keep recursive deletes from
    /// walking through links.
    fn is_symlink(&self, _path: &Path) -> bool {
        false
    }

    /// Direct entries of `dir`, in whatever order the OS yields them.
    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Create an empty file; fails if anything already exists at `path`.
    fn create_new_file(&self, path: &Path) -> io::Result<()>;

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a file, a link, or an empty directory.
    fn remove(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn stat(&self, path: &Path) -> io::Result<PathStat>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPaths;

fn millis_since_epoch(t: SystemTime) -> i64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

impl PathPrimitives for LocalPaths {
    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            entries.push(entry.into_path());
        }
        trace!(dir = %dir.display(), count = entries.len(), "listed entries");
        Ok(entries)
    }

    fn create_new_file(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| ())
            .map_err(io_error_with_help_io("create file", path))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).map_err(io_error_with_help_io("create dir", path))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path).map_err(io_error_with_help_io("stat", path))?;
        if meta.is_dir() {
            fs::remove_dir(path).map_err(io_error_with_help_io("remove dir", path))
        } else {
            fs::remove_file(path).map_err(io_error_with_help_io("remove file", path))
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to).map_err(io_error_with_help_io("rename", from))
    }

    fn stat(&self, path: &Path) -> io::Result<PathStat> {
        let meta = fs::metadata(path).map_err(io_error_with_help_io("stat", path))?;
        Ok(PathStat {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            len: meta.len(),
            modified_ms: meta.modified().map(millis_since_epoch).unwrap_or(0),
            readable: platform::is_readable(path),
            writable: platform::is_writable(path),
        })
    }
}
