//! Platform-specific helpers.
//! Hides OS differences (Unix/Windows) behind a uniform API: secure log and
//! config file creation, and the access checks behind a path's
//! readable/writable bits.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(unix)]
pub use unix::{
    is_readable, is_writable, open_log_file_secure_append, set_dir_mode_0700,
    write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use windows::{
    is_readable, is_writable, open_log_file_secure_append, set_dir_mode_0700,
    write_config_secure_new_0600,
};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique hidden sibling name for atomic writes.
/// Pattern: .docnode.tmp.<pid>.<nanos>.<seq>
pub(crate) fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!(".docnode.tmp.{pid}.{nanos}.{seq}");
    target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn tmp_names_are_unique_across_threads() {
        let handles: Vec<_> = (0..16)
            .map(|_| thread::spawn(|| tmp_sibling_name(Path::new("dir/config.xml"))))
            .collect();
        let set: HashSet<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(set.len(), 16);
        assert!(set.iter().all(|p| p.starts_with("dir")));
    }
}
