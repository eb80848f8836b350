//! I/O error hints.
//!
//! Direct-path failures end up as `false`/`None` at the node boundary, so the
//! only place their detail survives is the log line. These helpers make that
//! line actionable: op, path, a platform-aware hint and the raw OS code.
//!
//! Usage:
//!   // keep the io::Result shape (kind preserved)
//!   fs::create_dir(dir).map_err(io_error_with_help_io("create dir", dir))?;
//!
//!   // just the text, for a warn! line
//!   warn!("{}", describe_io_error("delete", path, &e));

use std::io;
use std::path::Path;

#[cfg(unix)]
use libc;

/// Format a human-friendly message with op/path plus platform-aware hints.
pub fn describe_io_error(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str(" - permission denied; check ownership and write permissions.");
                }
                libc::ENOENT => {
                    msg.push_str(" - path not found; verify it exists.");
                }
                libc::EEXIST => {
                    msg.push_str(" - already exists; pick a unique name or remove the target.");
                }
                libc::ENOTEMPTY => {
                    msg.push_str(" - directory not empty; its contents must go first.");
                }
                libc::EXDEV => {
                    msg.push_str(" - cross-filesystem; atomic rename not possible.");
                }
                libc::EBUSY => {
                    msg.push_str(" - resource busy; another process holds it.");
                }
                libc::ENOSPC => {
                    msg.push_str(" - insufficient space on device.");
                }
                libc::EROFS => {
                    msg.push_str(" - read-only filesystem; cannot write here.");
                }
                libc::ENAMETOOLONG => {
                    msg.push_str(" - filename or path too long; shorten path segments.");
                }
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str(" - access denied; check permissions."), // ERROR_ACCESS_DENIED
                2 | 3 => msg.push_str(" - path not found; verify it exists."), // FILE/PATH NOT FOUND
                80 | 183 => msg.push_str(" - already exists; pick a unique name."), // FILE_EXISTS / ALREADY_EXISTS
                145 => msg.push_str(" - directory not empty; its contents must go first."), // ERROR_DIR_NOT_EMPTY
                17 => msg.push_str(" - not same device; cross-filesystem rename."), // ERROR_NOT_SAME_DEVICE
                32 => msg.push_str(" - sharing violation; file is in use."), // ERROR_SHARING_VIOLATION
                19 => msg.push_str(" - write protected / read-only media."), // ERROR_WRITE_PROTECT
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => {
                msg.push_str(" - permission denied; check ownership and write permissions.");
            }
            io::ErrorKind::NotFound => {
                msg.push_str(" - path not found; verify it exists.");
            }
            io::ErrorKind::AlreadyExists => {
                msg.push_str(" - already exists; remove or choose a unique name.");
            }
            _ => {}
        }
    }

    msg
}

/// Returns a closure suitable for `.map_err(...)` that converts io::Error -> io::Error
/// with enriched context in the message while preserving the original ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), describe_io_error(op, path, &e))
}
