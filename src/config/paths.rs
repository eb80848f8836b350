//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{anyhow, Result};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// Path named by `DOCNODE_CONFIG`, made absolute against the current
/// directory when relative. `None` when unset or empty.
pub fn config_path_from_env() -> Option<PathBuf> {
    let raw = env::var_os(CONFIG_ENV)?;
    if raw.is_empty() {
        return None;
    }
    let p = PathBuf::from(raw);
    Some(std::path::absolute(&p).unwrap_or(p))
}

/// OS-appropriate default config path: `<config dir>/docnode/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(base) = config_dir() {
        return Ok(base.join("docnode").join("config.xml"));
    }
    env::var_os("HOME")
        .map(|h| PathBuf::from(h).join(".config").join("docnode").join("config.xml"))
        .ok_or_else(|| anyhow!("cannot determine a config directory (no platform config dir, HOME unset)"))
}

/// OS-appropriate default log file path (data dir). Nothing is created.
pub fn default_log_path() -> Result<PathBuf> {
    if let Some(base) = data_dir() {
        return Ok(base.join("docnode").join("docnode.log"));
    }
    env::var_os("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("docnode")
                .join("docnode.log")
        })
        .ok_or_else(|| anyhow!("cannot determine a data directory (no platform data dir, HOME unset)"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
