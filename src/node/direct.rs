//! Direct-path side of a node: everything goes through the context's
//! [`crate::path_ops::PathPrimitives`].

use std::path::{Path, PathBuf};

use super::{Node, Snapshot};
use crate::context::Severity;
use crate::mime::infer_mime_type_from_name;
use crate::reference::Reference;

fn path_of(node: &Node<'_>) -> Option<PathBuf> {
    node.reference.to_path()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(super) fn exists(node: &Node<'_>) -> bool {
    path_of(node).is_some_and(|p| node.ctx.paths().exists(&p))
}

pub(super) fn is_directory(node: &Node<'_>) -> bool {
    path_of(node).is_some_and(|p| node.ctx.paths().is_dir(&p))
}

pub(super) fn is_file(node: &Node<'_>) -> bool {
    path_of(node).is_some_and(|p| node.ctx.paths().is_file(&p))
}

pub(super) fn can_read(node: &Node<'_>) -> bool {
    path_of(node)
        .and_then(|p| node.ctx.paths().stat(&p).ok())
        .is_some_and(|s| s.readable)
}

pub(super) fn can_write(node: &Node<'_>) -> bool {
    path_of(node)
        .and_then(|p| node.ctx.paths().stat(&p).ok())
        .is_some_and(|s| s.writable)
}

pub(super) fn last_modified(node: &Node<'_>) -> i64 {
    path_of(node)
        .and_then(|p| node.ctx.paths().stat(&p).ok())
        .map(|s| s.modified_ms)
        .unwrap_or(0)
}

pub(super) fn length(node: &Node<'_>) -> u64 {
    path_of(node)
        .and_then(|p| node.ctx.paths().stat(&p).ok())
        .map(|s| s.len)
        .unwrap_or(0)
}

pub(super) fn name(node: &Node<'_>) -> String {
    path_of(node).map(|p| file_name(&p)).unwrap_or_default()
}

/// `None` for directories, otherwise inferred from the name (the file need
/// not exist).
pub(super) fn mime_type(node: &Node<'_>) -> Option<String> {
    let path = path_of(node)?;
    if node.ctx.paths().is_dir(&path) {
        return None;
    }
    Some(infer_mime_type_from_name(node.ctx.mime(), &file_name(&path)))
}

pub(super) fn parent_reference(node: &Node<'_>) -> Option<Reference> {
    let path = path_of(node)?;
    Reference::from_path(path.parent()?).ok()
}

pub(super) fn capture(node: &Node<'_>) -> Option<Snapshot> {
    let path = path_of(node)?;
    let paths = node.ctx.paths();
    let stat = paths.stat(&path).ok().unwrap_or_default();
    let name = file_name(&path);
    let mime_type = if stat.is_dir {
        None
    } else {
        Some(infer_mime_type_from_name(node.ctx.mime(), &name))
    };
    Some(Snapshot {
        readable: stat.readable,
        writable: stat.writable,
        exists: paths.exists(&path),
        mime_type,
        reference: node.reference.clone(),
        is_directory: stat.is_dir,
        is_file: stat.is_file,
        last_modified: stat.modified_ms,
        length: stat.len,
        name,
        parent: node.parent_reference(),
    })
}

pub(super) fn list_children<'ctx>(node: &Node<'ctx>) -> Vec<Node<'ctx>> {
    let Some(dir) = path_of(node) else {
        return Vec::new();
    };
    let entries = match node.ctx.paths().list(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            node.ctx.report("list children", &node.reference, Severity::Debug, e.to_string());
            return Vec::new();
        }
    };
    entries
        .iter()
        .filter_map(|entry| Reference::from_path(entry).ok())
        .map(|reference| node.child(reference))
        .collect()
}

pub(super) fn create_child<'ctx>(
    node: &Node<'ctx>,
    mime_type: Option<&str>,
    display_name: &str,
) -> Option<Node<'ctx>> {
    let dir = path_of(node)?;
    let mut name = display_name.to_string();
    if let Some(extension) = mime_type.and_then(|m| node.ctx.mime().extension_for_mime(m)) {
        name.push('.');
        name.push_str(&extension);
    }
    let target = dir.join(&name);
    if let Err(e) = node.ctx.paths().create_new_file(&target) {
        node.ctx.report("create child", &node.reference, Severity::Warn, e.to_string());
        return None;
    }
    let reference = Reference::from_path(&target).ok()?;
    Some(node.child(reference))
}

/// An existing directory at the target counts as created.
pub(super) fn create_directory<'ctx>(node: &Node<'ctx>, display_name: &str) -> Option<Node<'ctx>> {
    let dir = path_of(node)?;
    let target = dir.join(display_name);
    let paths = node.ctx.paths();
    if !paths.is_dir(&target) {
        if let Err(e) = paths.create_dir(&target) {
            node.ctx.report("create directory", &node.reference, Severity::Warn, e.to_string());
            return None;
        }
    }
    let reference = Reference::from_path(&target).ok()?;
    Some(node.child(reference))
}

/// Depth-first, best-effort. Links are removed, never followed.
fn delete_contents(node: &Node<'_>, dir: &Path) -> bool {
    let paths = node.ctx.paths();
    let entries = match paths.list(dir) {
        Ok(entries) => entries,
        Err(e) => {
            node.ctx.report("delete", &node.reference, Severity::Debug, e.to_string());
            return true;
        }
    };
    let mut success = true;
    for entry in entries {
        if paths.is_dir(&entry) && !paths.is_symlink(&entry) {
            success &= delete_contents(node, &entry);
        }
        if let Err(e) = paths.remove(&entry) {
            node.ctx.report(
                "delete",
                &node.reference,
                Severity::Warn,
                format!("failed to delete {}: {e}", entry.display()),
            );
            success = false;
        }
    }
    success
}

pub(super) fn delete(node: &Node<'_>) -> bool {
    let Some(path) = path_of(node) else {
        return false;
    };
    let paths = node.ctx.paths();
    let contents_ok = if paths.is_dir(&path) && !paths.is_symlink(&path) {
        delete_contents(node, &path)
    } else {
        true
    };
    let removed = match paths.remove(&path) {
        Ok(()) => true,
        Err(e) => {
            node.ctx.report("delete", &node.reference, Severity::Warn, e.to_string());
            false
        }
    };
    contents_ok && removed
}

/// Renames within the same directory. Returns the new reference.
pub(super) fn rename(node: &Node<'_>, display_name: &str) -> Option<Reference> {
    let path = path_of(node)?;
    let target = path.parent()?.join(display_name);
    let reference = Reference::from_path(&target).ok()?;
    match node.ctx.paths().rename(&path, &target) {
        Ok(()) => Some(reference),
        Err(e) => {
            node.ctx.report("rename", &node.reference, Severity::Debug, e.to_string());
            None
        }
    }
}
