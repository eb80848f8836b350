//! Identifier algebra.
//!
//! Provider identifiers are opaque. The exception made here is narrow: the
//! `root:segment/segment/...` layout that hierarchical providers (and
//! [`crate::provider::memory::MemoryProvider`]) mint, which is the only way to
//! walk from a document back to its parent. Every function returns `None`
//! when an identifier does not follow that layout; callers must fail soft.
//!
//! Trailing empty segments are dropped when splitting, so `primary:` has the
//! single segment `primary` and `primary:DCIM/` has the path `["DCIM"]`.

use crate::reference::Reference;

pub const ROOT_DELIMITER: char = ':';
pub const PATH_DELIMITER: char = '/';

fn split_trimmed(s: &str, delimiter: char) -> Vec<&str> {
    let mut parts: Vec<&str> = s.split(delimiter).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

/// `0000-0000:folder/file.ext` -> `["0000-0000", "folder/file.ext"]`.
pub fn id_segments(document_id: &str) -> Vec<&str> {
    split_trimmed(document_id, ROOT_DELIMITER)
}

/// `0000-0000:folder/file.ext` -> `["folder", "file.ext"]`. `None` for a bare
/// root or an identifier with no root delimiter.
pub fn split_path_segments(document_id: &str) -> Option<Vec<String>> {
    let parts = id_segments(document_id);
    if parts.len() <= 1 {
        return None;
    }
    let path = parts[parts.len() - 1];
    let segments: Vec<String> = split_trimmed(path, PATH_DELIMITER)
        .into_iter()
        .map(str::to_string)
        .collect();
    if segments.is_empty() { None } else { Some(segments) }
}

/// `0000-0000:folder/file.ext` -> `0000-0000`.
pub fn extract_root(document_id: &str) -> Option<String> {
    id_segments(document_id).first().map(|s| s.to_string())
}

/// Inverse of splitting: `root` + `:` + `path`.
pub fn synthesize_identifier(root: &str, path: &str) -> String {
    format!("{root}{ROOT_DELIMITER}{path}")
}

/// Identifier one level up: last path segment dropped, root kept. A
/// top-level document yields the bare root (`root:`).
pub fn parent_identifier(document_id: &str) -> Option<String> {
    let mut segments = split_path_segments(document_id)?;
    let root = extract_root(document_id)?;
    segments.pop();
    let path = segments.join("/");
    Some(synthesize_identifier(&root, &path))
}

/// Best-effort display name: the last path segment of the document id.
pub fn derive_name_from_reference(reference: &Reference) -> Option<String> {
    let document_id = reference.document_id()?;
    split_path_segments(&document_id)?.pop()
}
