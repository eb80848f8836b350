//! Provider side of a node. Queries are single-row lookups on the node's
//! own reference; errors from them are reported and read as "missing".

use super::{Node, Snapshot};
use crate::context::{Severity, API_LOLLIPOP};
use crate::doc_id::derive_name_from_reference;
use crate::errors::DocError;
use crate::mime::infer_mime_type_from_name;
use crate::provider::{Column, DocumentFlags, Grant, Row, MIME_TYPE_DIR};
use crate::reference::Reference;

const SNAPSHOT_COLUMNS: [Column; 5] = [
    Column::MimeType,
    Column::LastModified,
    Column::Size,
    Column::Flags,
    Column::DisplayName,
];

/// Name used when neither the provider nor the identifier yields one.
const NAME_FALLBACK: &str = "error";

fn query(node: &Node<'_>, operation: &'static str, columns: &[Column]) -> Option<Row> {
    match node.ctx.provider().query(&node.reference, columns) {
        Ok(row) => row,
        Err(e) => {
            node.ctx.report(operation, &node.reference, Severity::Debug, e.to_string());
            None
        }
    }
}

/// Empty strings count as absent.
fn raw_mime(row: &Row) -> Option<&str> {
    row.text(Column::MimeType).filter(|m| !m.is_empty())
}

/// (readable, writable) from the grants plus the MIME type and flags.
fn access(node: &Node<'_>, raw_mime: Option<&str>, flags: DocumentFlags) -> (bool, bool) {
    let grants = node.ctx.grants();
    let has_mime = raw_mime.is_some();
    let is_dir = raw_mime == Some(MIME_TYPE_DIR);
    let readable = has_mime && grants.has_grant(&node.reference, Grant::Read);
    let writable = grants.has_grant(&node.reference, Grant::Write)
        && (flags.contains(DocumentFlags::SUPPORTS_DELETE)
            || (is_dir && flags.contains(DocumentFlags::DIR_SUPPORTS_CREATE))
            || (has_mime && flags.contains(DocumentFlags::SUPPORTS_WRITE)));
    (readable, writable)
}

fn name_from(node: &Node<'_>, row: Option<&Row>) -> String {
    row.and_then(|r| r.text(Column::DisplayName))
        .map(str::to_string)
        .or_else(|| derive_name_from_reference(&node.reference))
        .unwrap_or_else(|| NAME_FALLBACK.to_string())
}

fn non_negative(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

pub(super) fn exists(node: &Node<'_>) -> bool {
    query(node, "exists", &[Column::DocumentId]).is_some()
}

fn raw_mime_type(node: &Node<'_>, operation: &'static str) -> Option<String> {
    let row = query(node, operation, &[Column::MimeType])?;
    raw_mime(&row).map(str::to_string)
}

pub(super) fn mime_type(node: &Node<'_>) -> Option<String> {
    raw_mime_type(node, "mime type").filter(|m| m != MIME_TYPE_DIR)
}

pub(super) fn is_directory(node: &Node<'_>) -> bool {
    raw_mime_type(node, "is directory").as_deref() == Some(MIME_TYPE_DIR)
}

pub(super) fn is_file(node: &Node<'_>) -> bool {
    raw_mime_type(node, "is file").is_some_and(|m| m != MIME_TYPE_DIR)
}

pub(super) fn can_read(node: &Node<'_>) -> bool {
    let Some(row) = query(node, "can read", &[Column::MimeType]) else {
        return false;
    };
    access(node, raw_mime(&row), DocumentFlags::empty()).0
}

pub(super) fn can_write(node: &Node<'_>) -> bool {
    let Some(row) = query(node, "can write", &[Column::MimeType, Column::Flags]) else {
        return false;
    };
    access(node, raw_mime(&row), DocumentFlags::from_row(&row)).1
}

pub(super) fn last_modified(node: &Node<'_>) -> i64 {
    query(node, "last modified", &[Column::LastModified])
        .and_then(|r| r.integer(Column::LastModified))
        .unwrap_or(0)
}

pub(super) fn length(node: &Node<'_>) -> u64 {
    query(node, "length", &[Column::Size])
        .and_then(|r| r.integer(Column::Size))
        .map(non_negative)
        .unwrap_or(0)
}

pub(super) fn name(node: &Node<'_>) -> String {
    let row = query(node, "name", &[Column::DisplayName]);
    name_from(node, row.as_ref())
}

/// One batched query. No row, or a failed query, means no snapshot.
pub(super) fn capture(node: &Node<'_>) -> Option<Snapshot> {
    let row = match node.ctx.provider().query(&node.reference, &SNAPSHOT_COLUMNS) {
        Ok(Some(row)) => row,
        Ok(None) => {
            node.ctx.report(
                "capture snapshot",
                &node.reference,
                Severity::Debug,
                "no metadata row; nothing cached",
            );
            return None;
        }
        Err(e) => {
            node.ctx.report("capture snapshot", &node.reference, Severity::Debug, e.to_string());
            return None;
        }
    };

    let raw = raw_mime(&row);
    let is_directory = raw == Some(MIME_TYPE_DIR);
    let (readable, writable) = access(node, raw, DocumentFlags::from_row(&row));

    Some(Snapshot {
        readable,
        writable,
        exists: true,
        mime_type: raw.filter(|_| !is_directory).map(str::to_string),
        reference: node.reference.clone(),
        is_directory,
        is_file: !is_directory && raw.is_some(),
        last_modified: row.integer(Column::LastModified).unwrap_or(0),
        length: row.integer(Column::Size).map(non_negative).unwrap_or(0),
        name: name_from(node, Some(&row)),
        parent: node.parent_reference(),
    })
}

pub(super) fn list_children<'ctx>(node: &Node<'ctx>) -> Vec<Node<'ctx>> {
    if node.ctx.api_level() < API_LOLLIPOP {
        node.ctx.report(
            "list children",
            &node.reference,
            Severity::Warn,
            format!(
                "child enumeration needs API level {API_LOLLIPOP}, context reports {}",
                node.ctx.api_level()
            ),
        );
        return Vec::new();
    }
    let ids = match node.ctx.provider().child_document_ids(&node.reference) {
        Ok(ids) => ids,
        Err(e) => {
            node.ctx.report("list children", &node.reference, Severity::Debug, e.to_string());
            return Vec::new();
        }
    };
    ids.iter()
        .filter_map(|id| node.reference.rebuild_with_id(id))
        .map(|reference| node.child(reference))
        .collect()
}

/// Without an explicit type the MIME type is inferred from `display_name`.
pub(super) fn create_child<'ctx>(
    node: &Node<'ctx>,
    mime_type: Option<&str>,
    display_name: &str,
) -> Result<Option<Node<'ctx>>, DocError> {
    node.ctx.require_api("create child", API_LOLLIPOP)?;
    let mime_type = match mime_type {
        Some(m) => m.to_string(),
        None => infer_mime_type_from_name(node.ctx.mime(), display_name),
    };
    match node
        .ctx
        .provider()
        .create_document(&node.reference, &mime_type, display_name)
    {
        Ok(reference) => Ok(Some(node.child(reference))),
        Err(e) => {
            node.ctx.report("create child", &node.reference, Severity::Warn, e.to_string());
            Ok(None)
        }
    }
}

pub(super) fn create_directory<'ctx>(
    node: &Node<'ctx>,
    display_name: &str,
) -> Result<Option<Node<'ctx>>, DocError> {
    node.ctx.require_api("create directory", API_LOLLIPOP)?;
    match node.ctx.provider().create_directory(&node.reference, display_name) {
        Ok(reference) => Ok(Some(node.child(reference))),
        Err(e) => {
            node.ctx.report("create directory", &node.reference, Severity::Warn, e.to_string());
            Ok(None)
        }
    }
}

pub(super) fn delete(node: &Node<'_>) -> bool {
    match node.ctx.provider().delete_document(&node.reference) {
        Ok(deleted) => deleted,
        Err(e) => {
            node.ctx.report("delete", &node.reference, Severity::Warn, e.to_string());
            false
        }
    }
}

/// The provider may answer with a different reference altogether.
pub(super) fn rename(node: &Node<'_>, display_name: &str) -> Result<Option<Reference>, DocError> {
    node.ctx.require_api("rename", API_LOLLIPOP)?;
    match node.ctx.provider().rename_document(&node.reference, display_name) {
        Ok(renamed) => Ok(renamed),
        Err(e) => {
            node.ctx.report("rename", &node.reference, Severity::Debug, e.to_string());
            Ok(None)
        }
    }
}
