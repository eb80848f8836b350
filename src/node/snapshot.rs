//! Point-in-time metadata.

use crate::reference::Reference;

/// Everything the property getters can answer, fetched in one go by
/// [`crate::node::Node::capture_snapshot`]. Never refreshed on its own; do
/// not hold one across long intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub readable: bool,
    pub writable: bool,
    pub exists: bool,
    /// `None` for directories.
    pub mime_type: Option<String>,
    pub reference: Reference,
    pub is_directory: bool,
    pub is_file: bool,
    /// Milliseconds since the Unix epoch; 0 when unknown.
    pub last_modified: i64,
    pub length: u64,
    pub name: String,
    pub parent: Option<Reference>,
}
