//! Provider-side collaborators.
//!
//! A document provider answers single-row metadata queries, enumerates the
//! children of a tree document, and performs create/delete/rename. Grants are
//! checked separately through [`GrantChecker`]. Both are black boxes to the
//! node layer; [`memory::MemoryProvider`] is an in-process implementation.

pub mod memory;

use std::collections::HashMap;

use bitflags::bitflags;

use crate::errors::ProviderError;
use crate::reference::Reference;

pub use memory::MemoryProvider;

/// MIME type providers report for directories.
pub const MIME_TYPE_DIR: &str = "vnd.android.document/directory";

/// Queryable document columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    DocumentId,
    MimeType,
    DisplayName,
    LastModified,
    Size,
    Flags,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::DocumentId => "document_id",
            Column::MimeType => "mime_type",
            Column::DisplayName => "_display_name",
            Column::LastModified => "last_modified",
            Column::Size => "_size",
            Column::Flags => "flags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One result row; columns that were not requested are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<Column, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: Column, value: impl Into<Value>) {
        self.values.insert(column, value.into());
    }

    pub fn get(&self, column: Column) -> Option<&Value> {
        self.values.get(&column)
    }

    pub fn text(&self, column: Column) -> Option<&str> {
        match self.values.get(&column) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, column: Column) -> Option<i64> {
        match self.values.get(&column) {
            Some(Value::Integer(n)) => Some(*n),
            Some(Value::Text(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

bitflags! {
    /// Capability bits in the `flags` column.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DocumentFlags: u32 {
        const SUPPORTS_THUMBNAIL = 1;
        const SUPPORTS_WRITE = 1 << 1;
        const SUPPORTS_DELETE = 1 << 2;
        const DIR_SUPPORTS_CREATE = 1 << 3;
        const DIR_PREFERS_GRID = 1 << 4;
        const DIR_PREFERS_LAST_MODIFIED = 1 << 5;
        const SUPPORTS_RENAME = 1 << 6;
    }
}

impl DocumentFlags {
    pub fn from_row(row: &Row) -> Self {
        let raw = row.integer(Column::Flags).unwrap_or(0);
        DocumentFlags::from_bits_truncate(u32::try_from(raw).unwrap_or(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    Read,
    Write,
}

/// Provider query and mutation primitives. Each call acquires and releases
/// whatever it needs before returning.
pub trait DocumentProvider: Send + Sync {
    /// Zero or one row for `reference`, restricted to `columns`.
    fn query(&self, reference: &Reference, columns: &[Column]) -> Result<Option<Row>, ProviderError>;

    /// Identifiers of the documents directly under the tree document `parent`.
    fn child_document_ids(&self, parent: &Reference) -> Result<Vec<String>, ProviderError>;

    fn create_document(
        &self,
        parent: &Reference,
        mime_type: &str,
        display_name: &str,
    ) -> Result<Reference, ProviderError>;

    fn create_directory(&self, parent: &Reference, display_name: &str) -> Result<Reference, ProviderError> {
        self.create_document(parent, MIME_TYPE_DIR, display_name)
    }

    fn delete_document(&self, reference: &Reference) -> Result<bool, ProviderError>;

    /// May hand back a different reference (new id, possibly new type), or
    /// `None` when the provider declined.
    fn rename_document(
        &self,
        reference: &Reference,
        display_name: &str,
    ) -> Result<Option<Reference>, ProviderError>;
}

pub trait GrantChecker: Send + Sync {
    fn has_grant(&self, reference: &Reference, grant: Grant) -> bool;
}

/// Stand-in for contexts that only serve direct paths: every document is
/// missing and nothing is granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvider;

impl DocumentProvider for NoProvider {
    fn query(&self, _reference: &Reference, _columns: &[Column]) -> Result<Option<Row>, ProviderError> {
        Ok(None)
    }

    fn child_document_ids(&self, parent: &Reference) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::NotFound(parent.to_string()))
    }

    fn create_document(
        &self,
        parent: &Reference,
        _mime_type: &str,
        _display_name: &str,
    ) -> Result<Reference, ProviderError> {
        Err(ProviderError::NotFound(parent.to_string()))
    }

    fn delete_document(&self, reference: &Reference) -> Result<bool, ProviderError> {
        Err(ProviderError::NotFound(reference.to_string()))
    }

    fn rename_document(
        &self,
        reference: &Reference,
        _display_name: &str,
    ) -> Result<Option<Reference>, ProviderError> {
        Err(ProviderError::NotFound(reference.to_string()))
    }
}

impl GrantChecker for NoProvider {
    fn has_grant(&self, _reference: &Reference, _grant: Grant) -> bool {
        false
    }
}
