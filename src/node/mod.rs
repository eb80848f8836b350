//! Nodes.
//!
//! A [`Node`] is one file or directory, addressed either by a direct path
//! (`file://`) or by a provider document reference (`content://`). Every
//! call checks the scheme afresh and routes to `direct` or `document`; there
//! is no third mode.
//!
//! Failures come back as `None`, `false` or an empty list. The single
//! exception is [`DocError::Unsupported`], returned when a provider
//! mutation is attempted on a context whose API level cannot do it.
//!
//! Property getters read from the [`Snapshot`] when one has been captured
//! and query otherwise.

mod direct;
mod document;
mod snapshot;

use std::path::Path;

use tracing::trace;

use crate::context::StorageContext;
use crate::doc_id::parent_identifier;
use crate::errors::DocError;
use crate::reference::Reference;

pub use snapshot::Snapshot;

#[derive(Debug, Clone)]
pub struct Node<'ctx> {
    ctx: &'ctx StorageContext,
    reference: Reference,
    parent: Option<Box<Node<'ctx>>>,
    snapshot: Option<Snapshot>,
}

/// A bare tree reference is given its root document part.
fn prepare_tree_reference(tree: Reference) -> Reference {
    match tree
        .tree_document_id()
        .and_then(|id| Reference::build_document_uri_using_tree(&tree, &id).ok())
    {
        Some(document) => document,
        None => tree,
    }
}

impl<'ctx> Node<'ctx> {
    /// Wrap `reference`. A bare provider tree reference (`/tree/<id>`) is
    /// resolved to its root document first; `file://` references are kept
    /// as they are.
    pub fn from_reference(ctx: &'ctx StorageContext, reference: Reference) -> Self {
        let reference = if reference.is_tree_uri() {
            prepare_tree_reference(reference)
        } else {
            reference
        };
        Self::new(ctx, reference, None)
    }

    pub fn parse(ctx: &'ctx StorageContext, input: &str) -> Result<Self, DocError> {
        Ok(Self::from_reference(ctx, Reference::parse(input)?))
    }

    pub fn from_path(ctx: &'ctx StorageContext, path: &Path) -> Result<Self, DocError> {
        Ok(Self::new(ctx, Reference::from_path(path)?, None))
    }

    fn new(ctx: &'ctx StorageContext, reference: Reference, parent: Option<Box<Node<'ctx>>>) -> Self {
        Self {
            ctx,
            reference,
            parent,
            snapshot: None,
        }
    }

    /// Copy without the snapshot, as stored in children.
    fn detached(&self) -> Node<'ctx> {
        Self::new(self.ctx, self.reference.clone(), self.parent.clone())
    }

    fn child(&self, reference: Reference) -> Node<'ctx> {
        Self::new(self.ctx, reference, Some(Box::new(self.detached())))
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn context(&self) -> &'ctx StorageContext {
        self.ctx
    }

    pub fn is_direct_path(&self) -> bool {
        self.reference.is_file_scheme()
    }

    /// Document id, or the tree id for a reference without a document part.
    /// Always `None` for direct paths.
    pub fn document_id(&self) -> Option<String> {
        if self.is_direct_path() {
            return None;
        }
        self.reference
            .document_id()
            .or_else(|| self.reference.tree_document_id())
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// The node this one was listed or created from, else one derived from
    /// the reference itself. Never above the top of the tree.
    pub fn parent(&self) -> Option<Node<'ctx>> {
        match &self.parent {
            Some(parent) => Some(parent.as_ref().clone()),
            None => self.derived_parent(),
        }
    }

    fn parent_reference(&self) -> Option<Reference> {
        match &self.parent {
            Some(parent) => Some(parent.reference.clone()),
            None => self.derived_parent().map(|p| p.reference),
        }
    }

    fn derived_parent(&self) -> Option<Node<'ctx>> {
        if self.is_direct_path() {
            let reference = direct::parent_reference(self)?;
            return Some(Self::new(self.ctx, reference, None));
        }

        let document_id = self.document_id()?;
        let tree_id = self.reference.tree_document_id();
        if tree_id.as_deref() == Some(document_id.as_str()) {
            return None;
        }
        if let Some(parent_id) = parent_identifier(&document_id) {
            let reference = self.reference.rebuild_with_id(&parent_id)?;
            return Some(Self::new(self.ctx, reference, None));
        }

        // Identifier without a path part: the best guess is the tree root.
        trace!(document_id = %document_id, "identifier has no path segments; using tree root as parent");
        let tree = Reference::build_tree_uri(self.reference.authority(), &tree_id?).ok()?;
        Some(Self::from_reference(self.ctx, tree))
    }

    /// Fetch every property at once and serve getters from memory until
    /// [`Node::discard_snapshot`]. A provider document that cannot be queried
    /// leaves no snapshot.
    pub fn capture_snapshot(&mut self) {
        self.snapshot = if self.is_direct_path() {
            direct::capture(self)
        } else {
            document::capture(self)
        };
    }

    pub fn discard_snapshot(&mut self) {
        self.snapshot = None;
    }

    pub fn exists(&self) -> bool {
        if let Some(s) = &self.snapshot {
            return s.exists;
        }
        if self.is_direct_path() {
            direct::exists(self)
        } else {
            document::exists(self)
        }
    }

    /// Direct children, in whatever order the backing store yields them.
    pub fn list_children(&self) -> Vec<Node<'ctx>> {
        if self.is_direct_path() {
            direct::list_children(self)
        } else {
            document::list_children(self)
        }
    }

    /// First child whose display name equals `name`. Linear in the number of
    /// children.
    pub fn find_child(&self, name: &str) -> Option<Node<'ctx>> {
        self.list_children().into_iter().find(|child| child.name() == name)
    }

    /// Create an empty file under this directory.
    ///
    /// Direct paths append the extension registered for `mime_type`, if any,
    /// and fail when the target exists. Providers receive the type as given
    /// (inferred from `name` when `None`) and pick the final name themselves.
    pub fn create_child(&self, mime_type: Option<&str>, name: &str) -> Result<Option<Node<'ctx>>, DocError> {
        if self.is_direct_path() {
            Ok(direct::create_child(self, mime_type, name))
        } else {
            document::create_child(self, mime_type, name)
        }
    }

    /// Create a directory under this one. For direct paths an existing
    /// directory of that name counts as success.
    pub fn create_directory(&self, name: &str) -> Result<Option<Node<'ctx>>, DocError> {
        if self.is_direct_path() {
            Ok(direct::create_directory(self, name))
        } else {
            document::create_directory(self, name)
        }
    }

    /// Delete this node. Direct-path directories are emptied depth-first
    /// first; any failure along the way makes the result `false` without
    /// stopping the sweep.
    pub fn delete(&self) -> bool {
        if self.is_direct_path() {
            direct::delete(self)
        } else {
            document::delete(self)
        }
    }

    /// Rename in place. On success the node's reference is replaced (a
    /// provider may hand back an entirely new one) and the snapshot is
    /// dropped; on failure nothing changes.
    pub fn rename(&mut self, name: &str) -> Result<bool, DocError> {
        let renamed = if self.is_direct_path() {
            direct::rename(self, name)
        } else {
            document::rename(self, name)?
        };
        match renamed {
            Some(reference) => {
                trace!(from = %self.reference, to = %reference, "renamed");
                self.reference = reference;
                self.snapshot = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn can_read(&self) -> bool {
        if let Some(s) = &self.snapshot {
            return s.readable;
        }
        if self.is_direct_path() {
            direct::can_read(self)
        } else {
            document::can_read(self)
        }
    }

    pub fn can_write(&self) -> bool {
        if let Some(s) = &self.snapshot {
            return s.writable;
        }
        if self.is_direct_path() {
            direct::can_write(self)
        } else {
            document::can_write(self)
        }
    }

    /// `None` for directories and for documents without a type.
    pub fn mime_type(&self) -> Option<String> {
        if let Some(s) = &self.snapshot {
            return s.mime_type.clone();
        }
        if self.is_direct_path() {
            direct::mime_type(self)
        } else {
            document::mime_type(self)
        }
    }

    pub fn is_directory(&self) -> bool {
        if let Some(s) = &self.snapshot {
            return s.is_directory;
        }
        if self.is_direct_path() {
            direct::is_directory(self)
        } else {
            document::is_directory(self)
        }
    }

    pub fn is_file(&self) -> bool {
        if let Some(s) = &self.snapshot {
            return s.is_file;
        }
        if self.is_direct_path() {
            direct::is_file(self)
        } else {
            document::is_file(self)
        }
    }

    /// Milliseconds since the Unix epoch; 0 when missing or unknown.
    pub fn last_modified(&self) -> i64 {
        if let Some(s) = &self.snapshot {
            return s.last_modified;
        }
        if self.is_direct_path() {
            direct::last_modified(self)
        } else {
            document::last_modified(self)
        }
    }

    /// Size in bytes; 0 when missing or unknown.
    pub fn length(&self) -> u64 {
        if let Some(s) = &self.snapshot {
            return s.length;
        }
        if self.is_direct_path() {
            direct::length(self)
        } else {
            document::length(self)
        }
    }

    /// Display name. For provider documents this falls back to the last
    /// identifier segment, then to `"error"`.
    pub fn name(&self) -> String {
        if let Some(s) = &self.snapshot {
            return s.name.clone();
        }
        if self.is_direct_path() {
            direct::name(self)
        } else {
            document::name(self)
        }
    }
}
