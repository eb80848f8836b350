//! In-memory document provider.
//!
//! Holds one document tree and mints identifiers in the `root:a/b/c`
//! layout, so parent derivation works on everything it hands out. Useful as
//! a test double and anywhere a provider is needed without a platform.
//! Thread-safe via an internal `RwLock`.
//!
//! Failure injection (`set_fail_queries`, `fail_delete_of`) and a query
//! counter make it possible to observe how the node layer talks to it.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use tracing::{debug, trace};

use super::{Column, DocumentFlags, DocumentProvider, Grant, GrantChecker, Row, MIME_TYPE_DIR};
use crate::doc_id::{parent_identifier, synthesize_identifier};
use crate::errors::{DocError, ProviderError};
use crate::reference::Reference;

#[derive(Debug, Clone)]
struct Entry {
    display_name: Option<String>,
    mime_type: Option<String>,
    flags: DocumentFlags,
    last_modified: i64,
    size: u64,
}

impl Entry {
    fn is_dir(&self) -> bool {
        self.mime_type.as_deref() == Some(MIME_TYPE_DIR)
    }
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    fail_queries: bool,
    fail_deletes: HashSet<String>,
    read_grant: bool,
    write_grant: bool,
}

pub struct MemoryProvider {
    authority: String,
    root_id: String,
    state: RwLock<State>,
    queries: AtomicUsize,
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn child_id(parent_id: &str, name: &str) -> String {
    if parent_id.ends_with(':') {
        format!("{parent_id}{name}")
    } else {
        format!("{parent_id}/{name}")
    }
}

/// "photo.jpg" -> "photo (n).jpg"; dotfiles and extension-less names get the
/// suffix at the end.
fn name_with_suffix(name: &str, n: u32) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({n})"),
    }
}

impl MemoryProvider {
    /// Empty tree whose root document id is `root:`.
    pub fn new(authority: &str, root: &str) -> Self {
        let root_id = synthesize_identifier(root, "");
        let mut state = State {
            read_grant: true,
            write_grant: true,
            ..State::default()
        };
        state.entries.insert(
            root_id.clone(),
            Entry {
                display_name: Some(root.to_string()),
                mime_type: Some(MIME_TYPE_DIR.to_string()),
                flags: DocumentFlags::DIR_SUPPORTS_CREATE,
                last_modified: now_millis(),
                size: 0,
            },
        );
        Self {
            authority: authority.to_string(),
            root_id,
            state: RwLock::new(state),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Identifier for a `/`-separated path below the root ("" is the root).
    pub fn id_for(&self, path: &str) -> String {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            self.root_id.clone()
        } else {
            format!("{}{}", self.root_id, trimmed)
        }
    }

    /// Tree reference granting the whole store.
    pub fn tree_reference(&self) -> Result<Reference, DocError> {
        Reference::build_tree_uri(&self.authority, &self.root_id)
    }

    /// Tree reference rooted at a sub-directory.
    pub fn tree_reference_at(&self, path: &str) -> Result<Reference, DocError> {
        Reference::build_tree_uri(&self.authority, &self.id_for(path))
    }

    /// Document reference for `path`, inside the whole-store tree.
    pub fn document_reference(&self, path: &str) -> Result<Reference, DocError> {
        let tree = self.tree_reference()?;
        Reference::build_document_uri_using_tree(&tree, &self.id_for(path))
    }

    pub fn add_dir(&self, path: &str) -> String {
        let id = self.id_for(path);
        let mut state = self.write();
        Self::ensure_ancestors(&mut state, &self.root_id, &id);
        state.entries.entry(id.clone()).or_insert_with(|| Self::dir_entry(&id));
        id
    }

    pub fn add_file(&self, path: &str, mime_type: &str, size: u64) -> String {
        let id = self.id_for(path);
        let mut state = self.write();
        Self::ensure_ancestors(&mut state, &self.root_id, &id);
        state.entries.insert(id.clone(), Self::file_entry(&id, mime_type, size));
        id
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.read().entries.contains_key(document_id)
    }

    pub fn set_flags(&self, document_id: &str, flags: DocumentFlags) {
        if let Some(entry) = self.write().entries.get_mut(document_id) {
            entry.flags = flags;
        }
    }

    pub fn set_mime_type(&self, document_id: &str, mime_type: Option<&str>) {
        if let Some(entry) = self.write().entries.get_mut(document_id) {
            entry.mime_type = mime_type.map(str::to_string);
        }
    }

    /// Make the display-name column come back null for this document.
    pub fn hide_display_name(&self, document_id: &str) {
        if let Some(entry) = self.write().entries.get_mut(document_id) {
            entry.display_name = None;
        }
    }

    pub fn set_grants(&self, read: bool, write: bool) {
        let mut state = self.write();
        state.read_grant = read;
        state.write_grant = write;
    }

    /// Every query fails with a transport error while set.
    pub fn set_fail_queries(&self, fail: bool) {
        self.write().fail_queries = fail;
    }

    pub fn fail_delete_of(&self, document_id: &str) {
        self.write().fail_deletes.insert(document_id.to_string());
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn leaf_name(id: &str) -> String {
        id.rsplit(['/', ':']).next().unwrap_or(id).to_string()
    }

    fn dir_entry(id: &str) -> Entry {
        Entry {
            display_name: Some(Self::leaf_name(id)),
            mime_type: Some(MIME_TYPE_DIR.to_string()),
            flags: DocumentFlags::DIR_SUPPORTS_CREATE
                | DocumentFlags::SUPPORTS_DELETE
                | DocumentFlags::SUPPORTS_RENAME,
            last_modified: now_millis(),
            size: 0,
        }
    }

    fn file_entry(id: &str, mime_type: &str, size: u64) -> Entry {
        Entry {
            display_name: Some(Self::leaf_name(id)),
            mime_type: Some(mime_type.to_string()),
            flags: DocumentFlags::SUPPORTS_WRITE
                | DocumentFlags::SUPPORTS_DELETE
                | DocumentFlags::SUPPORTS_RENAME,
            last_modified: now_millis(),
            size,
        }
    }

    fn ensure_ancestors(state: &mut State, root_id: &str, id: &str) {
        let mut pending = Vec::new();
        let mut current = parent_identifier(id);
        while let Some(parent) = current {
            if parent == root_id || state.entries.contains_key(&parent) {
                break;
            }
            current = parent_identifier(&parent);
            pending.push(parent);
        }
        for parent in pending.into_iter().rev() {
            let entry = Self::dir_entry(&parent);
            state.entries.insert(parent, entry);
        }
    }

    fn resolve_id(&self, reference: &Reference) -> Result<String, ProviderError> {
        if reference.authority() != self.authority {
            return Err(ProviderError::NotFound(reference.to_string()));
        }
        reference
            .document_id()
            .or_else(|| reference.tree_document_id())
            .ok_or_else(|| ProviderError::NotFound(reference.to_string()))
    }

    fn is_descendant(candidate: &str, ancestor: &str) -> bool {
        candidate.len() > ancestor.len()
            && candidate.starts_with(ancestor)
            && (ancestor.ends_with(':') || candidate.as_bytes()[ancestor.len()] == b'/')
    }

    fn unique_child_id(state: &State, parent_id: &str, name: &str) -> String {
        let candidate = child_id(parent_id, name);
        if !state.entries.contains_key(&candidate) {
            return candidate;
        }
        let mut n = 2;
        loop {
            let candidate = child_id(parent_id, &name_with_suffix(name, n));
            if !state.entries.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl DocumentProvider for MemoryProvider {
    fn query(&self, reference: &Reference, columns: &[Column]) -> Result<Option<Row>, ProviderError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let state = self.read();
        if state.fail_queries {
            return Err(ProviderError::Transport(format!("query of {reference} refused")));
        }
        let id = match self.resolve_id(reference) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        let Some(entry) = state.entries.get(&id) else {
            trace!(document_id = %id, "query: no such document");
            return Ok(None);
        };
        let mut row = Row::new();
        for column in columns {
            match column {
                Column::DocumentId => row.set(*column, id.as_str()),
                Column::MimeType => row.set(*column, entry.mime_type.clone()),
                Column::DisplayName => row.set(*column, entry.display_name.clone()),
                Column::LastModified => row.set(*column, entry.last_modified),
                Column::Size => row.set(*column, i64::try_from(entry.size).unwrap_or(i64::MAX)),
                Column::Flags => row.set(*column, i64::from(entry.flags.bits())),
            }
        }
        Ok(Some(row))
    }

    fn child_document_ids(&self, parent: &Reference) -> Result<Vec<String>, ProviderError> {
        let id = self.resolve_id(parent)?;
        let state = self.read();
        match state.entries.get(&id) {
            None => Err(ProviderError::NotFound(id)),
            Some(entry) if !entry.is_dir() => Ok(Vec::new()),
            Some(_) => Ok(state
                .entries
                .keys()
                .filter(|key| parent_identifier(key).as_deref() == Some(id.as_str()))
                .cloned()
                .collect()),
        }
    }

    fn create_document(
        &self,
        parent: &Reference,
        mime_type: &str,
        display_name: &str,
    ) -> Result<Reference, ProviderError> {
        let parent_id = self.resolve_id(parent)?;
        let mut state = self.write();
        let parent_entry = state
            .entries
            .get(&parent_id)
            .ok_or_else(|| ProviderError::NotFound(parent_id.clone()))?;
        if !parent_entry.is_dir() || !parent_entry.flags.contains(DocumentFlags::DIR_SUPPORTS_CREATE) {
            return Err(ProviderError::PermissionDenied(parent_id));
        }

        let name = display_name.replace(['/', ':'], "_");
        let id = Self::unique_child_id(&state, &parent_id, &name);
        let mut entry = if mime_type == MIME_TYPE_DIR {
            Self::dir_entry(&id)
        } else {
            Self::file_entry(&id, mime_type, 0)
        };
        entry.display_name = Some(Self::leaf_name(&id));
        state.entries.insert(id.clone(), entry);
        debug!(document_id = %id, mime_type, "created document");

        parent
            .rebuild_with_id(&id)
            .ok_or_else(|| ProviderError::Transport(format!("cannot address {id} under {parent}")))
    }

    fn delete_document(&self, reference: &Reference) -> Result<bool, ProviderError> {
        let id = self.resolve_id(reference)?;
        let mut state = self.write();
        if !state.entries.contains_key(&id) {
            return Err(ProviderError::NotFound(id));
        }
        if id == self.root_id || state.fail_deletes.contains(&id) {
            return Err(ProviderError::PermissionDenied(id));
        }
        state
            .entries
            .retain(|key, _| key != &id && !Self::is_descendant(key, &id));
        debug!(document_id = %id, "deleted document");
        Ok(true)
    }

    fn rename_document(
        &self,
        reference: &Reference,
        display_name: &str,
    ) -> Result<Option<Reference>, ProviderError> {
        let id = self.resolve_id(reference)?;
        let mut state = self.write();
        if !state.entries.contains_key(&id) {
            return Err(ProviderError::NotFound(id));
        }
        let Some(parent_id) = parent_identifier(&id).filter(|_| id != self.root_id) else {
            return Ok(None);
        };
        let name = display_name.replace(['/', ':'], "_");
        let new_id = child_id(&parent_id, &name);
        if new_id != id && state.entries.contains_key(&new_id) {
            return Ok(None);
        }

        let moved: Vec<String> = state
            .entries
            .keys()
            .filter(|key| **key == id || Self::is_descendant(key, &id))
            .cloned()
            .collect();
        for old_key in moved {
            if let Some(mut entry) = state.entries.remove(&old_key) {
                let new_key = format!("{new_id}{}", &old_key[id.len()..]);
                if old_key == id {
                    entry.display_name = Some(name.clone());
                }
                state.entries.insert(new_key, entry);
            }
        }
        debug!(from = %id, to = %new_id, "renamed document");
        Ok(reference.rebuild_with_id(&new_id))
    }
}

impl GrantChecker for MemoryProvider {
    fn has_grant(&self, reference: &Reference, grant: Grant) -> bool {
        if reference.authority() != self.authority {
            return false;
        }
        let state = self.read();
        match grant {
            Grant::Read => state.read_grant,
            Grant::Write => state.write_grant,
        }
    }
}
