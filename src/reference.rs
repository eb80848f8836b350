//! Location references.
//!
//! A [`Reference`] is a URI-like handle: `file:///…` for direct paths, or a
//! provider URI such as
//! `content://<authority>/tree/<tree id>/document/<document id>` for
//! documents reached through a granted tree. Identifiers are carried
//! percent-encoded inside path segments (`:` -> `%3A`, `/` -> `%2F`) and are
//! decoded on the way out.
//!
//! Nothing here interprets an identifier beyond locating it in the URI; the
//! one place that looks inside identifiers is [`crate::doc_id`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::doc_id::{extract_root, split_path_segments, synthesize_identifier};
use crate::errors::DocError;

pub const SCHEME_FILE: &str = "file";
pub const SCHEME_CONTENT: &str = "content";

pub const EXTERNAL_STORAGE_AUTHORITY: &str = "com.android.externalstorage.documents";
pub const DOWNLOADS_AUTHORITY: &str = "com.android.providers.downloads.documents";
pub const MEDIA_AUTHORITY: &str = "com.android.providers.media.documents";

const PATH_DOCUMENT: &str = "document";
const PATH_TREE: &str = "tree";

/// Everything except the platform's unreserved set gets escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'!')
    .remove(b'.')
    .remove(b'~')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*');

fn encode(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

fn invalid(input: impl Into<String>, reason: impl Into<String>) -> DocError {
    DocError::InvalidReference {
        input: input.into(),
        reason: reason.into(),
    }
}

/// Opaque location handle (scheme, authority, identifier).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    url: Url,
}

impl Reference {
    pub fn parse(input: &str) -> Result<Self, DocError> {
        Url::parse(input)
            .map(|url| Self { url })
            .map_err(|e| invalid(input, e.to_string()))
    }

    /// Build a `file://` reference. Relative paths are made absolute against
    /// the current directory.
    pub fn from_path(path: &Path) -> Result<Self, DocError> {
        let absolute =
            std::path::absolute(path).map_err(|e| invalid(path.display().to_string(), e.to_string()))?;
        Url::from_file_path(&absolute)
            .map(|url| Self { url })
            .map_err(|()| invalid(absolute.display().to_string(), "not representable as a file URL"))
    }

    /// Tree reference: `content://<authority>/tree/<tree id>`.
    pub fn build_tree_uri(authority: &str, tree_id: &str) -> Result<Self, DocError> {
        Self::parse(&format!(
            "{SCHEME_CONTENT}://{authority}/{PATH_TREE}/{}",
            encode(tree_id)
        ))
    }

    /// Stand-alone document reference: `content://<authority>/document/<id>`.
    /// Carries no tree, so it carries no tree-scoped grant either.
    pub fn build_document_uri(authority: &str, document_id: &str) -> Result<Self, DocError> {
        Self::parse(&format!(
            "{SCHEME_CONTENT}://{authority}/{PATH_DOCUMENT}/{}",
            encode(document_id)
        ))
    }

    /// Document reference that keeps the tree of `tree`, which is what the
    /// grant is attached to.
    pub fn build_document_uri_using_tree(tree: &Reference, document_id: &str) -> Result<Self, DocError> {
        let tree_id = tree
            .tree_document_id()
            .ok_or_else(|| invalid(tree.as_str(), "reference carries no tree segment"))?;
        Self::parse(&format!(
            "{SCHEME_CONTENT}://{}/{PATH_TREE}/{}/{PATH_DOCUMENT}/{}",
            tree.authority(),
            encode(&tree_id),
            encode(document_id)
        ))
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn is_file_scheme(&self) -> bool {
        self.url.scheme().eq_ignore_ascii_case(SCHEME_FILE)
    }

    pub fn is_content_scheme(&self) -> bool {
        self.url.scheme().eq_ignore_ascii_case(SCHEME_CONTENT)
    }

    /// Authority component; empty for direct-path references.
    pub fn authority(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    /// Filesystem path for `file://` references.
    pub fn to_path(&self) -> Option<PathBuf> {
        if !self.is_file_scheme() {
            return None;
        }
        let path = self.url.to_file_path().ok()?;
        Some(dunce::simplified(&path).to_path_buf())
    }

    /// Decoded, non-empty path segments.
    pub fn path_segments(&self) -> Vec<String> {
        self.url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tree id of a provider reference. Direct paths never carry one, even
    /// when a directory happens to be called `tree`.
    pub fn tree_document_id(&self) -> Option<String> {
        if self.is_file_scheme() {
            return None;
        }
        let mut segments = self.path_segments();
        if segments.len() >= 2 && segments[0] == PATH_TREE {
            return Some(segments.swap_remove(1));
        }
        None
    }

    pub fn document_id(&self) -> Option<String> {
        if self.is_file_scheme() {
            return None;
        }
        let mut segments = self.path_segments();
        if segments.len() >= 2 && segments[0] == PATH_DOCUMENT {
            return Some(segments.swap_remove(1));
        }
        if segments.len() >= 4 && segments[0] == PATH_TREE && segments[2] == PATH_DOCUMENT {
            return Some(segments.swap_remove(3));
        }
        None
    }

    /// A bare tree reference (`/tree/<id>` and nothing else). Not useful by
    /// itself until it is given a document part.
    pub fn is_tree_uri(&self) -> bool {
        if self.is_file_scheme() {
            return false;
        }
        let segments = self.path_segments();
        segments.len() == 2 && segments[0] == PATH_TREE
    }

    pub fn is_document_uri(&self) -> bool {
        self.is_content_scheme() && self.document_id().is_some()
    }

    pub fn has_tree_document_id(&self) -> bool {
        self.tree_document_id().is_some()
    }

    /// Human-readable identifier, e.g. `0000-0000:folder/file.ext`; falls back
    /// to the tree id when there is no document part.
    pub fn nice_path(&self) -> Option<String> {
        self.document_id().or_else(|| self.tree_document_id())
    }

    pub fn is_external_storage_document(&self) -> bool {
        self.authority() == EXTERNAL_STORAGE_AUTHORITY
    }

    pub fn is_downloads_document(&self) -> bool {
        self.authority() == DOWNLOADS_AUTHORITY
    }

    pub fn is_media_document(&self) -> bool {
        self.authority() == MEDIA_AUTHORITY
    }

    /// Assumed reference to a child named `name`, without listing the parent
    /// or asking the provider to create anything. Only meaningful for
    /// hierarchical identifiers.
    pub fn child_reference(&self, name: &str) -> Option<Reference> {
        if self.is_file_scheme() {
            return Reference::from_path(&self.to_path()?.join(name)).ok();
        }
        let id = self.nice_path()?;
        let child_id = if id.ends_with(':') {
            format!("{id}{name}")
        } else {
            format!("{id}/{name}")
        };
        self.rebuild_with_id(&child_id)
    }

    /// Assumed reference to a sibling named `name` (same parent).
    pub fn neighbor_reference(&self, name: &str) -> Option<Reference> {
        if self.is_file_scheme() {
            return Reference::from_path(&self.to_path()?.with_file_name(name)).ok();
        }
        let id = self.document_id()?;
        let root = extract_root(&id)?;
        let mut parts = split_path_segments(&id)?;
        if let Some(last) = parts.last_mut() {
            *last = name.to_string();
        }
        let neighbor_id = synthesize_identifier(&root, &parts.join("/"));
        self.rebuild_with_id(&neighbor_id)
    }

    /// Same authority (and tree, if any) with a different document id.
    pub(crate) fn rebuild_with_id(&self, document_id: &str) -> Option<Reference> {
        let built = if self.has_tree_document_id() {
            Reference::build_document_uri_using_tree(self, document_id)
        } else {
            Reference::build_document_uri(self.authority(), document_id)
        };
        built.ok()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reference").field(&self.url.as_str()).finish()
    }
}

impl FromStr for Reference {
    type Err = DocError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
