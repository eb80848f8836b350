//! Core library for `docnode`.
//!
//! One node type over two storage models: direct filesystem paths
//! (`file://`) and provider-mediated document trees
//! (`content://<authority>/tree/<id>/document/<id>`). Callers list, create,
//! delete, rename and inspect nodes without branching on which model a
//! reference belongs to.
//!
//! ```no_run
//! use docnode::{Node, StorageContext};
//!
//! let ctx = StorageContext::local();
//! let dir = Node::from_path(&ctx, std::path::Path::new("/tmp")).unwrap();
//! for child in dir.list_children() {
//!     println!("{} ({} bytes)", child.name(), child.length());
//! }
//! ```
//!
//! Provider access goes through the [`provider::DocumentProvider`] and
//! [`provider::GrantChecker`] collaborators installed on a
//! [`StorageContext`]; [`provider::MemoryProvider`] is an in-process one.

pub mod config;
pub mod context;
pub mod doc_id;
pub mod errors;
pub mod logging;
pub mod mime;
pub mod node;
pub mod path_ops;
pub mod platform;
pub mod provider;
pub mod reference;

pub use config::{LogLevel, Settings, load_settings};
pub use context::{API_KITKAT, API_LOLLIPOP, Diagnostic, Severity, StorageContext, StorageContextBuilder};
pub use errors::{DocError, ProviderError};
pub use mime::{MimeTable, infer_mime_type_from_name};
pub use node::{Node, Snapshot};
pub use path_ops::{LocalPaths, PathPrimitives, PathStat};
pub use provider::{DocumentProvider, GrantChecker, MemoryProvider};
pub use reference::Reference;
