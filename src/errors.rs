//! Typed error definitions for docnode.
//!
//! Node operations report almost every failure as absence or `false`; the
//! only `Err` that crosses a Node boundary is [`DocError::Unsupported`].
//! [`ProviderError`] is what provider collaborators return and is consumed
//! (logged, then folded into absence) inside the node layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    #[error("{operation} requires platform API level {required}, context reports {actual}")]
    Unsupported {
        operation: &'static str,
        required: u32,
        actual: u32,
    },

    #[error("Invalid reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied on {0}")]
    PermissionDenied(String),

    #[error("Provider transport failure: {0}")]
    Transport(String),
}
