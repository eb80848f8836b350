//! Storage context.
//!
//! The shared capability handle every [`crate::node::Node`] borrows: the
//! provider and grant collaborators, path primitives, MIME table, the
//! platform API level, and an optional diagnostic hook. The caller owns it
//! and keeps it alive for as long as its nodes.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::errors::DocError;
use crate::mime::{GuessMimeTable, MimeTable};
use crate::path_ops::{LocalPaths, PathPrimitives};
use crate::provider::{DocumentProvider, GrantChecker, NoProvider};
use crate::reference::Reference;

/// First API level with document providers.
pub const API_KITKAT: u32 = 19;
/// First API level with tree references and provider mutations.
pub const API_LOLLIPOP: u32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warn,
}

/// A failure the node layer swallowed, handed to the diagnostic hook.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub operation: &'static str,
    pub reference: Reference,
    pub message: String,
    pub severity: Severity,
}

pub type DiagnosticHook = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

pub struct StorageContext {
    provider: Arc<dyn DocumentProvider>,
    grants: Arc<dyn GrantChecker>,
    paths: Arc<dyn PathPrimitives>,
    mime: Arc<dyn MimeTable>,
    api_level: u32,
    hook: Option<DiagnosticHook>,
}

impl StorageContext {
    pub fn builder() -> StorageContextBuilder {
        StorageContextBuilder::default()
    }

    /// Direct paths only; provider references behave as missing documents.
    pub fn local() -> Self {
        Self::builder().build()
    }

    pub fn provider(&self) -> &dyn DocumentProvider {
        self.provider.as_ref()
    }

    pub fn grants(&self) -> &dyn GrantChecker {
        self.grants.as_ref()
    }

    pub fn paths(&self) -> &dyn PathPrimitives {
        self.paths.as_ref()
    }

    pub fn mime(&self) -> &dyn MimeTable {
        self.mime.as_ref()
    }

    pub fn api_level(&self) -> u32 {
        self.api_level
    }

    /// `Err(Unsupported)` when the context is below `required`.
    pub fn require_api(&self, operation: &'static str, required: u32) -> Result<(), DocError> {
        if self.api_level < required {
            return Err(DocError::Unsupported {
                operation,
                required,
                actual: self.api_level,
            });
        }
        Ok(())
    }

    /// Log a swallowed failure and pass it to the hook, if any.
    pub(crate) fn report(
        &self,
        operation: &'static str,
        reference: &Reference,
        severity: Severity,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match severity {
            Severity::Debug => debug!(operation, reference = %reference, "{message}"),
            Severity::Warn => warn!(operation, reference = %reference, "{message}"),
        }
        if let Some(hook) = &self.hook {
            hook(&Diagnostic {
                operation,
                reference: reference.clone(),
                message,
                severity,
            });
        }
    }
}

impl fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageContext")
            .field("api_level", &self.api_level)
            .field("diagnostic_hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

pub struct StorageContextBuilder {
    provider: Arc<dyn DocumentProvider>,
    grants: Arc<dyn GrantChecker>,
    paths: Arc<dyn PathPrimitives>,
    mime: Arc<dyn MimeTable>,
    api_level: u32,
    hook: Option<DiagnosticHook>,
}

impl Default for StorageContextBuilder {
    fn default() -> Self {
        Self {
            provider: Arc::new(NoProvider),
            grants: Arc::new(NoProvider),
            paths: Arc::new(LocalPaths),
            mime: Arc::new(GuessMimeTable),
            api_level: API_LOLLIPOP,
            hook: None,
        }
    }
}

impl StorageContextBuilder {
    pub fn provider(mut self, provider: Arc<dyn DocumentProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn grants(mut self, grants: Arc<dyn GrantChecker>) -> Self {
        self.grants = grants;
        self
    }

    /// One object serving as both provider and grant checker.
    pub fn document_source<P>(self, source: Arc<P>) -> Self
    where
        P: DocumentProvider + GrantChecker + 'static,
    {
        self.provider(source.clone()).grants(source)
    }

    pub fn paths(mut self, paths: Arc<dyn PathPrimitives>) -> Self {
        self.paths = paths;
        self
    }

    pub fn mime_table(mut self, mime: Arc<dyn MimeTable>) -> Self {
        self.mime = mime;
        self
    }

    pub fn api_level(mut self, api_level: u32) -> Self {
        self.api_level = api_level;
        self
    }

    /// API level and MIME overrides from loaded settings.
    pub fn settings(self, settings: &Settings) -> Self {
        self.api_level(settings.api_level)
            .mime_table(Arc::new(settings.mime_table()))
    }

    pub fn diagnostic_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> StorageContext {
        StorageContext {
            provider: self.provider,
            grants: self.grants,
            paths: self.paths,
            mime: self.mime,
            api_level: self.api_level,
            hook: self.hook,
        }
    }
}
