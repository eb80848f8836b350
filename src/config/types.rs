//! Core configuration types.
//! - Settings holds runtime settings with defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::context::API_LOLLIPOP;
use crate::mime::{GuessMimeTable, LayeredMimeTable, StaticMimeTable};

/// Program-defined verbosity levels exposed to config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime settings for a storage context.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Platform API level the context reports
    pub api_level: u32,
    /// Log verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Extension -> MIME entries consulted before the built-in table
    pub mime_overrides: StaticMimeTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_level: API_LOLLIPOP,
            log_level: LogLevel::Normal,
            log_file: None,
            mime_overrides: StaticMimeTable::new(),
        }
    }
}

impl Settings {
    /// Overrides layered over the `mime_guess` table.
    pub fn mime_table(&self) -> LayeredMimeTable {
        LayeredMimeTable::new(self.mime_overrides.clone(), Box::new(GuessMimeTable))
    }
}
