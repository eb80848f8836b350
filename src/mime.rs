//! Extension <-> MIME lookup.
//!
//! Lookups go through an injected [`MimeTable`] so tests can pin a fixture.
//! [`GuessMimeTable`] is the default and defers to `mime_guess`;
//! [`StaticMimeTable`] is a plain map used for fixtures and config overrides.

use std::collections::HashMap;

/// Generic binary type returned when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

pub trait MimeTable: Send + Sync {
    /// Lower-case extension without the dot -> MIME type.
    fn mime_for_extension(&self, extension: &str) -> Option<String>;

    /// MIME type -> extension without the dot.
    fn extension_for_mime(&self, mime_type: &str) -> Option<String>;
}

/// Types for which `mime_guess` knows several extensions but one is the
/// conventional choice. Its own lists are alphabetical.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("application/javascript", "js"),
    ("application/xml", "xml"),
    ("audio/midi", "mid"),
    ("audio/mp4", "m4a"),
    ("audio/mpeg", "mp3"),
    ("image/jpeg", "jpg"),
    ("image/svg+xml", "svg"),
    ("image/tiff", "tiff"),
    ("text/html", "html"),
    ("text/javascript", "js"),
    ("text/plain", "txt"),
    ("text/xml", "xml"),
    ("video/mp4", "mp4"),
    ("video/mpeg", "mpeg"),
    ("video/quicktime", "mov"),
];

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn normalize_mime(mime_type: &str) -> String {
    mime_type.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMimeTable;

impl MimeTable for GuessMimeTable {
    fn mime_for_extension(&self, extension: &str) -> Option<String> {
        mime_guess::from_ext(&normalize_extension(extension))
            .first_raw()
            .map(str::to_string)
    }

    /// Pinned preference first, else the first candidate that maps back to
    /// the same type, else the first candidate at all.
    fn extension_for_mime(&self, mime_type: &str) -> Option<String> {
        let mime_type = normalize_mime(mime_type);
        if mime_type == OCTET_STREAM {
            return None;
        }
        if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(m, _)| *m == mime_type) {
            return Some(ext.to_string());
        }
        let candidates = mime_guess::get_mime_extensions_str(&mime_type)?;
        candidates
            .iter()
            .find(|ext| mime_guess::from_ext(ext).first_raw() == Some(mime_type.as_str()))
            .or_else(|| candidates.first())
            .map(|ext| ext.to_string())
    }
}

/// Fixed mapping. The first extension registered for a type is the one
/// returned by `extension_for_mime`.
#[derive(Debug, Clone, Default)]
pub struct StaticMimeTable {
    by_extension: HashMap<String, String>,
    by_mime: HashMap<String, String>,
}

impl StaticMimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extension: &str, mime_type: &str) -> Self {
        self.insert(extension, mime_type);
        self
    }

    pub fn insert(&mut self, extension: &str, mime_type: &str) {
        let extension = normalize_extension(extension);
        let mime_type = normalize_mime(mime_type);
        self.by_mime
            .entry(mime_type.clone())
            .or_insert_with(|| extension.clone());
        self.by_extension.insert(extension, mime_type);
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }
}

impl MimeTable for StaticMimeTable {
    fn mime_for_extension(&self, extension: &str) -> Option<String> {
        self.by_extension.get(&normalize_extension(extension)).cloned()
    }

    fn extension_for_mime(&self, mime_type: &str) -> Option<String> {
        self.by_mime.get(&normalize_mime(mime_type)).cloned()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for StaticMimeTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut table = StaticMimeTable::new();
        for (ext, mime) in iter {
            table.insert(ext, mime);
        }
        table
    }
}

/// Overrides consulted first, then a fallback table.
pub struct LayeredMimeTable {
    overrides: StaticMimeTable,
    fallback: Box<dyn MimeTable>,
}

impl LayeredMimeTable {
    pub fn new(overrides: StaticMimeTable, fallback: Box<dyn MimeTable>) -> Self {
        Self { overrides, fallback }
    }
}

impl MimeTable for LayeredMimeTable {
    fn mime_for_extension(&self, extension: &str) -> Option<String> {
        self.overrides
            .mime_for_extension(extension)
            .or_else(|| self.fallback.mime_for_extension(extension))
    }

    fn extension_for_mime(&self, mime_type: &str) -> Option<String> {
        self.overrides
            .extension_for_mime(mime_type)
            .or_else(|| self.fallback.extension_for_mime(mime_type))
    }
}

/// MIME type for a display name, from the text after the last `.`
/// (case-insensitive). Falls back to [`OCTET_STREAM`].
pub fn infer_mime_type_from_name(table: &dyn MimeTable, name: &str) -> String {
    if let Some(dot) = name.rfind('.') {
        let extension = name[dot + 1..].to_ascii_lowercase();
        if let Some(mime) = table.mime_for_extension(&extension) {
            return mime;
        }
    }
    OCTET_STREAM.to_string()
}

/// Replace the trailing `.ext` of `name` (if any) with `.{extension}`.
pub fn swap_extension(name: &str, extension: &str) -> String {
    let stem = match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => &name[..dot],
        _ => name,
    };
    format!("{stem}.{extension}")
}
