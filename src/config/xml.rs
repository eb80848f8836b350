//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Creates a secure template on request.
//!
//! Unknown XML elements are a hard error so misconfigurations surface early.

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::paths::{config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{LogLevel, Settings};
use crate::context::API_LOLLIPOP;
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "api_level", default, deserialize_with = "de_u32_trimmed_opt")]
    api_level: Option<u32>,
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "mime", default)]
    mime: Vec<XmlMime>,
}

/// `<mime extension="cr2">image/x-canon-cr2</mime>`
#[derive(Debug, Deserialize)]
struct XmlMime {
    #[serde(rename = "@extension")]
    extension: String,
    #[serde(rename = "$text")]
    mime_type: String,
}

// Trims surrounding whitespace; unparsable values fall back to the default.
fn de_u32_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u32>().ok()))
}

fn xml_to_settings(parsed: XmlConfig) -> Settings {
    let mut settings = Settings::default();

    if let Some(level) = parsed.api_level {
        settings.api_level = level;
    }

    if let Some(s) = parsed.log_level.as_deref() {
        match s.trim().parse::<LogLevel>() {
            Ok(level) => settings.log_level = level,
            Err(e) => warn!("{e}; keeping '{}'", settings.log_level),
        }
    }

    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            settings.log_file = Some(PathBuf::from(trimmed));
        }
    }

    for entry in parsed.mime {
        let extension = entry.extension.trim();
        let mime_type = entry.mime_type.trim();
        if extension.is_empty() || mime_type.is_empty() {
            debug!("skipping incomplete <mime> entry ({extension:?} -> {mime_type:?})");
            continue;
        }
        settings.mime_overrides.insert(extension, mime_type);
    }

    settings
}

/// Load Settings from a specific XML file.
pub fn load_settings_from_xml_path(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_settings(parsed))
}

/// Resolve and load settings.
///
/// `DOCNODE_CONFIG` wins and must point at a readable file. Otherwise the
/// platform default path is used; a missing default file means defaults.
pub fn load_settings() -> Result<Settings> {
    if let Some(path) = config_path_from_env() {
        if !path.is_file() {
            bail!(
                "DOCNODE_CONFIG points to '{}', which is not a readable file",
                path.display()
            );
        }
        debug!("loading config from DOCNODE_CONFIG: {}", path.display());
        return load_settings_from_xml_path(&path);
    }

    let path = default_config_path().context("resolve default config path")?;
    if !path.exists() {
        debug!("no config at {}; using defaults", path.display());
        return Ok(Settings::default());
    }
    debug!("loading config from {}", path.display());
    load_settings_from_xml_path(&path)
}

/// Create a commented template config and its parent directory.
/// Refuses symlinked ancestors; the file is written atomically with 0600.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/docnode.log".into());

    let content = format!(
        "<!--\n  docnode configuration (XML)\n\n  Fields:\n    api_level   -> platform API level the storage context reports ({lollipop} enables provider mutations)\n    log_level   -> quiet | normal | info | debug\n    log_file    -> path to log file (optional; empty disables file logging)\n    mime        -> extension override, repeatable: <mime extension=\"cr2\">image/x-canon-cr2</mime>\n-->\n<config>\n  <api_level>{lollipop}</api_level>\n  <log_level>normal</log_level>\n  <log_file>{suggested_log}</log_file>\n</config>\n",
        lollipop = API_LOLLIPOP,
    );

    write_config_secure_new_0600(path, content.as_bytes())?;

    info!("Created template config at {}", path.display());
    Ok(())
}
