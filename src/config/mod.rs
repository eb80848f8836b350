//! Configuration.
//! Settings types, default paths, and XML loading.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{LogLevel, Settings};
pub use xml::{create_template_config, load_settings, load_settings_from_xml_path};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DOCNODE_CONFIG";
