//! XML config is parsed without touching user state.

use std::fs;
use tempfile::tempdir;

use docnode::config::{create_template_config, load_settings_from_xml_path};
use docnode::mime::MimeTable;
use docnode::{API_KITKAT, API_LOLLIPOP, LogLevel};

#[test]
fn reads_config_xml_and_applies_values() {
    let td = tempdir().expect("create tempdir");
    let cfg_path = td.path().join("config.xml");
    let log_file = td.path().join("docnode.log");

    let xml = format!(
        r#"
<config>
  <api_level>{}</api_level>
  <log_level>info</log_level>
  <log_file>{}</log_file>
  <mime extension="heic">image/heic</mime>
</config>
"#,
        API_KITKAT,
        log_file.display()
    );
    fs::write(&cfg_path, xml).expect("write config.xml");

    let settings = load_settings_from_xml_path(&cfg_path).expect("load_settings_from_xml_path");
    assert_eq!(settings.api_level, API_KITKAT, "api_level mismatch");
    assert_eq!(settings.log_level, LogLevel::Info, "log_level mismatch");
    assert_eq!(settings.log_file.as_deref(), Some(log_file.as_path()), "log_file mismatch");

    // overrides win over the built-in table
    let table = settings.mime_table();
    assert_eq!(table.mime_for_extension("heic").as_deref(), Some("image/heic"));
    assert_eq!(table.mime_for_extension("png").as_deref(), Some("image/png"));
}

#[test]
fn missing_fields_take_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config></config>").unwrap();

    let settings = load_settings_from_xml_path(&cfg_path).unwrap();
    assert_eq!(settings.api_level, API_LOLLIPOP);
    assert_eq!(settings.log_level, LogLevel::Normal);
    assert!(settings.log_file.is_none());
    assert!(settings.mime_overrides.is_empty());
}

#[test]
fn malformed_or_unknown_xml_is_an_error() {
    let td = tempdir().unwrap();
    let bad = td.path().join("bad.xml");
    fs::write(&bad, "<config><log_level>debug</config>").unwrap();
    assert!(load_settings_from_xml_path(&bad).is_err());

    let unknown = td.path().join("unknown.xml");
    fs::write(&unknown, "<config><download_base>/x</download_base></config>").unwrap();
    let err = load_settings_from_xml_path(&unknown).unwrap_err();
    assert!(format!("{err:#}").contains("unknown.xml"), "error should name the file: {err:#}");
}

#[test]
fn template_config_loads_back() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("nested").join("config.xml");

    create_template_config(&cfg_path).expect("create template");
    let settings = load_settings_from_xml_path(&cfg_path).expect("template parses");
    assert_eq!(settings.api_level, API_LOLLIPOP);
    assert_eq!(settings.log_level, LogLevel::Normal);

    // never overwritten
    assert!(create_template_config(&cfg_path).is_err());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&cfg_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
