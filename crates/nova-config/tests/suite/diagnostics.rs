use nova_config::{ConfigError, ConfigWarning, NovaConfig};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[completion]
camel_case = true
max_result = 10

[search]
erasur = false
"#;

    let (config, diagnostics) =
        NovaConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert!(config.completion.camel_case);
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["completion.max_result", "search.erasur", "typo"]
    );
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn invalid_values_are_warnings() {
    let text = r#"
[completion]
max_results = 0

[logging]
level = "nova.search=chatty"
"#;

    let (config, diagnostics) =
        NovaConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(config.completion.max_results(), None);
    assert!(diagnostics.unknown_keys.is_empty());
    assert_eq!(diagnostics.warnings.len(), 2);
    assert!(matches!(
        &diagnostics.warnings[1],
        ConfigWarning::LoggingLevelInvalid { value, .. } if value == "nova.search=chatty"
    ));
}

#[test]
fn loads_from_a_file() {
    let file = NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), "[logging]\njson = true\nstderr = false\n").expect("write config");

    let config = NovaConfig::load_from_path(file.path()).expect("config should load");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = NovaConfig::load_from_path(dir.path().join("absent.toml")).expect_err("no file");
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), "[completion\n").expect("write config");
    let err = NovaConfig::load_from_path_with_diagnostics(file.path()).expect_err("bad toml");
    assert!(matches!(err, ConfigError::Toml(_)));
}
