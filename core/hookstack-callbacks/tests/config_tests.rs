mod common;

use common::init_tracing;
use hookstack_callbacks::{AroundPolicy, CallbackConfig, CallbackError};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn defaults_halt_and_detect_cycles() {
    let config = CallbackConfig::default();
    assert_eq!(config.unyielded_around, AroundPolicy::Halt);
    assert!(config.detect_cycles);
}

#[test]
fn parses_callbacks_table() {
    let config = CallbackConfig::from_toml_str(
        r#"
        [callbacks]
        unyielded-around = "continue"
        detect-cycles = false
        "#,
    )
    .unwrap();
    assert_eq!(
        config,
        CallbackConfig {
            unyielded_around: AroundPolicy::Continue,
            detect_cycles: false,
        }
    );
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let config = CallbackConfig::from_toml_str("[callbacks]\ndetect-cycles = false\n").unwrap();
    assert_eq!(config.unyielded_around, AroundPolicy::Halt);
    assert!(!config.detect_cycles);

    let config = CallbackConfig::from_toml_str("[storage]\npath = \"/tmp\"\n").unwrap();
    assert_eq!(config, CallbackConfig::default());
}

#[test]
fn rejects_unknown_policy() {
    let err = CallbackConfig::from_toml_str("[callbacks]\nunyielded-around = \"retry\"\n")
        .unwrap_err();
    assert!(matches!(err, CallbackError::Config(_)));
    assert!(err.to_string().starts_with("invalid configuration"));
}

#[test]
fn load_from_reads_file() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[callbacks]\nunyielded-around = \"continue\"").unwrap();

    let config = CallbackConfig::load_from(file.path());
    assert_eq!(config.unyielded_around, AroundPolicy::Continue);
    assert!(config.detect_cycles);
}

#[test]
fn load_from_missing_file_uses_defaults() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = CallbackConfig::load_from(&dir.path().join("callbacks.toml"));
    assert_eq!(config, CallbackConfig::default());
}

#[test]
fn load_from_malformed_file_uses_defaults() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[callbacks\nunyielded-around = ").unwrap();

    let config = CallbackConfig::load_from(file.path());
    assert_eq!(config, CallbackConfig::default());
}

#[test]
fn round_trips_through_toml() {
    let config = CallbackConfig {
        unyielded_around: AroundPolicy::Continue,
        detect_cycles: false,
    };
    let text = format!("[callbacks]\n{}", toml::to_string(&config).unwrap());
    assert_eq!(CallbackConfig::from_toml_str(&text).unwrap(), config);
}
