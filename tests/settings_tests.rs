//! Integration tests for settings files.

use std::io::Write;

use h5attr::util::{Settings, SETTINGS_ENV};
use h5attr::Error;

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("h5attr.json");

    let settings = Settings {
        convert_byte_to_string: false,
        reference_cache_capacity: 16,
        max_display_items: 40,
    };
    settings.save_to(&path).expect("Failed to save");
    let loaded = Settings::load_from(&path).expect("Failed to load");
    assert_eq!(loaded, settings);
    assert!(!loaded.codec_options().convert_byte_to_string);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, r#"{{ "max_display_items": 12 }}"#).expect("Failed to write");

    let loaded = Settings::load_from(file.path()).expect("Failed to load");
    assert_eq!(loaded.max_display_items, 12);
    assert!(loaded.convert_byte_to_string);
    assert_eq!(loaded.reference_cache_capacity, Settings::default().reference_cache_capacity);
}

#[test]
fn test_invalid_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, "not json").expect("Failed to write");
    let err = Settings::load_from(file.path()).expect_err("garbage must fail");
    assert!(matches!(err, Error::InvalidSettings(_)), "got {:?}", err);

    let err = Settings::load_from("/nonexistent/h5attr.json").expect_err("missing file must fail");
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_from_environment() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("env.json");
    std::fs::write(&path, r#"{ "reference_cache_capacity": 3 }"#).expect("Failed to write");

    std::env::set_var(SETTINGS_ENV, &path);
    let loaded = Settings::load().expect("Failed to load");
    std::env::remove_var(SETTINGS_ENV);

    assert_eq!(loaded.reference_cache_capacity, 3);
    assert_eq!(Settings::load().expect("Failed to load"), Settings::default());
}
