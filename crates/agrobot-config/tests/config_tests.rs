// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Agrobot configuration system.

use std::io::Write;

use agrobot_config::diagnostic::ConfigError;
use agrobot_config::model::AgrobotConfig;
use agrobot_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_agrobot_config() {
    let toml = r#"
[agent]
name = "FarmBot"
log_level = "debug"

[storage]
database_path = "/tmp/agrobot-test.db"
wal_mode = false

[dialogue]
product_limit = 5
location_radius_m = 2500.0
location_limit = 4
max_attempts = 2
currency = "Kenyan Shillings"
image_base_url = "https://cdn.example.com"

[matching]
limit = 10
price_tolerance = 0.25
quantity_tolerance = 0.25
same_measurement = true
proximity_radius_m = 5000.0
exclude_self = true

[seed]
default_measurement = "MEASUREMENT_CRATE"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "FarmBot");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/agrobot-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.dialogue.product_limit, 5);
    assert_eq!(config.dialogue.location_radius_m, 2500.0);
    assert_eq!(config.dialogue.location_limit, 4);
    assert_eq!(config.dialogue.max_attempts, 2);
    assert_eq!(config.dialogue.currency, "Kenyan Shillings");
    assert_eq!(
        config.dialogue.image_base_url.as_deref(),
        Some("https://cdn.example.com")
    );
    assert_eq!(config.matching.limit, 10);
    assert_eq!(config.matching.price_tolerance, Some(0.25));
    assert_eq!(config.matching.quantity_tolerance, Some(0.25));
    assert!(config.matching.same_measurement);
    assert_eq!(config.matching.proximity_radius_m, Some(5000.0));
    assert!(config.matching.exclude_self);
    assert_eq!(
        config.seed.default_measurement.as_deref(),
        Some("MEASUREMENT_CRATE")
    );
}

/// Empty TOML falls back to the defaults.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.agent.name, "Agrobot");
    assert_eq!(config.agent.log_level, "info");
    assert_eq!(config.storage.database_path, "agrobot.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.dialogue.currency, "US Dollars");
    assert!(config.dialogue.image_base_url.is_none());
    assert_eq!(config.matching.limit, 8);
}

/// An unknown key is reported with a suggestion and a span in the inline source.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[dialogue]
max_atempts = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "max_atempts");
            assert_eq!(suggestion.as_deref(), Some("max_attempts"));
            assert!(valid_keys.contains("location_radius_m"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// A value of the wrong type is reported as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[matching]
exclude_self = "yes"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("exclude_self"))),
        "got {errors:?}"
    );
}

/// Semantic errors surface after deserialization succeeds.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[dialogue]
max_attempts = 0

[matching]
price_tolerance = 2.0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Dot-notation overrides (what the env provider produces) win over TOML.
#[test]
fn dotted_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: AgrobotConfig = Figment::new()
        .merge(Serialized::defaults(AgrobotConfig::default()))
        .merge(Toml::string("[dialogue]\nmax_attempts = 5\n"))
        .merge(("dialogue.max_attempts", 2))
        .extract()
        .expect("should merge override");

    assert_eq!(config.dialogue.max_attempts, 2);
}

/// Missing config files are skipped by Figment.
#[test]
fn missing_config_files_silently_skipped() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/agrobot.toml"))
        .expect("missing file should be skipped");
    assert_eq!(config.agent.name, "Agrobot");
}

/// An explicit config file is loaded and validated.
#[test]
#[serial_test::serial]
fn explicit_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[agent]\nname = \"FileBot\"\n\n[matching]\nexclude_self = true").unwrap();

    let config = load_and_validate_path(file.path()).expect("file should load");
    assert_eq!(config.agent.name, "FileBot");
    assert!(config.matching.exclude_self);
}

/// AGROBOT_ environment variables override file values.
#[test]
#[serial_test::serial]
fn env_var_overrides_file_value() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[dialogue]\nmax_attempts = 5").unwrap();

    // SAFETY: serialized with the other env-sensitive tests in this file.
    unsafe { std::env::set_var("AGROBOT_DIALOGUE_MAX_ATTEMPTS", "2") };
    let result = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("AGROBOT_DIALOGUE_MAX_ATTEMPTS") };

    let config = result.expect("env override should load");
    assert_eq!(config.dialogue.max_attempts, 2);
}
