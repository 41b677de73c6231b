use app_core::config::{AppConfig, default_config_dir};
use app_core::error::ConfigError;

use std::fs;
use std::path::PathBuf;

use log::LevelFilter;
use serial_test::serial;
use tempfile::TempDir;

const CONFIG_DIR_ENV: &str = "APPSHELL_CONFIG_DIR";

/// Tests that a missing config file yields defaults.
///
/// **VALUE**: First run works without any setup.
///
/// **BUG THIS CATCHES**: Would catch load failing with a read error when the
/// file simply does not exist yet.
#[test]
fn given_empty_dir_when_loaded_then_defaults_returned() {
    // GIVEN: An empty config directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN: Config is loaded
    let config = AppConfig::load(dir.path()).expect("load should succeed");

    // THEN: Defaults come back
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.application_url().unwrap().as_str(), "app:appshell");
    assert_eq!(config.log_level().unwrap(), LevelFilter::Info);
}

/// Tests that a saved config loads back and leaves no temp file behind.
///
/// **BUG THIS CATCHES**: Would catch the atomic rename being skipped, or the
/// optional provider limit not surviving the round trip.
#[test]
fn given_saved_config_when_loaded_then_values_survive_and_no_temp_file_left() {
    // GIVEN: A customised config saved to a nested, not yet existing directory
    let dir = TempDir::new().expect("temp dir");
    let config_dir = dir.path().join("nested").join("appshell");
    let mut config = AppConfig::default();
    config.application.url = String::from("app:echo");
    config.application.args = vec![String::from("--loud")];
    config.providers.max_tracked = Some(16);
    config.logging.level = String::from("debug");
    config.save(&config_dir).expect("save should succeed");

    // WHEN: It is loaded again
    let loaded = AppConfig::load(&config_dir).expect("load should succeed");

    // THEN: The values match and only app.toml is on disk
    assert_eq!(loaded, config);
    let files: Vec<_> = fs::read_dir(&config_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(files, vec![std::ffi::OsString::from("app.toml")]);
}

#[test]
fn given_partial_file_when_loaded_then_missing_sections_defaulted() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("app.toml"),
        "[application]\nurl = \"app:partial\"\n",
    )
    .unwrap();

    let config = AppConfig::load(dir.path()).expect("load should succeed");

    assert_eq!(config.application.url, "app:partial");
    assert_eq!(config.runner.event_buffer, 100);
    assert_eq!(config.providers.max_tracked, None);
}

/// Tests that a corrupt file is reported instead of silently replaced.
///
/// **BUG THIS CATCHES**: Would catch load falling back to defaults and then
/// a later save overwriting the user's file.
#[test]
fn given_corrupt_file_when_loaded_then_parse_error() {
    // GIVEN: A file that is not TOML
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("app.toml"), "this is = = not toml").unwrap();

    // WHEN: Config is loaded
    let result = AppConfig::load(dir.path());

    // THEN: A parse error names the file
    match result {
        Err(ConfigError::ParseError { path, .. }) => {
            assert_eq!(path, dir.path().join("app.toml"));
        }
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

#[test]
fn given_out_of_range_value_in_file_when_loaded_then_validation_error() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("app.toml"), "[runner]\nevent_buffer = 0\n").unwrap();

    let result = AppConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn given_invalid_config_when_saved_then_nothing_written() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = AppConfig::default();
    config.logging.level = String::from("chatty");

    let result = config.save(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    assert!(!dir.path().join("app.toml").exists());
}

/// Tests that the environment override picks the config directory.
///
/// **VALUE**: Tests and packaged builds can point the application at their
/// own directory.
///
/// **BUG THIS CATCHES**: Would catch the override being ignored in favour of
/// the platform directory.
#[test]
#[serial]
fn given_env_override_when_resolving_config_dir_then_override_used() {
    // GIVEN: The override is set
    let dir = TempDir::new().expect("temp dir");
    // SAFETY: serialised with every other test touching this variable.
    unsafe { std::env::set_var(CONFIG_DIR_ENV, dir.path()) };

    // WHEN: The config directory is resolved
    let resolved = default_config_dir();
    unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

    // THEN: The override wins
    assert_eq!(resolved.expect("override should resolve"), PathBuf::from(dir.path()));
}

#[test]
#[serial]
fn given_no_override_when_resolving_config_dir_then_ends_with_app_dir_name() {
    // SAFETY: serialised with every other test touching this variable.
    unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

    if let Ok(resolved) = default_config_dir() {
        assert!(resolved.ends_with("appshell"));
    }
}
