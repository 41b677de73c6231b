// Unit tests for AppConfig validation

use crate::config::AppConfig;
use crate::error::config::ConfigError;

use log::LevelFilter;

/// **VALUE**: Verifies the defaults pass validation.
///
/// **BUG THIS CATCHES**: Would catch a default (URL, buffer, level) that the
/// validator rejects, which would make a fresh install fail to start.
#[test]
fn given_default_config_when_validated_then_passes() {
    let config = AppConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.application_url().unwrap().as_str(), "app:appshell");
    assert_eq!(config.log_level().unwrap(), LevelFilter::Info);
    assert_eq!(config.runner.event_buffer, 100);
    assert_eq!(config.providers.max_tracked, None);
}

/// **VALUE**: Verifies a zero provider bound is rejected.
///
/// **WHY THIS MATTERS**: A bound of zero would reject every connection, which is
/// never what an operator means; unbounded is spelled by omitting the key.
#[test]
fn given_zero_max_tracked_when_validated_then_returns_validation_error() {
    let mut config = AppConfig::default();
    config.providers.max_tracked = Some(0);

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

/// **VALUE**: Verifies a zero event buffer is rejected.
///
/// **BUG THIS CATCHES**: Would catch removal of the check; tokio panics on
/// a zero-capacity channel.
#[test]
fn given_zero_event_buffer_when_validated_then_returns_validation_error() {
    let mut config = AppConfig::default();
    config.runner.event_buffer = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn given_unparseable_url_when_validated_then_returns_validation_error() {
    let mut config = AppConfig::default();
    config.application.url = String::from("not a url");

    let result = config.validate();

    match result {
        Err(ConfigError::ValidationError { reason, .. }) => {
            assert!(reason.contains("not a url"));
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn given_unknown_log_level_when_validated_then_returns_validation_error() {
    let mut config = AppConfig::default();
    config.logging.level = String::from("loud");

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn given_future_version_when_validated_then_returns_validation_error() {
    let mut config = AppConfig::default();
    config.version = 2;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}
