use app_core::config::AppConfig;

use echo_app::error::EchoError;
use echo_app::session::run_session;

// ============================================================================
// Integration tests for a full echo session over loopback handles
// These drive config -> runner -> application -> echo task -> quit together
// ============================================================================

/// **VALUE**: Tests the whole application lifecycle in one run.
///
/// **WHY THIS MATTERS**: This is what the binary does; each piece is tested on
/// its own elsewhere, but only this proves they fit together.
///
/// **BUG THIS CATCHES**: Would catch the runner, delegate and loopback host
/// disagreeing on service names or shutdown order.
#[tokio::test]
async fn given_default_config_when_session_runs_then_echo_round_trips_and_caller_released() {
    // GIVEN: Default configuration
    let config = AppConfig::default();

    // WHEN: A session echoes one message
    let summary = run_session(&config, b"ping")
        .await
        .expect("session should succeed");

    // THEN: The reply matches and quit released the caller
    assert_eq!(summary.reply, b"ping".to_vec());
    assert_eq!(summary.report.providers_closed, 1);
    assert_eq!(summary.stats.connections(), 1);
    assert_eq!(summary.stats.pipes_served(), 1);
    assert!(summary.caller_closed);
}

/// **VALUE**: A bad application URL stops the session before anything is
/// spawned.
///
/// **BUG THIS CATCHES**: Would catch the URL error being reported as a
/// lifecycle failure, or the session starting with a placeholder URL.
#[tokio::test]
async fn given_invalid_url_in_config_when_session_runs_then_config_error() {
    // GIVEN: A config whose application URL has no scheme
    let mut config = AppConfig::default();
    config.application.url = String::from("no scheme here");

    // WHEN: A session runs
    let result = run_session(&config, b"ping").await;

    // THEN: It fails with a config error
    assert!(matches!(result, Err(EchoError::Config { .. })));
}

/// **VALUE**: A connection limit that ends the app before the echo request
/// surfaces as an error instead of hanging.
///
/// **BUG THIS CATCHES**: Would catch a request queued after quit never
/// being released, leaving the caller waiting forever.
#[tokio::test]
async fn given_limit_of_one_connection_when_session_runs_then_fails_without_hanging() {
    // GIVEN: An application that quits after its first connection
    let mut config = AppConfig::default();
    config.application.args = vec![
        String::from(echo_app::echo::MAX_CONNECTIONS_FLAG),
        String::from("1"),
    ];

    // WHEN: A session runs
    let result = run_session(&config, b"ping").await;

    // THEN: It fails cleanly
    assert!(matches!(
        result,
        Err(EchoError::Core { .. }) | Err(EchoError::Session { .. })
    ));
}
