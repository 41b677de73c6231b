//! One end-to-end run of the echo application over loopback handles.

use crate::echo::{ECHO_SERVICE, EchoApplication, EchoStats};
use crate::error::EchoError;
use crate::loopback::{LoopbackBridge, LoopbackShell, loopback_connection};

use app_core::config::AppConfig;
use app_core::pipe::message_pipe;
use app_core::runner::spawn_application;
use app_core::{Application, ShutdownReport};

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::timeout;
use url::Url;

const CALLER_URL: &str = "app:loopback-caller";
const ECHO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct SessionSummary {
    pub reply: Vec<u8>,
    pub report: ShutdownReport,
    pub stats: EchoStats,
    pub caller_closed: bool,
}

/// Run the configured application, echo `message` through it once and quit.
///
/// # Errors
///
/// Returns [`EchoError`] if the config is invalid, any lifecycle step fails,
/// or the reply does not match what was sent.
pub async fn run_session(config: &AppConfig, message: &[u8]) -> Result<SessionSummary, EchoError> {
    let url = config.application_url()?;
    let stats = EchoStats::default();

    let (shell, _outbound) = LoopbackShell::new();
    let (bridge, quit_signal) = LoopbackBridge::new();
    let application = Application::new(
        Box::new(shell),
        Box::new(bridge),
        url,
        EchoApplication::new(stats.clone()),
    )
    .with_max_providers(config.providers.max_tracked);

    let (runner, task) = spawn_application(application, config.runner.event_buffer);
    runner.initialize(config.application.args.clone()).await?;

    let caller_url = Url::parse(CALLER_URL).map_err(|e| EchoError::Echo {
        message: format!("Invalid caller URL: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let (endpoint, caller) = loopback_connection(CALLER_URL);
    let provider = runner
        .accept_connection(caller_url, Box::new(endpoint))
        .await?;

    let (mut local, remote) = message_pipe();
    runner.request_service(provider, ECHO_SERVICE, remote).await?;
    local.send(message)?;

    let reply = timeout(ECHO_TIMEOUT, local.recv())
        .await
        .map_err(|_| EchoError::Session {
            message: format!("No echo within {ECHO_TIMEOUT:?}"),
            location: ErrorLocation::from(Location::caller()),
        })?
        .ok_or_else(|| EchoError::Session {
            message: String::from("Echo pipe closed before replying"),
            location: ErrorLocation::from(Location::caller()),
        })?;
    debug!("Echo replied with {} byte(s)", reply.len());

    if reply != message {
        return Err(EchoError::Session {
            message: String::from("Echo reply differs from the request"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    runner.quit().await?;

    let report = task.await.map_err(|e| EchoError::Echo {
        message: format!("Application task failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })??;

    if quit_signal.await.is_err() {
        warn!("Host bridge was dropped without signalling quit");
    }

    info!(
        "Session finished: {} connection(s), {} pipe(s) served",
        stats.connections(),
        stats.pipes_served()
    );

    Ok(SessionSummary {
        reply,
        report,
        caller_closed: caller.is_closed(),
        stats,
    })
}
