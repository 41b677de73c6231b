//! Serialized delivery of host events to one application.
//!
//! # Architecture
//!
//! Uses the actor pattern: the [`Application`] is moved into a dedicated
//! tokio task and every host event reaches it through an mpsc channel.
//!
//! - Events are processed one at a time, so a quit can never interleave with
//!   an accept that is half done
//! - Events still queued when the application quits are drained and their
//!   endpoints closed, so no provider outlives quit
//! - The task resolves to the quit result

mod handle;

pub use handle::RunnerHandle;

use crate::application::{Application, ApplicationDelegate, ShutdownReport};
use crate::error::lifecycle::LifecycleError;
use crate::handle::ProviderEndpoint;
use crate::pipe::PipeEndpoint;
use crate::service_provider::ProviderId;

use std::fmt;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

/// Result the application task resolves to.
pub type RunOutcome = Result<ShutdownReport, LifecycleError>;

pub type AcceptReply = oneshot::Sender<Result<ProviderId, LifecycleError>>;

/// Events the host delivers to an application.
pub enum HostEvent {
    /// Run the `initialize` hook with process arguments.
    Initialize(Vec<String>),

    /// A peer connected; track it and run the `accept_connection` hook.
    AcceptConnection {
        url: Url,
        endpoint: Box<dyn ProviderEndpoint>,
        reply: Option<AcceptReply>,
    },

    /// A peer asked a tracked provider for a service.
    ServiceRequest {
        provider: ProviderId,
        interface_name: String,
        pipe: PipeEndpoint,
    },

    /// A peer went away; stop tracking its provider.
    ProviderDisconnected(ProviderId),

    /// Shut the application down.
    Quit,
}

impl HostEvent {
    /// Release whatever an undeliverable event carries.
    pub(crate) fn discard(self) {
        match self {
            HostEvent::AcceptConnection {
                url,
                mut endpoint,
                reply,
            } => {
                warn!("Discarding connection from {url}: application is not running");
                if let Err(e) = endpoint.close() {
                    warn!("Failed to close discarded connection from {url}: {e}");
                }
                if let Some(reply) = reply {
                    let refused = Err(LifecycleError::terminated(format!(
                        "Connection from {url} arrived after quit"
                    )));
                    if reply.send(refused).is_err() {
                        debug!("Accept reply receiver already dropped");
                    }
                }
            }
            other => debug!("Discarding {other:?}"),
        }
    }
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::Initialize(args) => f.debug_tuple("Initialize").field(args).finish(),
            HostEvent::AcceptConnection { url, .. } => f
                .debug_struct("AcceptConnection")
                .field("url", &url.as_str())
                .finish_non_exhaustive(),
            HostEvent::ServiceRequest {
                provider,
                interface_name,
                ..
            } => f
                .debug_struct("ServiceRequest")
                .field("provider", provider)
                .field("interface_name", interface_name)
                .finish_non_exhaustive(),
            HostEvent::ProviderDisconnected(id) => {
                f.debug_tuple("ProviderDisconnected").field(id).finish()
            }
            HostEvent::Quit => write!(f, "Quit"),
        }
    }
}

/// Move `application` into its own task.
///
/// `event_buffer` bounds the number of undelivered events; senders wait when
/// it is full.
pub fn spawn_application<D>(
    application: Application<D>,
    event_buffer: usize,
) -> (RunnerHandle, JoinHandle<RunOutcome>)
where
    D: ApplicationDelegate + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
    let task = tokio::spawn(application_actor(event_rx, application));
    info!("Application actor spawned");
    (RunnerHandle::new(event_tx), task)
}

/// The application actor task.
///
/// Owns the application and processes events sequentially until it quits.
async fn application_actor<D>(
    mut event_rx: mpsc::Receiver<HostEvent>,
    mut application: Application<D>,
) -> RunOutcome
where
    D: ApplicationDelegate,
{
    info!("Application actor started for {}", application.url());

    let outcome = loop {
        let Some(event) = event_rx.recv().await else {
            warn!(
                "All runner handles dropped before quit, shutting down {}",
                application.url()
            );
            break application.quit();
        };

        match event {
            HostEvent::Initialize(args) => {
                if let Err(e) = application.initialize(&args) {
                    warn!("Initialize failed: {e}");
                }
            }
            HostEvent::AcceptConnection {
                url,
                endpoint,
                reply,
            } => {
                let result = application.accept_connection(url, endpoint);
                if let Err(ref e) = result {
                    warn!("Accept failed: {e}");
                }
                if let Some(reply) = reply {
                    if reply.send(result).is_err() {
                        debug!("Accept reply receiver already dropped");
                    }
                }
            }
            HostEvent::ServiceRequest {
                provider,
                interface_name,
                pipe,
            } => {
                if let Err(e) = application.handle_service_request(provider, &interface_name, pipe)
                {
                    warn!("Service request for '{interface_name}' failed: {e}");
                }
            }
            HostEvent::ProviderDisconnected(id) => {
                if let Err(e) = application.release_provider(id) {
                    warn!("Releasing provider {id} failed: {e}");
                }
            }
            HostEvent::Quit => break application.quit(),
        }

        if application.quit_requested() {
            info!("Delegate requested quit");
            break application.quit();
        }
    };

    event_rx.close();
    while let Ok(event) = event_rx.try_recv() {
        event.discard();
    }

    match &outcome {
        Ok(report) => info!(
            "Application actor stopped after closing {} provider(s)",
            report.providers_closed
        ),
        Err(e) => error!("Application actor stopped with errors: {e}"),
    }

    outcome
}
