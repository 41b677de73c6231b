//! Cloneable sender side of a running application.

use crate::error::lifecycle::LifecycleError;
use crate::handle::ProviderEndpoint;
use crate::pipe::PipeEndpoint;
use crate::runner::HostEvent;
use crate::service_provider::ProviderId;

use tokio::sync::{mpsc, oneshot};
use url::Url;

/// Handle to an application running under [`spawn_application`](super::spawn_application).
///
/// This type is `Clone`; all clones feed the same application. The
/// application quits on its own once every clone is dropped.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    event_tx: mpsc::Sender<HostEvent>,
}

impl RunnerHandle {
    pub(crate) fn new(event_tx: mpsc::Sender<HostEvent>) -> Self {
        Self { event_tx }
    }

    /// Deliver an event.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::RunnerStopped`] if the application task has
    /// finished. An undelivered connection is closed before returning.
    pub async fn send(&self, event: HostEvent) -> Result<(), LifecycleError> {
        self.event_tx.send(event).await.map_err(|e| {
            e.0.discard();
            LifecycleError::runner_stopped("Application task is no longer running")
        })
    }

    pub async fn initialize(&self, args: Vec<String>) -> Result<(), LifecycleError> {
        self.send(HostEvent::Initialize(args)).await
    }

    /// Deliver a connection and wait for the provider id it was tracked as.
    pub async fn accept_connection(
        &self,
        url: Url,
        endpoint: Box<dyn ProviderEndpoint>,
    ) -> Result<ProviderId, LifecycleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HostEvent::AcceptConnection {
            url,
            endpoint,
            reply: Some(reply_tx),
        })
        .await?;

        reply_rx
            .await
            .map_err(|_| LifecycleError::runner_stopped("Application task dropped the accept reply"))?
    }

    pub async fn request_service(
        &self,
        provider: ProviderId,
        interface_name: impl Into<String>,
        pipe: PipeEndpoint,
    ) -> Result<(), LifecycleError> {
        self.send(HostEvent::ServiceRequest {
            provider,
            interface_name: interface_name.into(),
            pipe,
        })
        .await
    }

    pub async fn provider_disconnected(&self, provider: ProviderId) -> Result<(), LifecycleError> {
        self.send(HostEvent::ProviderDisconnected(provider)).await
    }

    pub async fn quit(&self) -> Result<(), LifecycleError> {
        self.send(HostEvent::Quit).await
    }

    /// Whether the application task has stopped receiving events.
    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }
}
