//! In-process host handles.
//!
//! Stands in for a real host: every handle is backed by tokio channels, and
//! the far side of each one is available to the caller for inspection.

use app_core::error::HandleError;
use app_core::pipe::PipeEndpoint;
use app_core::{HostBridge, ProviderEndpoint, ShellHandle};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use tokio::sync::{mpsc, oneshot};
use url::Url;

/// A service request forwarded across a loopback connection.
#[derive(Debug)]
pub struct ForwardedRequest {
    pub interface_name: String,
    pub pipe: PipeEndpoint,
}

/// Raw provider handle for one loopback connection.
pub struct LoopbackEndpoint {
    label: String,
    requests: mpsc::UnboundedSender<ForwardedRequest>,
    closed: Arc<AtomicBool>,
}

/// The far side of a [`LoopbackEndpoint`].
#[derive(Debug)]
pub struct LoopbackPeer {
    requests: mpsc::UnboundedReceiver<ForwardedRequest>,
    closed: Arc<AtomicBool>,
}

/// Open a loopback connection labelled `label` in logs.
pub fn loopback_connection(label: impl Into<String>) -> (LoopbackEndpoint, LoopbackPeer) {
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        LoopbackEndpoint {
            label: label.into(),
            requests: requests_tx,
            closed: Arc::clone(&closed),
        },
        LoopbackPeer {
            requests: requests_rx,
            closed,
        },
    )
}

impl ProviderEndpoint for LoopbackEndpoint {
    fn connect_to_service(
        &mut self,
        interface_name: &str,
        pipe: PipeEndpoint,
    ) -> Result<(), HandleError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HandleError::closed(format!(
                "Loopback connection {} is closed",
                self.label
            )));
        }

        debug!("{} forwarding request for '{}'", self.label, interface_name);
        self.requests
            .send(ForwardedRequest {
                interface_name: interface_name.to_string(),
                pipe,
            })
            .map_err(|_| {
                HandleError::peer_closed(format!("Peer of {} has gone away", self.label))
            })
    }

    fn close(&mut self) -> Result<(), HandleError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Loopback connection {} closed", self.label);
        }
        Ok(())
    }
}

impl LoopbackPeer {
    /// Next request the application made across this connection.
    pub async fn next_request(&mut self) -> Option<ForwardedRequest> {
        self.requests.recv().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// An application connection the shell opened on request.
#[derive(Debug)]
pub struct OutboundConnection {
    pub url: Url,
    pub peer: LoopbackPeer,
}

pub struct LoopbackShell {
    outbound: Option<mpsc::UnboundedSender<OutboundConnection>>,
}

impl LoopbackShell {
    /// Build a shell plus the stream of connections it opens.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundConnection>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: Some(outbound_tx),
            },
            outbound_rx,
        )
    }
}

impl ShellHandle for LoopbackShell {
    fn connect_to_application(
        &mut self,
        url: &Url,
    ) -> Result<Box<dyn ProviderEndpoint>, HandleError> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| HandleError::closed("Loopback shell is closed"))?;

        let (endpoint, peer) = loopback_connection(url.as_str());
        outbound
            .send(OutboundConnection {
                url: url.clone(),
                peer,
            })
            .map_err(|_| HandleError::unavailable(format!("Nobody is hosting {url}")))?;

        info!("Loopback shell connected to {url}");
        Ok(Box::new(endpoint))
    }

    fn close(&mut self) -> Result<(), HandleError> {
        if self.outbound.take().is_some() {
            debug!("Loopback shell closed");
        }
        Ok(())
    }
}

/// Host bridge that fires a oneshot when the application quits.
pub struct LoopbackBridge {
    quit_tx: Option<oneshot::Sender<()>>,
}

impl LoopbackBridge {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (quit_tx, quit_rx) = oneshot::channel();
        (
            Self {
                quit_tx: Some(quit_tx),
            },
            quit_rx,
        )
    }
}

impl HostBridge for LoopbackBridge {
    fn quit(&mut self) -> Result<(), HandleError> {
        let quit_tx = self
            .quit_tx
            .take()
            .ok_or_else(|| HandleError::closed("Quit was already signalled"))?;

        quit_tx
            .send(())
            .map_err(|_| HandleError::peer_closed("Host stopped waiting for quit"))
    }
}
