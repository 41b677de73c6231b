//! In-process message pipes.
//!
//! A pipe is the payload of every service request: the requester keeps one
//! endpoint and the service implementation receives the other. Messages are
//! opaque byte vectors delivered in order, one per `send`.

use crate::error::handle::HandleError;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// One side of a bidirectional message pipe.
#[derive(Debug)]
pub struct PipeEndpoint {
    outgoing: UnboundedSender<Vec<u8>>,
    incoming: UnboundedReceiver<Vec<u8>>,
}

/// Creates a connected pair of endpoints.
pub fn message_pipe() -> (PipeEndpoint, PipeEndpoint) {
    let (left_tx, right_rx) = unbounded_channel();
    let (right_tx, left_rx) = unbounded_channel();

    (
        PipeEndpoint {
            outgoing: left_tx,
            incoming: left_rx,
        },
        PipeEndpoint {
            outgoing: right_tx,
            incoming: right_rx,
        },
    )
}

impl PipeEndpoint {
    /// Queue a message for the peer.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::PeerClosed`] if the peer endpoint was dropped.
    pub fn send(&self, message: impl Into<Vec<u8>>) -> Result<(), HandleError> {
        self.outgoing
            .send(message.into())
            .map_err(|_| HandleError::peer_closed("Pipe peer dropped before send"))
    }

    /// Wait for the next message.
    ///
    /// Returns `None` once the peer is gone and every queued message was read.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.incoming.recv().await
    }

    /// Read a message if one is already queued.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::PeerClosed`] if the queue is empty and the peer
    /// was dropped.
    pub fn try_recv(&mut self) -> Result<Option<Vec<u8>>, HandleError> {
        match self.incoming.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HandleError::peer_closed("Pipe peer dropped"))
            }
        }
    }

    /// Whether the peer endpoint has been dropped.
    pub fn is_peer_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}
