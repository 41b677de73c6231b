use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures reported by host-provided handles and the objects wrapping them.
#[derive(Debug, ThisError)]
pub enum HandleError {
    #[error("Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Peer Closed Error: {message} {location}")]
    PeerClosed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unavailable Error: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },
}

impl HandleError {
    #[track_caller]
    pub fn closed(message: impl Into<String>) -> Self {
        HandleError::Closed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn peer_closed(message: impl Into<String>) -> Self {
        HandleError::PeerClosed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        HandleError::Transport {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        HandleError::Unavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
