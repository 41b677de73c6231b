use crate::application::CloseFailure;
use crate::error::handle::HandleError;
use crate::service_provider::ProviderId;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LifecycleError {
    #[error("Already Initialized Error: {message} {location}")]
    AlreadyInitialized {
        message: String,
        location: ErrorLocation,
    },

    #[error("Terminated Error: {message} {location}")]
    Terminated {
        message: String,
        location: ErrorLocation,
    },

    #[error("Provider Limit Error: at most {limit} providers may be tracked {location}")]
    ProviderLimit {
        limit: usize,
        location: ErrorLocation,
    },

    #[error("Unknown Provider Error: {id} {location}")]
    UnknownProvider {
        id: ProviderId,
        location: ErrorLocation,
    },

    #[error("Handle Error: {source} {location}")]
    Handle {
        location: ErrorLocation,
        #[source]
        source: HandleError,
    },

    #[error("Shutdown Error: {message} {location}")]
    Shutdown {
        message: String,
        failures: Vec<CloseFailure>,
        location: ErrorLocation,
    },

    #[error("Runner Stopped Error: {message} {location}")]
    RunnerStopped {
        message: String,
        location: ErrorLocation,
    },
}

impl LifecycleError {
    #[track_caller]
    pub fn terminated(message: impl Into<String>) -> Self {
        LifecycleError::Terminated {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn runner_stopped(message: impl Into<String>) -> Self {
        LifecycleError::RunnerStopped {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<HandleError> for LifecycleError {
    #[track_caller]
    fn from(error: HandleError) -> Self {
        LifecycleError::Handle {
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}
