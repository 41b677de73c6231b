use app_core::error::{ConfigError, HandleError, LifecycleError};

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the echo application.
///
/// Framework errors are flattened to their message so the whole enum stays
/// serializable, with the conversion site kept as the location.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum EchoError {
    /// Error from this app
    #[error("Echo Error: {message} {location}")]
    Echo {
        message: String,
        location: ErrorLocation,
    },

    /// Error from app-core lifecycle or handle operations
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Config could not be located, loaded or validated
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The echo round trip did not come back as sent
    #[error("Session Error: {message} {location}")]
    Session {
        message: String,
        location: ErrorLocation,
    },
}

impl From<LifecycleError> for EchoError {
    #[track_caller]
    fn from(error: LifecycleError) -> Self {
        EchoError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<HandleError> for EchoError {
    #[track_caller]
    fn from(error: HandleError) -> Self {
        EchoError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for EchoError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        EchoError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
