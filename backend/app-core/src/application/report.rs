use crate::error::handle::HandleError;
use crate::service_provider::ProviderId;

use std::fmt;

use url::Url;

/// What a failed close was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseTarget {
    Shell,
    Provider { id: ProviderId, url: Url },
    Bridge,
}

impl fmt::Display for CloseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseTarget::Shell => write!(f, "shell"),
            CloseTarget::Provider { id, url } => write!(f, "provider {id} ({url})"),
            CloseTarget::Bridge => write!(f, "host bridge"),
        }
    }
}

#[derive(Debug)]
pub struct CloseFailure {
    pub target: CloseTarget,
    pub error: HandleError,
}

impl fmt::Display for CloseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.error)
    }
}

/// Outcome of a clean quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Providers closed during quit, in acceptance order.
    pub providers_closed: usize,
}
