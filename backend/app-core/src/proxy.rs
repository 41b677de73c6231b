//! Callable proxy over a raw service-provider handle.

use crate::error::handle::HandleError;
use crate::handle::ProviderEndpoint;
use crate::pipe::PipeEndpoint;

use log::{debug, trace};

/// Proxy for the remote service-provider interface.
///
/// Owns the raw endpoint exclusively. The endpoint is closed at most once;
/// calls after [`close`](Self::close) fail with [`HandleError::Closed`].
pub struct ServiceProviderProxy {
    endpoint: Option<Box<dyn ProviderEndpoint>>,
}

impl ServiceProviderProxy {
    /// Wrap a raw handle.
    pub fn bind(endpoint: Box<dyn ProviderEndpoint>) -> Self {
        Self {
            endpoint: Some(endpoint),
        }
    }

    pub fn connect_to_service(
        &mut self,
        interface_name: &str,
        pipe: PipeEndpoint,
    ) -> Result<(), HandleError> {
        let endpoint = self.endpoint.as_mut().ok_or_else(|| {
            HandleError::closed(format!(
                "Cannot connect to '{interface_name}': proxy is closed"
            ))
        })?;

        trace!("Forwarding service request for '{interface_name}'");
        endpoint.connect_to_service(interface_name, pipe)
    }

    /// Close the underlying endpoint.
    ///
    /// The endpoint is released even when its close fails.
    pub fn close(&mut self) -> Result<(), HandleError> {
        match self.endpoint.take() {
            Some(mut endpoint) => endpoint.close(),
            None => {
                debug!("Proxy already closed");
                Ok(())
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.endpoint.is_none()
    }
}

impl std::fmt::Debug for ServiceProviderProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProviderProxy")
            .field("closed", &self.is_closed())
            .finish()
    }
}
