//! Wrapper around the host shell handle.
//!
//! Outbound connections are cached per URL: connecting to the same
//! application twice returns the provider opened the first time.

use crate::error::handle::HandleError;
use crate::handle::ShellHandle;
use crate::pipe::PipeEndpoint;
use crate::proxy::ServiceProviderProxy;
use crate::service_provider::ServiceProvider;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, info, warn};
use url::Url;

pub struct Shell {
    /// `None` once closed.
    handle: Option<Box<dyn ShellHandle>>,
    applications: HashMap<Url, ServiceProvider>,
}

impl Shell {
    pub fn new(handle: Box<dyn ShellHandle>) -> Self {
        Self {
            handle: Some(handle),
            applications: HashMap::new(),
        }
    }

    /// Provider for the application at `url`, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] after [`close`](Self::close), or the
    /// handle's error if the connection cannot be opened.
    pub fn connect_to_application(&mut self, url: &Url) -> Result<&mut ServiceProvider, HandleError> {
        let handle = self.handle.as_mut().ok_or_else(|| {
            HandleError::closed(format!("Cannot connect to {url}: shell is closed"))
        })?;

        match self.applications.entry(url.clone()) {
            Entry::Occupied(entry) => {
                debug!("Reusing connection to {url}");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let endpoint = handle.connect_to_application(url)?;
                info!("Connected to application {url}");
                let provider = ServiceProvider::new(url.clone(), ServiceProviderProxy::bind(endpoint));
                Ok(entry.insert(provider))
            }
        }
    }

    /// Request `interface_name` from the application at `url`.
    pub fn connect_to_service(
        &mut self,
        url: &Url,
        interface_name: &str,
    ) -> Result<PipeEndpoint, HandleError> {
        self.connect_to_application(url)?
            .request_service(interface_name)
    }

    /// Number of cached outbound connections.
    pub fn connection_count(&self) -> usize {
        self.applications.len()
    }

    /// Close every outbound connection, then the shell handle.
    ///
    /// All closes are attempted. The first failure is returned and the rest
    /// are logged. Later calls are no-ops.
    pub fn close(&mut self) -> Result<(), HandleError> {
        let Some(mut handle) = self.handle.take() else {
            debug!("Shell already closed");
            return Ok(());
        };

        let mut first_failure = None;

        for (url, mut provider) in self.applications.drain() {
            if let Err(e) = provider.close() {
                warn!("Failed to close connection to {url}: {e}");
                first_failure.get_or_insert(e);
            }
        }

        if let Err(e) = handle.close() {
            warn!("Failed to close shell handle: {e}");
            first_failure.get_or_insert(e);
        }

        match first_failure {
            Some(e) => Err(e),
            None => {
                info!("Shell closed");
                Ok(())
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("closed", &self.is_closed())
            .field("connections", &self.applications.len())
            .finish()
    }
}
