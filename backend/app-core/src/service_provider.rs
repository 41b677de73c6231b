//! Per-connection service-provider adapter.
//!
//! Each inbound connection gets one [`ServiceProvider`]. It exposes local
//! services to the peer through [`ServiceProvider::provide_service`] and
//! requests the peer's services through [`ServiceProvider::request_service`].
//! Requests that arrive before a matching service is provided are queued and
//! handed over as soon as it is.

use crate::error::handle::HandleError;
use crate::pipe::{PipeEndpoint, message_pipe};
use crate::proxy::ServiceProviderProxy;

use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Identity of one tracked provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(Uuid);

impl ProviderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creates a service implementation bound to an incoming pipe.
pub trait ServiceFactory: Send {
    fn create(&mut self, pipe: PipeEndpoint);
}

impl<F> ServiceFactory for F
where
    F: FnMut(PipeEndpoint) + Send,
{
    fn create(&mut self, pipe: PipeEndpoint) {
        (*self)(pipe)
    }
}

#[derive(Default)]
struct Registry {
    factories: HashMap<String, Box<dyn ServiceFactory>>,
    pending: HashMap<String, Vec<PipeEndpoint>>,
}

/// Adapter around the proxy for one connection.
pub struct ServiceProvider {
    id: ProviderId,
    url: Url,
    proxy: ServiceProviderProxy,
    /// `None` once closed.
    registry: Option<Registry>,
}

impl ServiceProvider {
    /// Build the adapter for a connection from `url`.
    pub fn new(url: Url, proxy: ServiceProviderProxy) -> Self {
        Self {
            id: ProviderId::new(),
            url,
            proxy,
            registry: Some(Registry::default()),
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// URL of the peer on the other side of this connection.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Expose `interface_name` to the peer.
    ///
    /// Requests already queued for the name are handed to `factory` in
    /// arrival order. Providing the same name twice replaces the earlier
    /// factory.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the provider was closed.
    pub fn provide_service<F>(
        &mut self,
        interface_name: impl Into<String>,
        factory: F,
    ) -> Result<&mut Self, HandleError>
    where
        F: ServiceFactory + 'static,
    {
        let interface_name = interface_name.into();
        let registry = self.registry.as_mut().ok_or_else(|| {
            HandleError::closed(format!(
                "Cannot provide '{interface_name}': provider is closed"
            ))
        })?;

        let mut factory: Box<dyn ServiceFactory> = Box::new(factory);
        if let Some(queued) = registry.pending.remove(&interface_name) {
            debug!(
                "Binding {} queued request(s) for '{}'",
                queued.len(),
                interface_name
            );
            for pipe in queued {
                factory.create(pipe);
            }
        }

        if registry
            .factories
            .insert(interface_name.clone(), factory)
            .is_some()
        {
            warn!("Replacing existing factory for '{interface_name}'");
        } else {
            info!("Providing '{}' to {}", interface_name, self.url);
        }

        Ok(self)
    }

    /// Route a request from the peer for `interface_name`.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the provider was closed.
    pub fn handle_incoming(
        &mut self,
        interface_name: &str,
        pipe: PipeEndpoint,
    ) -> Result<(), HandleError> {
        let registry = self.registry.as_mut().ok_or_else(|| {
            HandleError::closed(format!(
                "Cannot accept request for '{interface_name}': provider is closed"
            ))
        })?;

        match registry.factories.get_mut(interface_name) {
            Some(factory) => factory.create(pipe),
            None => {
                debug!("No factory for '{interface_name}' yet, queueing request");
                registry
                    .pending
                    .entry(interface_name.to_string())
                    .or_default()
                    .push(pipe);
            }
        }

        Ok(())
    }

    /// Ask the peer for `interface_name` and return the local pipe end.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the provider was closed, or whatever
    /// the endpoint reports when forwarding fails.
    pub fn request_service(&mut self, interface_name: &str) -> Result<PipeEndpoint, HandleError> {
        if self.registry.is_none() {
            return Err(HandleError::closed(format!(
                "Cannot request '{interface_name}': provider is closed"
            )));
        }

        let (local, remote) = message_pipe();
        self.proxy.connect_to_service(interface_name, remote)?;
        Ok(local)
    }

    pub fn has_service(&self, interface_name: &str) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|r| r.factories.contains_key(interface_name))
    }

    /// Number of requests waiting for `interface_name` to be provided.
    pub fn pending_requests(&self, interface_name: &str) -> usize {
        self.registry
            .as_ref()
            .and_then(|r| r.pending.get(interface_name))
            .map_or(0, Vec::len)
    }

    /// Drop every local service and queued request, then close the proxy.
    ///
    /// Safe to call more than once; only the first call reaches the endpoint.
    pub fn close(&mut self) -> Result<(), HandleError> {
        if let Some(registry) = self.registry.take() {
            debug!(
                "Closing provider {} ({} service(s), {} pending name(s))",
                self.id,
                registry.factories.len(),
                registry.pending.len()
            );
        }
        self.proxy.close()
    }

    pub fn is_closed(&self) -> bool {
        self.registry.is_none()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("proxy", &self.proxy)
            .field("closed", &self.is_closed())
            .finish()
    }
}
