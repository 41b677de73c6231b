//! The application lifecycle owner.
//!
//! An [`Application`] wraps the host's shell handle, tracks one
//! [`ServiceProvider`] per accepted connection and forwards lifecycle events
//! to its [`ApplicationDelegate`]. The provider collection only grows through
//! [`Application::accept_connection`] and only shrinks through
//! [`Application::release_provider`] or [`Application::quit`].
//!
//! # Shutdown
//!
//! [`Application::quit`] closes the shell, then every provider in acceptance
//! order, then signals the host bridge. Every step is attempted even if an
//! earlier one failed; failures come back together in
//! [`LifecycleError::Shutdown`].

pub mod delegate;
mod report;

pub use delegate::{AppContext, ApplicationDelegate};
pub use report::{CloseFailure, CloseTarget, ShutdownReport};

use crate::error::lifecycle::LifecycleError;
use crate::handle::{HostBridge, ProviderEndpoint, ShellHandle};
use crate::pipe::PipeEndpoint;
use crate::proxy::ServiceProviderProxy;
use crate::service_provider::{ProviderId, ServiceProvider};
use crate::shell::Shell;

use common::ErrorLocation;

use std::mem::take;
use std::panic::Location;

use log::{debug, error, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initialized,
    Terminated,
}

pub struct Application<D> {
    shell: Shell,
    url: Url,
    providers: Vec<ServiceProvider>,
    bridge: Box<dyn HostBridge>,
    delegate: D,
    max_providers: Option<usize>,
    state: LifecycleState,
    quit_requested: bool,
}

impl<D: ApplicationDelegate> Application<D> {
    /// Bind a shell around `shell_handle` and start with no providers.
    pub fn new(
        shell_handle: Box<dyn ShellHandle>,
        bridge: Box<dyn HostBridge>,
        url: Url,
        delegate: D,
    ) -> Self {
        Self {
            shell: Shell::new(shell_handle),
            url,
            providers: Vec::new(),
            bridge,
            delegate,
            max_providers: None,
            state: LifecycleState::Created,
            quit_requested: false,
        }
    }

    /// Bound the number of tracked providers. `None` means unbounded.
    pub fn with_max_providers(mut self, limit: Option<usize>) -> Self {
        self.max_providers = limit;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }

    /// Tracked providers in acceptance order.
    pub fn providers(&self) -> &[ServiceProvider] {
        &self.providers
    }

    pub fn provider(&self, id: ProviderId) -> Option<&ServiceProvider> {
        self.providers.iter().find(|p| p.id() == id)
    }

    pub fn provider_mut(&mut self, id: ProviderId) -> Option<&mut ServiceProvider> {
        self.providers.iter_mut().find(|p| p.id() == id)
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == LifecycleState::Terminated
    }

    /// Whether a hook asked to quit and [`quit`](Self::quit) has not run yet.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Run the delegate's `initialize` hook.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::AlreadyInitialized`] on a second call
    /// - [`LifecycleError::Terminated`] after quit
    #[track_caller]
    pub fn initialize(&mut self, args: &[String]) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Created => {}
            LifecycleState::Initialized => {
                return Err(LifecycleError::AlreadyInitialized {
                    message: format!("{} was already initialized", self.url),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            LifecycleState::Terminated => {
                return Err(LifecycleError::terminated(format!(
                    "Cannot initialize {}: application has quit",
                    self.url
                )));
            }
        }

        self.state = LifecycleState::Initialized;
        info!("Initializing {} with {} argument(s)", self.url, args.len());

        let mut ctx = AppContext::new(&mut self.shell, &self.url, &mut self.quit_requested);
        self.delegate.initialize(&mut ctx, args);
        Ok(())
    }

    /// Track a new inbound connection and run the `accept_connection` hook.
    ///
    /// Wraps `endpoint` in a proxy, builds a [`ServiceProvider`] around it,
    /// appends it, then calls the hook with `url` and the new provider.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Terminated`] after quit
    /// - [`LifecycleError::ProviderLimit`] when the configured bound is reached
    ///
    /// In both cases `endpoint` is closed and the hook is not called.
    #[track_caller]
    pub fn accept_connection(
        &mut self,
        url: Url,
        mut endpoint: Box<dyn ProviderEndpoint>,
    ) -> Result<ProviderId, LifecycleError> {
        if self.is_terminated() {
            close_rejected(endpoint.as_mut(), &url);
            return Err(LifecycleError::terminated(format!(
                "Rejected connection from {url}: application has quit"
            )));
        }

        if let Some(limit) = self
            .max_providers
            .filter(|limit| self.providers.len() >= *limit)
        {
            warn!("Provider limit {limit} reached, rejecting connection from {url}");
            close_rejected(endpoint.as_mut(), &url);
            return Err(LifecycleError::ProviderLimit {
                limit,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let hook_url = url.clone();
        let provider = ServiceProvider::new(url, ServiceProviderProxy::bind(endpoint));
        let id = provider.id();
        self.providers.push(provider);

        info!(
            "Accepted connection from {} as provider {} ({} tracked)",
            hook_url,
            id,
            self.providers.len()
        );

        if let Some(provider) = self.providers.last_mut() {
            let mut ctx = AppContext::new(&mut self.shell, &self.url, &mut self.quit_requested);
            self.delegate
                .accept_connection(&mut ctx, &hook_url, provider);
        }

        Ok(id)
    }

    /// Route a peer's request for `interface_name` to provider `id`.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Terminated`] after quit
    /// - [`LifecycleError::UnknownProvider`] if `id` is not tracked
    /// - [`LifecycleError::Handle`] if the provider rejects the request
    #[track_caller]
    pub fn handle_service_request(
        &mut self,
        id: ProviderId,
        interface_name: &str,
        pipe: PipeEndpoint,
    ) -> Result<(), LifecycleError> {
        if self.is_terminated() {
            return Err(LifecycleError::terminated(format!(
                "Dropped request for '{interface_name}': application has quit"
            )));
        }

        let provider = self
            .providers
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| LifecycleError::UnknownProvider {
                id,
                location: ErrorLocation::from(Location::caller()),
            })?;

        provider.handle_incoming(interface_name, pipe)?;
        Ok(())
    }

    /// Close provider `id` and stop tracking it.
    ///
    /// The provider is removed even if its close fails.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Terminated`] after quit
    /// - [`LifecycleError::UnknownProvider`] if `id` is not tracked
    /// - [`LifecycleError::Handle`] if closing the provider failed
    #[track_caller]
    pub fn release_provider(&mut self, id: ProviderId) -> Result<(), LifecycleError> {
        if self.is_terminated() {
            return Err(LifecycleError::terminated(format!(
                "Cannot release provider {id}: application has quit"
            )));
        }

        let index = self
            .providers
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| LifecycleError::UnknownProvider {
                id,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut provider = self.providers.remove(index);
        info!(
            "Releasing provider {} ({}), {} still tracked",
            id,
            provider.url(),
            self.providers.len()
        );
        provider.close()?;
        Ok(())
    }

    /// Close the shell, every tracked provider in acceptance order, then
    /// signal the host bridge.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Terminated`] if quit already ran
    /// - [`LifecycleError::Shutdown`] listing every close that failed; all
    ///   remaining steps still ran
    #[track_caller]
    pub fn quit(&mut self) -> Result<ShutdownReport, LifecycleError> {
        if self.is_terminated() {
            return Err(LifecycleError::terminated(format!(
                "{} has already quit",
                self.url
            )));
        }

        self.state = LifecycleState::Terminated;
        self.quit_requested = false;

        let providers = take(&mut self.providers);
        let providers_closed = providers.len();
        info!("Quitting {} with {} provider(s)", self.url, providers_closed);

        let mut failures = Vec::new();

        if let Err(error) = self.shell.close() {
            failures.push(CloseFailure {
                target: CloseTarget::Shell,
                error,
            });
        }

        for mut provider in providers {
            debug!("Closing provider {} ({})", provider.id(), provider.url());
            if let Err(error) = provider.close() {
                failures.push(CloseFailure {
                    target: CloseTarget::Provider {
                        id: provider.id(),
                        url: provider.url().clone(),
                    },
                    error,
                });
            }
        }

        if let Err(error) = self.bridge.quit() {
            failures.push(CloseFailure {
                target: CloseTarget::Bridge,
                error,
            });
        }

        if failures.is_empty() {
            info!("{} quit cleanly", self.url);
            return Ok(ShutdownReport { providers_closed });
        }

        for failure in &failures {
            error!("Close failed during quit: {failure}");
        }

        Err(LifecycleError::Shutdown {
            message: format!(
                "{} close operation(s) failed while quitting {}",
                failures.len(),
                self.url
            ),
            failures,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Close an endpoint the application refused to track.
fn close_rejected(endpoint: &mut dyn ProviderEndpoint, url: &Url) {
    if let Err(e) = endpoint.close() {
        warn!("Failed to close rejected connection from {url}: {e}");
    }
}
