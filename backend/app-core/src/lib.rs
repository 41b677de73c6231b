//! Application lifecycle framework for processes hosted by a service platform.
//!
//! The host hands an application a shell handle, delivers one raw
//! service-provider handle per inbound connection, and expects the
//! application to release everything when it quits. This crate turns those
//! raw capabilities into typed objects:
//!
//! - [`handle`] - traits the embedding host implements
//! - [`pipe`] - in-process message pipes carried by service requests
//! - [`proxy`] / [`service_provider`] - per-connection adapters
//! - [`shell`] - the application's connection to its host shell
//! - [`application`] - the lifecycle owner and its delegate hooks
//! - [`runner`] - serialized delivery of host events to one application

pub mod application;
pub mod config;
pub mod error;
pub mod handle;
pub mod pipe;
pub mod proxy;
pub mod runner;
pub mod service_provider;
pub mod shell;

#[cfg(test)]
mod tests;

pub use application::{AppContext, Application, ApplicationDelegate, ShutdownReport};
pub use handle::{HostBridge, ProviderEndpoint, ShellHandle};
pub use service_provider::{ProviderId, ServiceProvider};
pub use shell::Shell;

pub const APP_URL_SCHEME: &str = "app";
pub const DEFAULT_APP_NAME: &str = "appshell";
pub const DEFAULT_APP_URL: &str = const_format::concatcp!(APP_URL_SCHEME, ":", DEFAULT_APP_NAME);
