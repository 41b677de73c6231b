//! Capabilities supplied by the embedding host.
//!
//! The framework never talks to the platform directly. A host implements
//! these traits over whatever transport it uses and hands boxed values to
//! [`Application`](crate::Application).

use crate::error::handle::HandleError;
use crate::pipe::PipeEndpoint;

use url::Url;

/// Raw service-provider handle for one connection.
///
/// For an inbound connection this is the caller's side; for an outbound
/// connection opened through the shell it is the remote application's side.
pub trait ProviderEndpoint: Send {
    /// Ask the remote side to bind `pipe` to its implementation of
    /// `interface_name`.
    fn connect_to_service(
        &mut self,
        interface_name: &str,
        pipe: PipeEndpoint,
    ) -> Result<(), HandleError>;

    fn close(&mut self) -> Result<(), HandleError>;
}

/// The application's connection to its host shell.
pub trait ShellHandle: Send {
    /// Open a connection to the application at `url`.
    fn connect_to_application(
        &mut self,
        url: &Url,
    ) -> Result<Box<dyn ProviderEndpoint>, HandleError>;

    fn close(&mut self) -> Result<(), HandleError>;
}

/// Process-level lifecycle signals towards the embedding runtime.
pub trait HostBridge: Send {
    /// Request termination of the hosting process.
    fn quit(&mut self) -> Result<(), HandleError>;
}
