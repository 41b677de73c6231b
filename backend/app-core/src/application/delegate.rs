//! Hooks a concrete application implements.

use crate::service_provider::ServiceProvider;
use crate::shell::Shell;

use url::Url;

/// Application-specific behaviour plugged into [`Application`](super::Application).
///
/// Both hooks default to doing nothing.
pub trait ApplicationDelegate: Send {
    /// Called once at startup with the process arguments.
    fn initialize(&mut self, _ctx: &mut AppContext<'_>, _args: &[String]) {}

    /// Called once per inbound connection, after `provider` has been tracked.
    fn accept_connection(
        &mut self,
        _ctx: &mut AppContext<'_>,
        _url: &Url,
        _provider: &mut ServiceProvider,
    ) {
    }
}

/// What a hook may reach while it runs.
pub struct AppContext<'a> {
    shell: &'a mut Shell,
    url: &'a Url,
    quit_requested: &'a mut bool,
}

impl<'a> AppContext<'a> {
    pub(crate) fn new(shell: &'a mut Shell, url: &'a Url, quit_requested: &'a mut bool) -> Self {
        Self {
            shell,
            url,
            quit_requested,
        }
    }

    pub fn shell(&mut self) -> &mut Shell {
        &mut *self.shell
    }

    /// The application's own URL.
    pub fn url(&self) -> &Url {
        self.url
    }

    /// Ask for the application to quit once the current hook returns.
    pub fn request_quit(&mut self) {
        *self.quit_requested = true;
    }
}
