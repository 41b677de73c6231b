//! The echo application.
//!
//! Provides one service, [`ECHO_SERVICE`], on every accepted connection.
//! Each request pipe gets its own task that sends every message back.

use app_core::pipe::PipeEndpoint;
use app_core::{AppContext, ApplicationDelegate, ServiceProvider};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, error, info};
use url::Url;

pub const ECHO_SERVICE: &str = "echo";

/// Counters shared between the delegate and whoever launched it.
#[derive(Debug, Clone, Default)]
pub struct EchoStats {
    connections: Arc<AtomicUsize>,
    pipes_served: Arc<AtomicUsize>,
}

impl EchoStats {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn pipes_served(&self) -> usize {
        self.pipes_served.load(Ordering::SeqCst)
    }
}

/// Process argument: quit once this many connections have been accepted.
pub const MAX_CONNECTIONS_FLAG: &str = "--max-connections";

#[derive(Debug, Default)]
pub struct EchoApplication {
    stats: EchoStats,
    max_connections: Option<usize>,
}

impl EchoApplication {
    pub fn new(stats: EchoStats) -> Self {
        Self {
            stats,
            max_connections: None,
        }
    }

    pub fn stats(&self) -> &EchoStats {
        &self.stats
    }
}

impl ApplicationDelegate for EchoApplication {
    fn initialize(&mut self, ctx: &mut AppContext<'_>, args: &[String]) {
        self.max_connections = args
            .iter()
            .skip_while(|arg| *arg != MAX_CONNECTIONS_FLAG)
            .nth(1)
            .and_then(|value| value.parse().ok());
        info!(
            "Echo application {} ready (connection limit: {:?})",
            ctx.url(),
            self.max_connections
        );
    }

    fn accept_connection(
        &mut self,
        ctx: &mut AppContext<'_>,
        url: &Url,
        provider: &mut ServiceProvider,
    ) {
        let seen = self.stats.connections.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Serving {ECHO_SERVICE} to {url} (connection #{seen})");

        let served = Arc::clone(&self.stats.pipes_served);
        let provided = provider.provide_service(ECHO_SERVICE, move |pipe: PipeEndpoint| {
            served.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(echo_loop(pipe));
        });
        if let Err(e) = provided {
            error!("Could not provide {ECHO_SERVICE} to {url}: {e}");
        }

        if self.max_connections.is_some_and(|limit| seen >= limit) {
            info!("Reached {seen} connection(s), quitting");
            ctx.request_quit();
        }
    }
}

/// Send every message on `pipe` straight back until either side goes away.
async fn echo_loop(mut pipe: PipeEndpoint) {
    while let Some(message) = pipe.recv().await {
        debug!("Echoing {} byte(s)", message.len());
        if let Err(e) = pipe.send(message) {
            debug!("Echo peer gone: {e}");
            break;
        }
    }
    debug!("Echo pipe finished");
}
