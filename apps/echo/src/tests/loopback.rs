use crate::loopback::{LoopbackBridge, LoopbackShell, loopback_connection};

use app_core::error::HandleError;
use app_core::pipe::message_pipe;
use app_core::{HostBridge, ProviderEndpoint, ShellHandle};

use url::Url;

/// **VALUE**: Requests sent through an endpoint reach its peer intact.
///
/// **BUG THIS CATCHES**: Would catch the pipe being swapped or dropped on the
/// way across.
#[tokio::test]
async fn given_loopback_connection_when_service_requested_then_peer_receives_pipe() {
    // GIVEN: A loopback connection
    let (mut endpoint, mut peer) = loopback_connection("test");

    // WHEN: The application side requests a service
    let (local, remote) = message_pipe();
    endpoint
        .connect_to_service("clock", remote)
        .expect("connect should succeed");

    // THEN: The peer sees the request and can answer on the pipe
    let mut request = peer.next_request().await.expect("request should arrive");
    assert_eq!(request.interface_name, "clock");
    local.send(b"tick".to_vec()).unwrap();
    assert_eq!(request.pipe.recv().await, Some(b"tick".to_vec()));
}

#[test]
fn given_closed_endpoint_when_service_requested_then_closed_error() {
    let (mut endpoint, peer) = loopback_connection("test");
    endpoint.close().unwrap();
    endpoint.close().unwrap();

    let (_local, remote) = message_pipe();
    let result = endpoint.connect_to_service("clock", remote);

    assert!(matches!(result, Err(HandleError::Closed { .. })));
    assert!(peer.is_closed());
}

#[test]
fn given_dropped_peer_when_service_requested_then_peer_closed_error() {
    let (mut endpoint, peer) = loopback_connection("test");
    drop(peer);

    let (_local, remote) = message_pipe();
    let result = endpoint.connect_to_service("clock", remote);

    assert!(matches!(result, Err(HandleError::PeerClosed { .. })));
}

/// **VALUE**: The shell reports each connection it opens, and stops after close.
///
/// **BUG THIS CATCHES**: Would catch a closed shell still opening connections.
#[test]
fn given_loopback_shell_when_connecting_then_outbound_reported_until_closed() {
    // GIVEN: A loopback shell
    let (mut shell, mut outbound) = LoopbackShell::new();
    let target = Url::parse("app:storage").unwrap();

    // WHEN: Connecting, then closing, then connecting again
    shell
        .connect_to_application(&target)
        .expect("connect should succeed");
    shell.close().unwrap();
    let after_close = shell.connect_to_application(&target);

    // THEN: One connection was reported and the late one refused
    let opened = outbound.try_recv().expect("connection should be reported");
    assert_eq!(opened.url, target);
    assert!(outbound.try_recv().is_err());
    assert!(matches!(after_close, Err(HandleError::Closed { .. })));
}

#[tokio::test]
async fn given_loopback_bridge_when_quit_twice_then_signal_fires_once() {
    let (mut bridge, quit_signal) = LoopbackBridge::new();

    bridge.quit().expect("first quit should signal");
    let second = bridge.quit();

    assert!(quit_signal.await.is_ok());
    assert!(matches!(second, Err(HandleError::Closed { .. })));
}
