use crate::echo::{ECHO_SERVICE, EchoApplication, EchoStats, MAX_CONNECTIONS_FLAG};
use crate::loopback::{LoopbackBridge, LoopbackShell, loopback_connection};

use app_core::Application;
use app_core::pipe::message_pipe;

use tokio::sync::oneshot;
use url::Url;

fn echo_application(stats: &EchoStats) -> (Application<EchoApplication>, oneshot::Receiver<()>) {
    let (shell, _outbound) = LoopbackShell::new();
    let (bridge, quit_signal) = LoopbackBridge::new();
    let app = Application::new(
        Box::new(shell),
        Box::new(bridge),
        Url::parse("app:echo").unwrap(),
        EchoApplication::new(stats.clone()),
    );
    (app, quit_signal)
}

/// **VALUE**: Every accepted connection can use the echo service.
///
/// **BUG THIS CATCHES**: Would catch the service being provided under another
/// name, or the echo task dropping messages.
#[tokio::test]
async fn given_accepted_connection_when_echo_requested_then_messages_come_back() {
    // GIVEN: An echo application with one accepted connection
    let stats = EchoStats::default();
    let (mut app, _quit_signal) = echo_application(&stats);
    app.initialize(&[]).unwrap();
    let (endpoint, _peer) = loopback_connection("caller");
    let id = app
        .accept_connection(Url::parse("app:caller").unwrap(), Box::new(endpoint))
        .unwrap();
    assert!(app.provider(id).unwrap().has_service(ECHO_SERVICE));

    // WHEN: The caller opens an echo pipe and sends two messages
    let (mut local, remote) = message_pipe();
    app.handle_service_request(id, ECHO_SERVICE, remote).unwrap();
    local.send(b"one".to_vec()).unwrap();
    local.send(b"two".to_vec()).unwrap();

    // THEN: Both come back in order
    assert_eq!(local.recv().await, Some(b"one".to_vec()));
    assert_eq!(local.recv().await, Some(b"two".to_vec()));
    assert_eq!(stats.connections(), 1);
    assert_eq!(stats.pipes_served(), 1);
}

/// **VALUE**: The connection limit argument ends the application on its own.
///
/// **BUG THIS CATCHES**: Would catch the flag value being ignored or read
/// from the wrong position.
#[tokio::test]
async fn given_connection_limit_arg_when_limit_reached_then_quit_requested() {
    // GIVEN: An application limited to two connections
    let stats = EchoStats::default();
    let (mut app, _quit_signal) = echo_application(&stats);
    app.initialize(&[String::from(MAX_CONNECTIONS_FLAG), String::from("2")])
        .unwrap();

    // WHEN: Connections arrive one at a time
    let (first, _first_peer) = loopback_connection("first");
    app.accept_connection(Url::parse("app:first").unwrap(), Box::new(first))
        .unwrap();
    let after_first = app.quit_requested();
    let (second, _second_peer) = loopback_connection("second");
    app.accept_connection(Url::parse("app:second").unwrap(), Box::new(second))
        .unwrap();

    // THEN: Quit is requested only once the limit is reached
    assert!(!after_first);
    assert!(app.quit_requested());
    assert_eq!(stats.connections(), 2);
}

#[tokio::test]
async fn given_quit_when_peers_checked_then_every_loopback_connection_closed() {
    let stats = EchoStats::default();
    let (mut app, quit_signal) = echo_application(&stats);
    let (endpoint, peer) = loopback_connection("caller");
    app.accept_connection(Url::parse("app:caller").unwrap(), Box::new(endpoint))
        .unwrap();

    let report = app.quit().expect("quit should succeed");

    assert_eq!(report.providers_closed, 1);
    assert!(peer.is_closed());
    assert!(quit_signal.await.is_ok());
}
