// Unit tests for the ServiceProvider adapter

use crate::error::handle::HandleError;
use crate::pipe::{PipeEndpoint, message_pipe};
use crate::proxy::ServiceProviderProxy;
use crate::service_provider::ServiceProvider;
use crate::tests::support::{CallLog, StubEndpoint, call_log, calls, url};

use std::sync::{Arc, Mutex};

fn provider(log: &CallLog) -> (ServiceProvider, crate::tests::support::Delivered) {
    let endpoint = StubEndpoint::new("caller", log);
    let delivered = endpoint.delivered.clone();
    let provider = ServiceProvider::new(
        url("caller:test"),
        ServiceProviderProxy::bind(Box::new(endpoint)),
    );
    (provider, delivered)
}

/// **VALUE**: Verifies an incoming request reaches the factory provided for it.
///
/// **BUG THIS CATCHES**: Would catch if `handle_incoming()` queued requests even
/// when a factory exists, leaving the requester waiting forever.
#[test]
fn given_provided_service_when_request_arrives_then_factory_receives_pipe() {
    // GIVEN: A provider exposing "echo"
    let log = call_log();
    let (mut provider, _) = provider(&log);
    let bound: Arc<Mutex<Vec<PipeEndpoint>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&bound);
    provider
        .provide_service("echo", move |pipe: PipeEndpoint| sink.lock().unwrap().push(pipe))
        .unwrap();

    // WHEN: The peer requests "echo"
    let (_requester, service_end) = message_pipe();
    provider.handle_incoming("echo", service_end).unwrap();

    // THEN: The factory got the pipe and nothing is pending
    assert_eq!(bound.lock().unwrap().len(), 1);
    assert_eq!(provider.pending_requests("echo"), 0);
    assert!(provider.has_service("echo"));
}

/// **VALUE**: Verifies requests that arrive before the service is provided are
/// delivered once it is.
///
/// **WHY THIS MATTERS**: A peer may ask for a service before the application's
/// accept hook has finished registering it.
///
/// **BUG THIS CATCHES**: Would catch if early requests were dropped or only the
/// last one kept.
#[test]
fn given_queued_requests_when_service_provided_then_all_are_bound_in_order() {
    // GIVEN: Two requests for an unprovided service
    let log = call_log();
    let (mut provider, _) = provider(&log);
    let (first_requester, first) = message_pipe();
    let (second_requester, second) = message_pipe();
    provider.handle_incoming("echo", first).unwrap();
    provider.handle_incoming("echo", second).unwrap();
    assert_eq!(provider.pending_requests("echo"), 2);

    // WHEN: The service is provided
    let bound: Arc<Mutex<Vec<PipeEndpoint>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&bound);
    provider
        .provide_service("echo", move |pipe: PipeEndpoint| sink.lock().unwrap().push(pipe))
        .unwrap();

    // THEN: Both were bound in arrival order
    assert_eq!(provider.pending_requests("echo"), 0);
    first_requester.send(b"first".to_vec()).unwrap();
    second_requester.send(b"second".to_vec()).unwrap();
    let mut bound = bound.lock().unwrap();
    assert_eq!(bound.len(), 2);
    assert_eq!(bound[0].try_recv().unwrap(), Some(b"first".to_vec()));
    assert_eq!(bound[1].try_recv().unwrap(), Some(b"second".to_vec()));
}

/// **VALUE**: Verifies outgoing requests go through the proxy with the remote
/// end of a fresh pipe.
///
/// **BUG THIS CATCHES**: Would catch if `request_service()` returned the same end
/// it sent, which would leave both parties unable to talk.
#[test]
fn given_open_provider_when_requesting_service_then_peer_gets_connected_end() {
    // GIVEN: A provider over a recording endpoint
    let log = call_log();
    let (mut provider, delivered) = provider(&log);

    // WHEN: Requesting "logger" from the peer
    let local = provider.request_service("logger").unwrap();

    // THEN: The peer got the other end of the same pipe
    assert_eq!(calls(&log), vec!["caller.connect:logger"]);
    local.send(b"hello".to_vec()).unwrap();
    let (name, mut remote) = delivered.lock().unwrap().pop().unwrap();
    assert_eq!(name, "logger");
    assert_eq!(remote.try_recv().unwrap(), Some(b"hello".to_vec()));
}

/// **VALUE**: Verifies close drops local state and every later call fails.
///
/// **BUG THIS CATCHES**: Would catch if a closed provider still accepted
/// requests, binding pipes to services of a connection that no longer exists.
#[test]
fn given_closed_provider_when_used_then_every_operation_returns_closed() {
    // GIVEN: A provider with a pending request, then closed
    let log = call_log();
    let (mut provider, _) = provider(&log);
    let (_requester, pending) = message_pipe();
    provider.handle_incoming("echo", pending).unwrap();
    provider.close().unwrap();

    // WHEN: Using it afterwards
    let (_other, pipe) = message_pipe();
    let incoming = provider.handle_incoming("echo", pipe);
    let provided = provider.provide_service("echo", |_pipe: PipeEndpoint| {}).map(|_| ());
    let requested = provider.request_service("echo").map(|_| ());

    // THEN: All fail with Closed and the endpoint was closed once
    assert!(provider.is_closed());
    assert_eq!(provider.pending_requests("echo"), 0);
    assert!(matches!(incoming, Err(HandleError::Closed { .. })));
    assert!(matches!(provided, Err(HandleError::Closed { .. })));
    assert!(matches!(requested, Err(HandleError::Closed { .. })));
    assert!(provider.close().is_ok());
    assert_eq!(calls(&log), vec!["caller.close"]);
}

/// **VALUE**: Verifies every adapter gets a distinct identity.
///
/// **BUG THIS CATCHES**: Would catch a constant or reused id, which would make
/// `release_provider()` remove the wrong connection.
#[test]
fn given_two_providers_when_created_then_ids_differ() {
    let log = call_log();
    let (first, _) = provider(&log);
    let (second, _) = provider(&log);

    assert_ne!(first.id(), second.id());
    assert_eq!(first.url().as_str(), "caller:test");
}
