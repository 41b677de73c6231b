// Unit tests for ServiceProviderProxy

use crate::error::handle::HandleError;
use crate::pipe::message_pipe;
use crate::proxy::ServiceProviderProxy;
use crate::tests::support::{StubEndpoint, call_log, calls};

/// **VALUE**: Verifies the proxy forwards service requests to the raw endpoint.
///
/// **BUG THIS CATCHES**: Would catch if `connect_to_service()` dropped the pipe
/// instead of handing it to the endpoint.
#[test]
fn given_bound_proxy_when_connecting_then_forwards_to_endpoint() {
    // GIVEN: A proxy over a recording endpoint
    let log = call_log();
    let endpoint = StubEndpoint::new("caller", &log);
    let delivered = endpoint.delivered.clone();
    let mut proxy = ServiceProviderProxy::bind(Box::new(endpoint));

    // WHEN: Requesting a service
    let (_local, remote) = message_pipe();
    proxy.connect_to_service("echo", remote).unwrap();

    // THEN: The endpoint saw the request and received the pipe
    assert_eq!(calls(&log), vec!["caller.connect:echo"]);
    assert_eq!(delivered.lock().unwrap().len(), 1);
}

/// **VALUE**: Verifies the endpoint is closed exactly once however often the
/// proxy is closed.
///
/// **WHY THIS MATTERS**: Shutdown and explicit release can both reach the same
/// proxy. A double close on a real handle is a use-after-close on the host.
///
/// **BUG THIS CATCHES**: Would catch if `close()` kept the endpoint around and
/// forwarded every call.
#[test]
fn given_closed_proxy_when_closed_again_then_endpoint_closed_once() {
    // GIVEN: A proxy
    let log = call_log();
    let mut proxy = ServiceProviderProxy::bind(Box::new(StubEndpoint::new("caller", &log)));

    // WHEN: Closing twice
    proxy.close().unwrap();
    proxy.close().unwrap();

    // THEN: One close reached the endpoint
    assert!(proxy.is_closed());
    assert_eq!(calls(&log), vec!["caller.close"]);
}

/// **VALUE**: Verifies requests after close fail with Closed.
///
/// **BUG THIS CATCHES**: Would catch a panic or silent success when a closed
/// proxy is used.
#[test]
fn given_closed_proxy_when_connecting_then_returns_closed() {
    // GIVEN: A closed proxy
    let log = call_log();
    let mut proxy = ServiceProviderProxy::bind(Box::new(StubEndpoint::new("caller", &log)));
    proxy.close().unwrap();

    // WHEN: Requesting a service
    let (_local, remote) = message_pipe();
    let result = proxy.connect_to_service("echo", remote);

    // THEN: Closed error, nothing forwarded
    assert!(matches!(result, Err(HandleError::Closed { .. })));
    assert_eq!(calls(&log), vec!["caller.close"]);
}

/// **VALUE**: Verifies a failing close is reported and still releases the endpoint.
///
/// **BUG THIS CATCHES**: Would catch if a failed close left the proxy "open"
/// so that a retry closed the endpoint a second time.
#[test]
fn given_failing_endpoint_when_closing_then_error_returned_and_proxy_closed() {
    // GIVEN: An endpoint that fails to close
    let log = call_log();
    let mut endpoint = StubEndpoint::new("caller", &log);
    endpoint.fail_close = true;
    let mut proxy = ServiceProviderProxy::bind(Box::new(endpoint));

    // WHEN: Closing twice
    let first = proxy.close();
    let second = proxy.close();

    // THEN: First reports the failure, second is a no-op
    assert!(matches!(first, Err(HandleError::Transport { .. })));
    assert!(second.is_ok());
    assert_eq!(calls(&log), vec!["caller.close"]);
}
