use crate::helpers::{NoopDelegate, RecordingDelegate, StubEndpoint, application, call_log, calls, url};

use app_core::error::LifecycleError;
use app_core::pipe::message_pipe;
use app_core::runner::{HostEvent, spawn_application};

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// Tests the full host conversation through the runner.
///
/// **VALUE**: Every event reaches the application in send order and the task
/// resolves to the quit result.
///
/// **BUG THIS CATCHES**: Would catch the actor dropping events or finishing
/// before quit ran.
#[tokio::test]
async fn given_running_app_when_host_accepts_then_quits_then_task_reports_clean_quit() {
    // GIVEN: A running application
    let log = call_log();
    let (handle, task) = spawn_application(application(&log, RecordingDelegate::default()), 8);

    // WHEN: The host initializes, delivers two connections and quits
    handle
        .initialize(vec![String::from("--demo")])
        .await
        .expect("initialize should be delivered");
    let first = handle
        .accept_connection(url("caller:one"), StubEndpoint::boxed("one", &log))
        .await
        .expect("first accept should succeed");
    let second = handle
        .accept_connection(url("caller:two"), StubEndpoint::boxed("two", &log))
        .await
        .expect("second accept should succeed");
    handle.quit().await.expect("quit should be delivered");

    // THEN: The task reports both providers closed, in order
    let report = task
        .await
        .expect("actor should not panic")
        .expect("quit should succeed");
    assert_ne!(first, second);
    assert_eq!(report.providers_closed, 2);
    assert_eq!(
        calls(&log),
        vec!["shell.close", "one.close", "two.close", "bridge.quit"]
    );
}

/// Tests that service requests reach the factory provided in the accept hook.
///
/// **BUG THIS CATCHES**: Would catch requests being routed by URL instead of
/// by provider id.
#[tokio::test]
async fn given_provided_service_when_host_routes_request_then_factory_receives_pipe() {
    // GIVEN: A running application that provides "echo" on every connection
    let log = call_log();
    let sink = Arc::new(Mutex::new(Vec::new()));
    let delegate = RecordingDelegate {
        provide: Some(("echo", Arc::clone(&sink))),
        ..Default::default()
    };
    let (handle, task) = spawn_application(application(&log, delegate), 8);
    let id = handle
        .accept_connection(url("caller:echo"), StubEndpoint::boxed("echo", &log))
        .await
        .expect("accept should succeed");

    // WHEN: The peer requests "echo" and the host quits
    let (local, remote) = message_pipe();
    handle
        .request_service(id, "echo", remote)
        .await
        .expect("request should be delivered");
    handle.quit().await.expect("quit should be delivered");
    task.await
        .expect("actor should not panic")
        .expect("quit should succeed");

    // THEN: The factory got the pipe before quit
    let mut served = sink.lock().unwrap();
    assert_eq!(served.len(), 1);
    local.send(b"hi".to_vec()).expect("served end is still held");
    assert_eq!(served[0].try_recv().unwrap(), Some(b"hi".to_vec()));
}

/// Tests that a quit requested from a hook stops the runner.
///
/// **VALUE**: The application can end its own life without the host
/// sending `Quit`.
///
/// **BUG THIS CATCHES**: Would catch the runner ignoring the request, or a
/// late connection being accepted after the application quit.
#[tokio::test]
async fn given_hook_requests_quit_when_accepting_then_runner_stops_and_rejects_late_connections() {
    // GIVEN: A delegate that quits after its first connection
    let log = call_log();
    let delegate = RecordingDelegate {
        quit_after: Some(1),
        ..Default::default()
    };
    let (handle, task) = spawn_application(application(&log, delegate), 8);

    // WHEN: One connection arrives
    handle
        .accept_connection(url("caller:only"), StubEndpoint::boxed("only", &log))
        .await
        .expect("accept should succeed");
    let report = task
        .await
        .expect("actor should not panic")
        .expect("quit should succeed");

    // THEN: The application quit on its own
    assert_eq!(report.providers_closed, 1);
    assert!(handle.is_closed());

    // WHEN: Another connection is delivered afterwards
    let late = handle
        .accept_connection(url("caller:late"), StubEndpoint::boxed("late", &log))
        .await;

    // THEN: It is refused and its endpoint closed
    assert!(matches!(late, Err(LifecycleError::RunnerStopped { .. })));
    assert_eq!(
        calls(&log),
        vec!["shell.close", "only.close", "bridge.quit", "late.close"]
    );
}

/// Tests that dropping every handle shuts the application down.
///
/// **BUG THIS CATCHES**: Would catch an actor that waits forever once the
/// host has gone, leaking every tracked provider.
#[tokio::test]
async fn given_all_handles_dropped_when_running_then_application_quits() {
    // GIVEN: A running application with one connection and a cloned handle
    let log = call_log();
    let (handle, task) = spawn_application(application(&log, NoopDelegate), 1);
    let clone = handle.clone();
    clone
        .accept_connection(url("caller:orphan"), StubEndpoint::boxed("orphan", &log))
        .await
        .expect("accept should succeed");

    // WHEN: Every handle is dropped
    drop(handle);
    drop(clone);

    // THEN: The application quits and releases the connection
    let report = task
        .await
        .expect("actor should not panic")
        .expect("quit should succeed");
    assert_eq!(report.providers_closed, 1);
    assert_eq!(calls(&log), vec!["shell.close", "orphan.close", "bridge.quit"]);
}

/// Tests that a disconnect reported by the host releases that provider.
///
/// **VALUE**: The tracked collection shrinks as peers go away, so long-lived
/// applications do not accumulate dead providers.
///
/// **BUG THIS CATCHES**: Would catch quit closing a released provider a
/// second time, or the disconnect event being ignored.
#[tokio::test]
async fn given_disconnected_provider_when_quit_then_it_is_not_closed_twice() {
    // GIVEN: A running application with two connections
    let log = call_log();
    let (handle, task) = spawn_application(application(&log, NoopDelegate), 4);
    let gone = handle
        .accept_connection(url("caller:gone"), StubEndpoint::boxed("gone", &log))
        .await
        .expect("accept should succeed");
    handle
        .accept_connection(url("caller:kept"), StubEndpoint::boxed("kept", &log))
        .await
        .expect("accept should succeed");

    // WHEN: The host reports the first peer gone, then quits
    handle
        .provider_disconnected(gone)
        .await
        .expect("disconnect should be delivered");
    handle.quit().await.expect("quit should be delivered");
    let report = task
        .await
        .expect("actor should not panic")
        .expect("quit should succeed");

    // THEN: The released provider closed once, before the quit sequence
    assert_eq!(report.providers_closed, 1);
    assert_eq!(
        calls(&log),
        vec!["gone.close", "shell.close", "kept.close", "bridge.quit"]
    );
}

/// Tests that a stopped runner refuses events instead of hanging.
///
/// **VALUE**: Hosts get a typed error when they talk to an application that
/// has already gone.
///
/// **BUG THIS CATCHES**: Would catch a second quit reaching the host bridge
/// again, or a send that waits forever on a closed channel.
#[tokio::test]
async fn given_stopped_runner_when_quit_sent_then_runner_stopped_error() {
    // GIVEN: An application that has quit
    let log = call_log();
    let (handle, task) = spawn_application(application(&log, NoopDelegate), 1);
    handle.quit().await.expect("quit should be delivered");
    task.await
        .expect("actor should not panic")
        .expect("quit should succeed");

    // WHEN: Quit is sent again
    let result = handle.quit().await;

    // THEN: The runner reports it stopped and the bridge was signalled once
    assert!(matches!(result, Err(LifecycleError::RunnerStopped { .. })));
    assert_eq!(calls(&log), vec!["shell.close", "bridge.quit"]);
}

/// Tests that a connection queued behind a quit is released, not tracked.
///
/// **VALUE**: Closes the race between a host delivering a connection and the
/// application shutting down: the late endpoint is closed after the quit
/// sequence and its waiter learns the application is gone.
///
/// **WHY THIS MATTERS**: Without the drain, an endpoint that was already in
/// the channel when quit ran would stay open with nobody tracking it.
///
/// **BUG THIS CATCHES**: Would catch the actor returning after quit without
/// draining events still in the channel.
#[tokio::test]
async fn given_accept_queued_behind_quit_when_runner_stops_then_endpoint_closed_after_bridge() {
    // GIVEN: A running application with room for several queued events
    let log = call_log();
    let (handle, task) = spawn_application(application(&log, NoopDelegate), 8);

    // WHEN: Quit is sent, then a connection is queued behind it
    handle.quit().await.expect("quit should be delivered");
    let (reply_tx, reply_rx) = oneshot::channel();
    handle
        .send(HostEvent::AcceptConnection {
            url: url("caller:queued"),
            endpoint: StubEndpoint::boxed("queued", &log),
            reply: Some(reply_tx),
        })
        .await
        .expect("connection should be queued before the actor runs");
    let report = task
        .await
        .expect("actor should not panic")
        .expect("quit should succeed");

    // THEN: Nothing was tracked and the queued endpoint closed after quit
    assert_eq!(report.providers_closed, 0);
    assert_eq!(calls(&log), vec!["shell.close", "bridge.quit", "queued.close"]);

    // AND: Its waiter was told the application had quit
    let reply = reply_rx.await.expect("reply should be sent on discard");
    assert!(matches!(reply, Err(LifecycleError::Terminated { .. })));
}
