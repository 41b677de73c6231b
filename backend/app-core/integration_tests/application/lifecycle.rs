use crate::helpers::{
    NoopDelegate, RecordingDelegate, StubEndpoint, application, call_log, calls, url,
};

use app_core::application::LifecycleState;
use app_core::error::LifecycleError;

use std::sync::{Arc, Mutex};

/// Tests that every accepted connection is tracked, in acceptance order.
///
/// **VALUE**: Shutdown closes providers in the order they were accepted.
///
/// **WHY THIS MATTERS**: The tracked collection is the only record of which
/// peers must be released on quit.
///
/// **BUG THIS CATCHES**: Would catch providers being dropped, deduplicated
/// by URL or reordered on accept.
#[test]
fn given_five_connections_when_accepted_then_five_providers_tracked_in_order() {
    // GIVEN: An application and five callers, two of them sharing a URL
    let log = call_log();
    let mut app = application(&log, RecordingDelegate::default());
    let callers = ["caller:a", "caller:b", "caller:a", "caller:c", "caller:d"];

    // WHEN: Each caller connects
    let ids: Vec<_> = callers
        .iter()
        .map(|caller| {
            app.accept_connection(url(caller), StubEndpoint::boxed(caller, &log))
                .expect("accept should succeed")
        })
        .collect();

    // THEN: Five distinct providers are tracked in acceptance order
    let tracked: Vec<_> = app.providers().iter().map(|p| p.url().to_string()).collect();
    assert_eq!(tracked, callers);
    let tracked_ids: Vec<_> = app.providers().iter().map(|p| p.id()).collect();
    assert_eq!(tracked_ids, ids);
}

/// Tests that the accept hook sees the caller URL and the adapter that wraps
/// the caller's own handle.
///
/// **VALUE**: Verifies the hook is called exactly once per connection with
/// the provider that talks to that peer.
///
/// **BUG THIS CATCHES**: Would catch the hook getting another connection's
/// adapter, or an adapter that is not bound to the delivered handle.
#[test]
fn given_connection_when_accepted_then_hook_gets_adapter_for_that_handle() {
    // GIVEN: An application whose delegate asks every peer for "storage"
    let log = call_log();
    let delegate = RecordingDelegate {
        request_from_peer: Some("storage"),
        ..Default::default()
    };
    let mut app = application(&log, delegate);

    // WHEN: A caller connects
    let id = app
        .accept_connection(url("caller:x"), StubEndpoint::boxed("x", &log))
        .expect("accept should succeed");

    // THEN: The hook ran once with the caller URL and the new provider
    let accepted = app.delegate().accepted();
    assert_eq!(accepted, vec![(String::from("caller:x"), id)]);

    // AND: The request went through the caller's own handle
    assert_eq!(calls(&log), vec!["x.connect:storage"]);
}

/// Tests the minimal end-to-end scenario with default hooks.
///
/// **VALUE**: Documents the lifecycle from construction to quit in one place.
///
/// **BUG THIS CATCHES**: Would catch quit skipping the shell, the provider
/// or the bridge, or closing them in the wrong order.
#[test]
fn given_default_hooks_when_app_accepts_then_quits_then_everything_closed_in_order() {
    // GIVEN: An application at app:test with no custom behaviour
    let log = call_log();
    let mut app = application(&log, NoopDelegate);
    assert_eq!(app.url().as_str(), "app:test");

    // WHEN: It is initialized, accepts caller:test and quits
    app.initialize(&[]).expect("initialize should succeed");
    app.accept_connection(url("caller:test"), StubEndpoint::boxed("caller", &log))
        .expect("accept should succeed");
    assert_eq!(app.providers().len(), 1);

    let report = app.quit().expect("quit should succeed");

    // THEN: Shell, provider and bridge were released exactly once, in order
    assert_eq!(report.providers_closed, 1);
    assert_eq!(calls(&log), vec!["shell.close", "caller.close", "bridge.quit"]);
    assert!(app.providers().is_empty());
    assert_eq!(app.state(), LifecycleState::Terminated);
}

/// Tests that default hooks touch no handle.
///
/// **VALUE**: An application that overrides nothing stays passive.
///
/// **BUG THIS CATCHES**: Would catch default hooks requesting or providing
/// services on their own.
#[test]
fn given_default_hooks_when_initialized_and_accepting_then_no_handle_calls() {
    // GIVEN: An application with default hooks
    let log = call_log();
    let mut app = application(&log, NoopDelegate);

    // WHEN: It initializes and accepts a connection
    app.initialize(&[String::from("--verbose")])
        .expect("initialize should succeed");
    app.accept_connection(url("caller:quiet"), StubEndpoint::boxed("quiet", &log))
        .expect("accept should succeed");

    // THEN: Nothing was called on any handle
    assert!(calls(&log).is_empty());
    assert_eq!(app.shell().connection_count(), 0);
}

/// Tests that quit closes outbound connections, then providers, then the bridge.
///
/// **VALUE**: Connections opened through the shell are part of the shell and
/// go away with it.
///
/// **BUG THIS CATCHES**: Would catch outbound connections leaking past quit.
#[test]
fn given_outbound_connection_when_quit_then_closed_with_shell_before_providers() {
    // GIVEN: An application that connected out to app:storage and accepted two peers
    let log = call_log();
    let mut app = application(&log, NoopDelegate);
    app.shell_mut()
        .connect_to_service(&url("app:storage"), "kv")
        .expect("outbound connect should succeed");
    for caller in ["p0", "p1"] {
        app.accept_connection(url(&format!("caller:{caller}")), StubEndpoint::boxed(caller, &log))
            .expect("accept should succeed");
    }

    // WHEN: The application quits
    app.quit().expect("quit should succeed");

    // THEN: Everything closed in shell, provider, bridge order
    assert_eq!(
        calls(&log),
        vec![
            "shell.connect:app:storage",
            "app:storage.connect:kv",
            "app:storage.close",
            "shell.close",
            "p0.close",
            "p1.close",
            "bridge.quit",
        ]
    );
}

/// Tests that initialize runs once and sees the process arguments.
///
/// **BUG THIS CATCHES**: Would catch a second initialize re-running the hook.
#[test]
fn given_initialized_app_when_initialized_again_then_already_initialized() {
    // GIVEN: An initialized application
    let log = call_log();
    let mut app = application(&log, RecordingDelegate::default());
    let args = vec![String::from("--port"), String::from("9000")];
    app.initialize(&args).expect("first initialize should succeed");

    // WHEN: It is initialized again
    let result = app.initialize(&args);

    // THEN: The call is rejected and the hook ran exactly once
    assert!(matches!(
        result,
        Err(LifecycleError::AlreadyInitialized { .. })
    ));
    let record = app.delegate().record.lock().unwrap();
    assert_eq!(record.initialized_with, vec![args]);
}

/// Tests that a terminated application rejects further work.
///
/// **VALUE**: No provider can be created after shutdown has released them all.
///
/// **BUG THIS CATCHES**: Would catch a connection accepted after quit that
/// then leaks, or a second quit signalling the host twice.
#[test]
fn given_quit_app_when_more_operations_arrive_then_rejected_and_endpoint_closed() {
    // GIVEN: An application that has quit
    let log = call_log();
    let mut app = application(&log, RecordingDelegate::default());
    app.quit().expect("quit should succeed");

    // WHEN: A late connection arrives
    let accept = app.accept_connection(url("caller:late"), StubEndpoint::boxed("late", &log));

    // THEN: It is rejected, closed and never reaches the hook
    assert!(matches!(accept, Err(LifecycleError::Terminated { .. })));
    assert!(app.providers().is_empty());
    assert!(app.delegate().accepted().is_empty());

    // WHEN: Quit and initialize are tried again
    let second_quit = app.quit();
    let late_init = app.initialize(&[]);

    // THEN: Both are rejected and the bridge was signalled once
    assert!(matches!(second_quit, Err(LifecycleError::Terminated { .. })));
    assert!(matches!(late_init, Err(LifecycleError::Terminated { .. })));
    assert_eq!(calls(&log), vec!["shell.close", "bridge.quit", "late.close"]);
}

/// Tests that a hook can ask the application to quit.
///
/// **BUG THIS CATCHES**: Would catch the quit request being lost between the
/// hook and the owner.
#[test]
fn given_hook_requests_quit_when_accepting_then_quit_flag_set_until_quit_runs() {
    // GIVEN: A delegate that asks to quit after the first connection
    let log = call_log();
    let delegate = RecordingDelegate {
        quit_after: Some(1),
        ..Default::default()
    };
    let mut app = application(&log, delegate);

    // WHEN: A connection is accepted
    app.accept_connection(url("caller:one"), StubEndpoint::boxed("one", &log))
        .expect("accept should succeed");

    // THEN: The request is visible and cleared by quit
    assert!(app.quit_requested());
    app.quit().expect("quit should succeed");
    assert!(!app.quit_requested());
}

/// Tests that services provided from the accept hook serve later requests.
///
/// **BUG THIS CATCHES**: Would catch requests routed to the wrong provider.
#[test]
fn given_provided_service_when_peer_requests_it_then_factory_gets_pipe() {
    // GIVEN: A delegate that provides "echo" on every connection
    let log = call_log();
    let sink = Arc::new(Mutex::new(Vec::new()));
    let delegate = RecordingDelegate {
        provide: Some(("echo", Arc::clone(&sink))),
        ..Default::default()
    };
    let mut app = application(&log, delegate);
    let id = app
        .accept_connection(url("caller:echo"), StubEndpoint::boxed("echo", &log))
        .expect("accept should succeed");

    // WHEN: The peer requests "echo" through the application
    let (local, remote) = app_core::pipe::message_pipe();
    app.handle_service_request(id, "echo", remote)
        .expect("request should be routed");

    // THEN: The factory received the pipe, and it is connected
    let mut served = sink.lock().unwrap();
    assert_eq!(served.len(), 1);
    local.send(b"ping".to_vec()).expect("peer should be open");
    assert_eq!(served[0].try_recv().unwrap(), Some(b"ping".to_vec()));
}
