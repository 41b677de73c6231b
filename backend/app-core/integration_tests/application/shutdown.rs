use crate::helpers::{
    NoopDelegate, RecordingDelegate, StubBridge, StubEndpoint, StubShell, application, call_log,
    calls, url,
};

use app_core::Application;
use app_core::application::CloseTarget;
use app_core::error::{HandleError, LifecycleError};

/// Tests that quit keeps going when closes fail and reports every failure.
///
/// **VALUE**: One stuck peer cannot keep the others (or the host) waiting.
///
/// **WHY THIS MATTERS**: The host only learns the application is gone from
/// the bridge signal; skipping it on error would leave a zombie.
///
/// **BUG THIS CATCHES**: Would catch quit bailing out at the first failure.
#[test]
fn given_failing_closes_when_quit_then_all_steps_run_and_failures_reported() {
    // GIVEN: A shell and the middle provider that both refuse to close
    let log = call_log();
    let mut app = Application::new(
        StubShell::failing(&log),
        StubBridge::boxed(&log),
        url("app:test"),
        NoopDelegate,
    );
    app.accept_connection(url("caller:p0"), StubEndpoint::boxed("p0", &log))
        .expect("accept should succeed");
    let stuck = app
        .accept_connection(url("caller:p1"), Box::new(StubEndpoint::failing("p1", &log)))
        .expect("accept should succeed");
    app.accept_connection(url("caller:p2"), StubEndpoint::boxed("p2", &log))
        .expect("accept should succeed");

    // WHEN: The application quits
    let result = app.quit();

    // THEN: Every close was attempted and the bridge still got signalled
    assert_eq!(
        calls(&log),
        vec!["shell.close", "p0.close", "p1.close", "p2.close", "bridge.quit"]
    );

    // AND: Both failures are reported against their targets
    let failures = match result {
        Err(LifecycleError::Shutdown { failures, .. }) => failures,
        other => panic!("Expected Shutdown error, got {other:?}"),
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].target, CloseTarget::Shell);
    assert_eq!(
        failures[1].target,
        CloseTarget::Provider {
            id: stuck,
            url: url("caller:p1"),
        }
    );
    assert!(matches!(failures[1].error, HandleError::Transport { .. }));

    // AND: The application is terminated regardless
    assert!(app.is_terminated());
    assert!(app.providers().is_empty());
}

/// Tests that releasing a provider closes only that one and keeps order.
///
/// **BUG THIS CATCHES**: Would catch release closing the wrong peer, or
/// quit closing an already released provider a second time.
#[test]
fn given_three_providers_when_middle_released_then_only_it_closes() {
    // GIVEN: Three tracked providers
    let log = call_log();
    let mut app = application(&log, NoopDelegate);
    let ids: Vec<_> = ["p0", "p1", "p2"]
        .iter()
        .map(|label| {
            app.accept_connection(url(&format!("caller:{label}")), StubEndpoint::boxed(label, &log))
                .expect("accept should succeed")
        })
        .collect();

    // WHEN: The middle one is released, then the application quits
    app.release_provider(ids[1]).expect("release should succeed");
    let remaining: Vec<_> = app.providers().iter().map(|p| p.id()).collect();
    let report = app.quit().expect("quit should succeed");

    // THEN: Order of the rest is kept and p1 closed exactly once
    assert_eq!(remaining, vec![ids[0], ids[2]]);
    assert_eq!(report.providers_closed, 2);
    assert_eq!(
        calls(&log),
        vec!["p1.close", "shell.close", "p0.close", "p2.close", "bridge.quit"]
    );
}

/// Tests that releasing an id twice is reported, not silently ignored.
///
/// **VALUE**: Hosts that double-report a disconnect get a typed error that
/// names the missing provider.
///
/// **BUG THIS CATCHES**: Would catch a second release closing the endpoint
/// again, or removing some other provider.
#[test]
fn given_unknown_id_when_released_then_unknown_provider_error() {
    // GIVEN: A provider that was already released
    let log = call_log();
    let mut app = application(&log, NoopDelegate);
    let id = app
        .accept_connection(url("caller:once"), StubEndpoint::boxed("once", &log))
        .expect("accept should succeed");
    app.release_provider(id).expect("first release should succeed");

    // WHEN: It is released again
    let result = app.release_provider(id);

    // THEN: The id is unknown and the endpoint closed only once
    assert!(matches!(
        result,
        Err(LifecycleError::UnknownProvider { id: missing, .. }) if missing == id
    ));
    assert_eq!(calls(&log), vec!["once.close"]);
}

/// Tests the optional bound on tracked providers.
///
/// **VALUE**: A host that floods the application with connections cannot
/// grow the tracked collection without limit.
///
/// **BUG THIS CATCHES**: Would catch a rejected endpoint being leaked, or the
/// hook running for a connection that was never tracked.
#[test]
fn given_provider_limit_when_exceeded_then_rejected_until_one_released() {
    // GIVEN: An application that tracks at most two providers
    let log = call_log();
    let mut app = application(&log, RecordingDelegate::default()).with_max_providers(Some(2));
    let first = app
        .accept_connection(url("caller:p0"), StubEndpoint::boxed("p0", &log))
        .expect("accept should succeed");
    app.accept_connection(url("caller:p1"), StubEndpoint::boxed("p1", &log))
        .expect("accept should succeed");

    // WHEN: A third caller connects
    let result = app.accept_connection(url("caller:p2"), StubEndpoint::boxed("p2", &log));

    // THEN: It is refused and its endpoint closed without running the hook
    assert!(matches!(
        result,
        Err(LifecycleError::ProviderLimit { limit: 2, .. })
    ));
    assert_eq!(app.providers().len(), 2);
    assert_eq!(app.delegate().accepted().len(), 2);
    assert_eq!(calls(&log), vec!["p2.close"]);

    // WHEN: A slot frees up
    app.release_provider(first).expect("release should succeed");

    // THEN: The next caller is accepted
    app.accept_connection(url("caller:p3"), StubEndpoint::boxed("p3", &log))
        .expect("accept should succeed after release");
    assert_eq!(app.providers().len(), 2);
}
