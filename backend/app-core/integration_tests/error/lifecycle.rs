use app_core::error::{CoreError, HandleError, LifecycleError};

/// Tests that converting a handle error records where the conversion happened.
///
/// **VALUE**: Logs point at the call site that hit the failure, not at the
/// error type's own module.
///
/// **BUG THIS CATCHES**: Would catch `#[track_caller]` being dropped from the
/// `From` impl.
#[test]
fn given_handle_error_when_converted_then_location_is_call_site() {
    // GIVEN: A handle failure
    let source = HandleError::peer_closed("peer went away");

    // WHEN: It is lifted into a lifecycle error here
    let error = LifecycleError::from(source);

    // THEN: The location names this file and the message keeps the cause
    let LifecycleError::Handle { location, .. } = &error else {
        panic!("Expected Handle variant, got {error:?}");
    };
    assert!(location.file.contains("integration_tests"));
    assert!(error.to_string().contains("peer went away"));
}

#[test]
fn given_lifecycle_error_when_wrapped_in_core_error_then_display_is_transparent() {
    let error = LifecycleError::terminated("application has quit");
    let expected = error.to_string();

    let core = CoreError::from(error);

    assert_eq!(core.to_string(), expected);
    assert!(expected.starts_with("Terminated Error: application has quit ["));
}
