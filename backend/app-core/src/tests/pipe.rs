// Unit tests for in-process message pipes

use crate::error::handle::HandleError;
use crate::pipe::message_pipe;

/// **VALUE**: Verifies messages cross the pipe in both directions and in order.
///
/// **WHY THIS MATTERS**: Every service request carries a pipe. If messages were
/// reordered or only flowed one way, request/response services would break.
///
/// **BUG THIS CATCHES**: Would catch crossed channel wiring in `message_pipe()`
/// (an endpoint receiving its own messages).
#[tokio::test]
async fn given_pipe_when_both_sides_send_then_each_receives_peer_messages_in_order() {
    // GIVEN: A connected pair
    let (mut left, mut right) = message_pipe();

    // WHEN: Both sides send
    left.send(b"one".to_vec()).unwrap();
    left.send(b"two".to_vec()).unwrap();
    right.send(b"reply".to_vec()).unwrap();

    // THEN: Each side reads the peer's messages in order
    assert_eq!(right.recv().await.unwrap(), b"one");
    assert_eq!(right.recv().await.unwrap(), b"two");
    assert_eq!(left.recv().await.unwrap(), b"reply");
}

/// **VALUE**: Verifies a dropped peer is reported instead of silently losing data.
///
/// **BUG THIS CATCHES**: Would catch if `send()` ignored the channel error and
/// returned Ok after the peer was gone.
#[test]
fn given_dropped_peer_when_sending_then_returns_peer_closed() {
    // GIVEN: A pipe whose right side is dropped
    let (left, right) = message_pipe();
    drop(right);

    // WHEN: Sending from the left
    let result = left.send(b"lost".to_vec());

    // THEN: PeerClosed, and the endpoint reports it
    assert!(matches!(result, Err(HandleError::PeerClosed { .. })));
    assert!(left.is_peer_closed());
}

/// **VALUE**: Verifies `try_recv()` distinguishes "nothing yet" from "peer gone".
///
/// **BUG THIS CATCHES**: Would catch if an empty queue were reported as a
/// closed pipe, which would make polling services shut down early.
#[test]
fn given_open_empty_pipe_when_try_recv_then_returns_none_until_peer_drops() {
    // GIVEN: An open pipe with nothing queued
    let (mut left, right) = message_pipe();

    // WHEN/THEN: Empty queue yields Ok(None)
    assert!(matches!(left.try_recv(), Ok(None)));

    // WHEN: Peer sends then drops
    right.send(b"last".to_vec()).unwrap();
    drop(right);

    // THEN: The queued message is still delivered, then PeerClosed
    assert_eq!(left.try_recv().unwrap(), Some(b"last".to_vec()));
    assert!(matches!(left.try_recv(), Err(HandleError::PeerClosed { .. })));
}
