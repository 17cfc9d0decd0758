use duet_core::{ConnectionId, ServerMessage};

use crate::integration::{create_test_lobby, init_tracing};
use crate::utils::{MESSAGE_TIMEOUT_MS, send_join, wait_for_await_offer, wait_for_send_offer};

#[tokio::test]
async fn test_unreachable_participant_is_skipped() {
    init_tracing();

    let lobby = create_test_lobby();
    let ada = ConnectionId::new();
    let bob = ConnectionId::new();
    let cy = ConnectionId::new();

    // Ada's socket dies before she even hears the lobby message, so she is
    // marked offline and never matched.
    lobby.signaling.make_unreachable(ada).await;
    send_join(&lobby.cmd_tx, ada, "Ada").await.expect("Join failed");
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(MESSAGE_TIMEOUT_MS);
    while lobby.signaling.dropped_for(&ada).await.is_empty() {
        assert!(std::time::Instant::now() < deadline, "Ada was never admitted");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    send_join(&lobby.cmd_tx, bob, "Bob").await.expect("Join failed");
    lobby
        .signaling
        .wait_for(&bob, MESSAGE_TIMEOUT_MS, |m| *m == ServerMessage::Lobby)
        .await
        .expect("Bob should reach the lobby");

    send_join(&lobby.cmd_tx, cy, "Cy").await.expect("Join failed");

    let room = wait_for_send_offer(&lobby.signaling, &bob)
        .await
        .expect("Bob should be matched with Cy");
    assert_eq!(
        wait_for_await_offer(&lobby.signaling, &cy).await.ok(),
        Some(room)
    );
    assert!(lobby.signaling.messages_for(&ada).await.is_empty());
}
