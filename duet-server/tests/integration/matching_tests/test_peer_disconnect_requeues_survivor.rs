use duet_core::{ConnectionId, ServerMessage, SessionId};
use duet_server::LobbyCommand;

use crate::integration::{create_test_lobby, init_tracing};
use crate::utils::{
    MESSAGE_TIMEOUT_MS, join_pair, send_join, wait_for_await_offer, wait_for_next_send_offer,
};

#[tokio::test]
async fn test_peer_disconnect_requeues_survivor() {
    init_tracing();

    let lobby = create_test_lobby();
    let (ada, bob, room) = join_pair(&lobby.cmd_tx, &lobby.signaling, "Ada", "Bob")
        .await
        .expect("Pairing failed");

    lobby
        .cmd_tx
        .send(LobbyCommand::Disconnect { connection_id: bob })
        .await
        .expect("Disconnect failed");

    assert!(
        lobby
            .signaling
            .wait_for_count(&ada, 4, MESSAGE_TIMEOUT_MS)
            .await
    );
    assert_eq!(
        lobby.signaling.messages_for(&ada).await,
        vec![
            ServerMessage::Lobby,
            ServerMessage::SendOffer { room_id: room },
            ServerMessage::UserDisconnected,
            ServerMessage::Lobby,
        ]
    );

    // A newcomer pairs with the survivor in a fresh room.
    let cy = ConnectionId::new();
    send_join(&lobby.cmd_tx, cy, "Cy").await.expect("Join failed");

    let next = wait_for_next_send_offer(&lobby.signaling, &ada, room)
        .await
        .expect("Survivor should be matched again");
    let awaited = wait_for_await_offer(&lobby.signaling, &cy)
        .await
        .expect("Newcomer should be matched");
    assert_eq!(next, SessionId(2));
    assert_eq!(awaited, next);

    // Bob's room ended in the history.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    loop {
        if lobby
            .directory
            .session(room)
            .is_some_and(|s| s.ended_at.is_some())
        {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "Room end never persisted");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_repeated_disconnect_is_harmless() {
    init_tracing();

    let lobby = create_test_lobby();
    let (ada, bob, _) = join_pair(&lobby.cmd_tx, &lobby.signaling, "Ada", "Bob")
        .await
        .expect("Pairing failed");

    for _ in 0..2 {
        lobby
            .cmd_tx
            .send(LobbyCommand::Disconnect { connection_id: bob })
            .await
            .expect("Disconnect failed");
    }

    assert!(
        lobby
            .signaling
            .wait_for_count(&ada, 4, MESSAGE_TIMEOUT_MS)
            .await
    );
    tokio::time::sleep(std::time::Duration::from_millis(crate::utils::QUIET_PERIOD_MS)).await;
    assert_eq!(lobby.signaling.messages_for(&ada).await.len(), 4);
}
