use duet_core::{ServerMessage, SessionId};

use crate::integration::{create_test_lobby, init_tracing};
use crate::utils::join_pair;

#[tokio::test]
async fn test_two_participants_are_paired() {
    init_tracing();

    let lobby = create_test_lobby();

    let (ada, bob, room) = join_pair(&lobby.cmd_tx, &lobby.signaling, "Ada", "Bob")
        .await
        .expect("Pairing failed");

    assert_eq!(room, SessionId(1));
    assert_eq!(
        lobby.signaling.messages_for(&ada).await,
        vec![ServerMessage::Lobby, ServerMessage::SendOffer { room_id: room }]
    );
    assert_eq!(
        lobby.signaling.messages_for(&bob).await,
        vec![ServerMessage::Lobby, ServerMessage::AwaitOffer { room_id: room }]
    );
}

#[tokio::test]
async fn test_room_is_recorded_in_history() {
    init_tracing();

    let lobby = create_test_lobby();

    let (ada, bob, room) = join_pair(&lobby.cmd_tx, &lobby.signaling, "Ada", "Bob")
        .await
        .expect("Pairing failed");

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    let stored = loop {
        if let Some(stored) = lobby.directory.session(room) {
            break stored;
        }
        assert!(std::time::Instant::now() < deadline, "Room never persisted");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    };

    assert_eq!(stored.record.initiator.connection_id, ada);
    assert_eq!(stored.record.initiator.identity_key, "ada@uni.edu");
    assert_eq!(stored.record.responder.connection_id, bob);
    assert_eq!(stored.ended_at, None);
}
