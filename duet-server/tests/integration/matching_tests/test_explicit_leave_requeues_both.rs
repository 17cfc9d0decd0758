use duet_core::{ServerMessage, SessionId};
use duet_server::LobbyCommand;

use crate::integration::{create_test_lobby, init_tracing};
use crate::utils::{MESSAGE_TIMEOUT_MS, join_pair};

#[tokio::test]
async fn test_explicit_leave_requeues_both() {
    init_tracing();

    let lobby = create_test_lobby();
    let (ada, bob, room) = join_pair(&lobby.cmd_tx, &lobby.signaling, "Ada", "Bob")
        .await
        .expect("Pairing failed");

    lobby
        .cmd_tx
        .send(LobbyCommand::Leave { connection_id: bob })
        .await
        .expect("Leave failed");

    // Nobody else is waiting, so the two of them meet again in a new room.
    let next = SessionId(2);
    assert!(
        lobby
            .signaling
            .wait_for_count(&bob, 4, MESSAGE_TIMEOUT_MS)
            .await
    );
    assert_eq!(
        lobby.signaling.messages_for(&ada).await,
        vec![
            ServerMessage::Lobby,
            ServerMessage::SendOffer { room_id: room },
            ServerMessage::UserDisconnected,
            ServerMessage::Lobby,
            ServerMessage::SendOffer { room_id: next },
        ]
    );
    assert_eq!(
        lobby.signaling.messages_for(&bob).await,
        vec![
            ServerMessage::Lobby,
            ServerMessage::AwaitOffer { room_id: room },
            ServerMessage::Lobby,
            ServerMessage::AwaitOffer { room_id: next },
        ]
    );
}

#[tokio::test]
async fn test_leave_while_waiting_is_ignored() {
    init_tracing();

    let lobby = create_test_lobby();
    let ada = duet_core::ConnectionId::new();
    crate::utils::send_join(&lobby.cmd_tx, ada, "Ada")
        .await
        .expect("Join failed");
    lobby
        .signaling
        .wait_for(&ada, MESSAGE_TIMEOUT_MS, |m| *m == ServerMessage::Lobby)
        .await
        .expect("Ada should reach the lobby");

    lobby
        .cmd_tx
        .send(LobbyCommand::Leave { connection_id: ada })
        .await
        .expect("Leave failed");
    tokio::time::sleep(std::time::Duration::from_millis(crate::utils::QUIET_PERIOD_MS)).await;

    assert_eq!(
        lobby.signaling.messages_for(&ada).await,
        vec![ServerMessage::Lobby]
    );
}
