use duet_core::{ConnectionId, ServerMessage};
use duet_server::LobbyCommand;

use crate::integration::{create_test_lobby, init_tracing};
use crate::utils::{MESSAGE_TIMEOUT_MS, QUIET_PERIOD_MS, send_join, wait_for_error};

#[tokio::test]
async fn test_verified_participant_waits_in_lobby() {
    init_tracing();

    let lobby = create_test_lobby();
    let ada = ConnectionId::new();

    send_join(&lobby.cmd_tx, ada, "Ada")
        .await
        .expect("Join failed");

    assert!(
        lobby
            .signaling
            .wait_for_count(&ada, 1, MESSAGE_TIMEOUT_MS)
            .await,
        "Ada should hear back"
    );
    tokio::time::sleep(std::time::Duration::from_millis(QUIET_PERIOD_MS)).await;

    // Alone in the queue: lobby and nothing else.
    assert_eq!(
        lobby.signaling.messages_for(&ada).await,
        vec![ServerMessage::Lobby]
    );
}

#[tokio::test]
async fn test_second_join_on_same_connection_is_refused() {
    init_tracing();

    let lobby = create_test_lobby();
    let ada = ConnectionId::new();

    send_join(&lobby.cmd_tx, ada, "Ada")
        .await
        .expect("Join failed");
    send_join(&lobby.cmd_tx, ada, "Ada")
        .await
        .expect("Join failed");

    let error = wait_for_error(&lobby.signaling, &ada)
        .await
        .expect("Repeat join should be refused");
    assert_eq!(error, "You have already joined");

    // Exactly one lobby message: the first join still goes through.
    lobby
        .signaling
        .wait_for(&ada, MESSAGE_TIMEOUT_MS, |m| *m == ServerMessage::Lobby)
        .await
        .expect("First join should be admitted");
    tokio::time::sleep(std::time::Duration::from_millis(QUIET_PERIOD_MS)).await;
    let lobbies = lobby
        .signaling
        .messages_for(&ada)
        .await
        .into_iter()
        .filter(|m| *m == ServerMessage::Lobby)
        .count();
    assert_eq!(lobbies, 1);

    lobby
        .cmd_tx
        .send(LobbyCommand::Disconnect { connection_id: ada })
        .await
        .expect("Disconnect failed");
}
