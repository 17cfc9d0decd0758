use anyhow::{Context, Result};
use duet_core::{ConnectionId, ServerMessage, SessionId};
use duet_server::LobbyCommand;
use tokio::sync::mpsc;

use super::mock_signaling::MockSignalingOutput;

/// Timeout for a message to reach the mock signaling output (ms).
pub const MESSAGE_TIMEOUT_MS: u64 = 2000;

/// Timeout for asserting that something did NOT happen (ms).
pub const QUIET_PERIOD_MS: u64 = 150;

pub fn test_email(name: &str) -> String {
    format!("{}@uni.edu", name.to_lowercase())
}

pub async fn send_join(
    cmd_tx: &mpsc::Sender<LobbyCommand>,
    connection_id: ConnectionId,
    name: &str,
) -> Result<()> {
    cmd_tx
        .send(LobbyCommand::Join {
            connection_id,
            email: test_email(name),
            name: name.to_owned(),
            interests: vec![],
        })
        .await
        .context("Failed to send Join")
}

/// Wait until `id` is told to start an offer and return the room.
pub async fn wait_for_send_offer(
    signaling: &MockSignalingOutput,
    id: &ConnectionId,
) -> Result<SessionId> {
    match signaling
        .wait_for(id, MESSAGE_TIMEOUT_MS, |m| {
            matches!(m, ServerMessage::SendOffer { .. })
        })
        .await
    {
        Some(ServerMessage::SendOffer { room_id }) => Ok(room_id),
        _ => anyhow::bail!("Timeout waiting for send-offer to {id}"),
    }
}

/// Like [`wait_for_send_offer`], but ignores the room `id` was already in.
pub async fn wait_for_next_send_offer(
    signaling: &MockSignalingOutput,
    id: &ConnectionId,
    previous: SessionId,
) -> Result<SessionId> {
    match signaling
        .wait_for(id, MESSAGE_TIMEOUT_MS, |m| {
            matches!(m, ServerMessage::SendOffer { room_id } if *room_id != previous)
        })
        .await
    {
        Some(ServerMessage::SendOffer { room_id }) => Ok(room_id),
        _ => anyhow::bail!("Timeout waiting for a new send-offer to {id}"),
    }
}

/// Wait until `id` is told to expect an offer and return the room.
pub async fn wait_for_await_offer(
    signaling: &MockSignalingOutput,
    id: &ConnectionId,
) -> Result<SessionId> {
    match signaling
        .wait_for(id, MESSAGE_TIMEOUT_MS, |m| {
            matches!(m, ServerMessage::AwaitOffer { .. })
        })
        .await
    {
        Some(ServerMessage::AwaitOffer { room_id }) => Ok(room_id),
        _ => anyhow::bail!("Timeout waiting for await-offer to {id}"),
    }
}

/// Wait for an `error` message to `id` and return its text.
pub async fn wait_for_error(signaling: &MockSignalingOutput, id: &ConnectionId) -> Result<String> {
    match signaling
        .wait_for(id, MESSAGE_TIMEOUT_MS, |m| {
            matches!(m, ServerMessage::Error { .. })
        })
        .await
    {
        Some(ServerMessage::Error { message }) => Ok(message),
        _ => anyhow::bail!("Timeout waiting for error to {id}"),
    }
}

/// Join two participants, one after the other, and wait for their room.
///
/// Returns `(initiator, responder, room)`.
pub async fn join_pair(
    cmd_tx: &mpsc::Sender<LobbyCommand>,
    signaling: &MockSignalingOutput,
    first: &str,
    second: &str,
) -> Result<(ConnectionId, ConnectionId, SessionId)> {
    let a = ConnectionId::new();
    let b = ConnectionId::new();

    send_join(cmd_tx, a, first).await?;
    signaling
        .wait_for(&a, MESSAGE_TIMEOUT_MS, |m| *m == ServerMessage::Lobby)
        .await
        .context("First participant never reached the lobby")?;

    send_join(cmd_tx, b, second).await?;
    let room = wait_for_send_offer(signaling, &a).await?;
    let awaited = wait_for_await_offer(signaling, &b).await?;
    anyhow::ensure!(room == awaited, "participants were told different rooms");

    Ok((a, b, room))
}
