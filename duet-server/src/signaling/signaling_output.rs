use async_trait::async_trait;
use duet_core::{ConnectionId, ServerMessage};

/// Implemented by the transport (the WebSocket server) so the lobby can push
/// messages to clients without knowing how they are connected.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `message` for `to`. Returns `false` when the connection is gone
    /// and the message was dropped.
    async fn send(&self, to: ConnectionId, message: ServerMessage) -> bool;

    /// Close the connection from the server side.
    async fn close(&self, to: ConnectionId);
}
