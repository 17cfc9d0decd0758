use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use duet_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Outbound channels of the open WebSocket connections.
///
/// This is the lobby's only way back to clients. It holds no lobby sender,
/// so the lobby stops once the HTTP side lets go of its command channel.
#[derive(Clone, Default)]
pub struct ConnectionTable {
    connections: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.connections.insert(connection_id, tx);
    }

    pub fn remove(&self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
    }

    /// Serializes `msg` onto the connection's outbound channel.
    pub fn send_message(&self, connection_id: ConnectionId, msg: &ServerMessage) -> bool {
        let Some(connection) = self.connections.get(&connection_id) else {
            warn!(%connection_id, "Attempted to send to a closed connection");
            return false;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = connection.send(Message::Text(json.into())) {
                    error!(%connection_id, "Failed to queue WS message: {}", e);
                    return false;
                }
                true
            }
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl SignalingOutput for ConnectionTable {
    async fn send(&self, to: ConnectionId, message: ServerMessage) -> bool {
        self.send_message(to, &message)
    }

    async fn close(&self, to: ConnectionId) {
        let Some((_, connection)) = self.connections.remove(&to) else {
            return;
        };
        debug!(connection_id = %to, "Closing connection");
        let _ = connection.send(Message::Close(None));
    }
}
