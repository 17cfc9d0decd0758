use crate::lobby::LobbyCommand;
use crate::signaling::ConnectionTable;
use duet_core::RtcConfiguration;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// What the WebSocket handlers share: the connection table, the ICE
/// configuration served to clients, and the way into the lobby.
///
/// Handlers register their outbound channel in the table and forward parsed
/// client messages to the lobby; the lobby writes back through the table.
#[derive(Clone)]
pub struct SignalingService {
    connections: ConnectionTable,
    rtc_configuration: Arc<RtcConfiguration>,
    lobby_tx: mpsc::Sender<LobbyCommand>,
}

impl SignalingService {
    pub fn new(
        lobby_tx: mpsc::Sender<LobbyCommand>,
        connections: ConnectionTable,
        rtc_configuration: RtcConfiguration,
    ) -> Self {
        Self {
            connections,
            rtc_configuration: Arc::new(rtc_configuration),
            lobby_tx,
        }
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    pub fn rtc_configuration(&self) -> &RtcConfiguration {
        &self.rtc_configuration
    }

    /// Hands a command to the lobby. Returns `false` once the lobby has
    /// shut down.
    pub async fn submit(&self, cmd: LobbyCommand) -> bool {
        match self.lobby_tx.send(cmd).await {
            Ok(()) => true,
            Err(e) => {
                error!("Lobby is gone: {}", e);
                false
            }
        }
    }
}
