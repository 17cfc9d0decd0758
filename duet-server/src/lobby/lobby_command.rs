use crate::lobby::relay::RelaySignal;
use duet_core::{ClientMessage, ConnectionId, SessionId};

/// Commands the lobby receives from the signaling server.
#[derive(Debug)]
pub enum LobbyCommand {
    /// A client asked to enter the lobby.
    Join {
        connection_id: ConnectionId,
        email: String,
        name: String,
        interests: Vec<String>,
    },

    /// Offer, answer or ICE candidate for the other member of a room.
    Signal {
        connection_id: ConnectionId,
        session_id: SessionId,
        signal: RelaySignal,
    },

    /// `disconnect-room`: leave the current room and wait for a new partner.
    Leave { connection_id: ConnectionId },

    Report {
        connection_id: ConnectionId,
        session_id: SessionId,
    },

    /// The WebSocket connection is gone.
    Disconnect { connection_id: ConnectionId },
}

impl LobbyCommand {
    pub fn from_client(connection_id: ConnectionId, message: ClientMessage) -> Self {
        match message {
            ClientMessage::Join {
                email,
                name,
                interests,
            } => Self::Join {
                connection_id,
                email,
                name,
                interests,
            },
            ClientMessage::Offer { sdp, room_id } => Self::Signal {
                connection_id,
                session_id: room_id,
                signal: RelaySignal::Offer { sdp },
            },
            ClientMessage::Answer { sdp, room_id } => Self::Signal {
                connection_id,
                session_id: room_id,
                signal: RelaySignal::Answer { sdp },
            },
            ClientMessage::AddIceCandidate {
                candidate,
                room_id,
                role,
            } => Self::Signal {
                connection_id,
                session_id: room_id,
                signal: RelaySignal::IceCandidate { candidate, role },
            },
            ClientMessage::DisconnectRoom => Self::Leave { connection_id },
            ClientMessage::ReportUser { room_id } => Self::Report {
                connection_id,
                session_id: room_id,
            },
        }
    }
}
