use crate::model::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Browser-facing `RTCConfiguration` subset served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtcConfiguration {
    pub ice_servers: Vec<IceServerConfig>,
}

/// Which side of the session produced an ICE candidate.
///
/// Forwarded untouched so the receiving peer can route the candidate to the
/// right local peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateRole {
    #[serde(rename = "sender", alias = "initiator")]
    Initiator,
    #[serde(rename = "receiver", alias = "responder")]
    Responder,
}

/// Messages a client may send. Parsed once at ingress; anything that does
/// not match one of these shapes is rejected before reaching the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    Join {
        email: String,
        name: String,
        #[serde(default)]
        interests: Vec<String>,
    },
    Offer {
        sdp: Value,
        room_id: SessionId,
    },
    Answer {
        sdp: Value,
        room_id: SessionId,
    },
    AddIceCandidate {
        candidate: Value,
        room_id: SessionId,
        #[serde(alias = "type")]
        role: CandidateRole,
    },
    DisconnectRoom,
    ReportUser {
        room_id: SessionId,
    },
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    VerificationRequired {
        email: String,
    },
    /// Waiting for a partner.
    Lobby,
    /// Paired; build an offer for this room.
    SendOffer {
        room_id: SessionId,
    },
    /// Paired; the partner will send the offer for this room.
    AwaitOffer {
        room_id: SessionId,
    },
    Offer {
        sdp: Value,
        room_id: SessionId,
    },
    Answer {
        sdp: Value,
        room_id: SessionId,
    },
    AddIceCandidate {
        candidate: Value,
        room_id: SessionId,
        role: CandidateRole,
    },
    ReportSuccess,
    /// The partner left; a `Lobby` follows once re-queued.
    UserDisconnected,
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
