use crate::error::LobbyError;
use crate::lobby::effect::Delivery;
use crate::matchmaking::{ParticipantRegistry, SessionTable};
use duet_core::{CandidateRole, ParticipantId, ServerMessage, SessionId};
use serde_json::Value;

/// A connection-setup payload on its way to the other session member.
#[derive(Debug, Clone, PartialEq)]
pub enum RelaySignal {
    Offer { sdp: Value },
    Answer { sdp: Value },
    IceCandidate { candidate: Value, role: CandidateRole },
}

/// Read-only router from a sender to the other member of its session.
///
/// Payloads are never inspected. A message for a missing session, from a
/// non-member, or for a peer that went offline comes back as
/// `StaleReference` for the caller to log and drop.
pub struct SignalingRelay<'a> {
    sessions: &'a SessionTable,
    registry: &'a ParticipantRegistry,
}

impl<'a> SignalingRelay<'a> {
    pub fn new(sessions: &'a SessionTable, registry: &'a ParticipantRegistry) -> Self {
        Self { sessions, registry }
    }

    pub fn relay_offer(
        &self,
        session_id: SessionId,
        sender: ParticipantId,
        sdp: Value,
    ) -> Result<Delivery, LobbyError> {
        let to = self.receiver(session_id, &sender)?;
        Ok(Delivery {
            to,
            message: ServerMessage::Offer {
                sdp,
                room_id: session_id,
            },
        })
    }

    pub fn relay_answer(
        &self,
        session_id: SessionId,
        sender: ParticipantId,
        sdp: Value,
    ) -> Result<Delivery, LobbyError> {
        let to = self.receiver(session_id, &sender)?;
        Ok(Delivery {
            to,
            message: ServerMessage::Answer {
                sdp,
                room_id: session_id,
            },
        })
    }

    pub fn relay_candidate(
        &self,
        session_id: SessionId,
        sender: ParticipantId,
        candidate: Value,
        role: CandidateRole,
    ) -> Result<Delivery, LobbyError> {
        let to = self.receiver(session_id, &sender)?;
        Ok(Delivery {
            to,
            message: ServerMessage::AddIceCandidate {
                candidate,
                room_id: session_id,
                role,
            },
        })
    }

    pub fn relay(
        &self,
        session_id: SessionId,
        sender: ParticipantId,
        signal: RelaySignal,
    ) -> Result<Delivery, LobbyError> {
        match signal {
            RelaySignal::Offer { sdp } => self.relay_offer(session_id, sender, sdp),
            RelaySignal::Answer { sdp } => self.relay_answer(session_id, sender, sdp),
            RelaySignal::IceCandidate { candidate, role } => {
                self.relay_candidate(session_id, sender, candidate, role)
            }
        }
    }

    fn receiver(
        &self,
        session_id: SessionId,
        sender: &ParticipantId,
    ) -> Result<ParticipantId, LobbyError> {
        if self.sessions.get(session_id).is_none() {
            return Err(LobbyError::StaleReference(format!(
                "room {session_id} not found"
            )));
        }
        let Some(other) = self.sessions.other_participant(session_id, sender) else {
            return Err(LobbyError::StaleReference(format!(
                "{sender} is not a member of room {session_id}"
            )));
        };
        if !self.registry.is_live(&other) {
            return Err(LobbyError::StaleReference(format!(
                "peer {other} in room {session_id} is offline"
            )));
        }
        Ok(other)
    }
}
