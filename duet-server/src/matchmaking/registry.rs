use crate::error::LobbyError;
use duet_core::{ConnectionId, ParticipantId};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

pub const MAX_NAME_CHARS: usize = 50;

/// What a participant brings to the lobby once their identity is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantProfile {
    /// Normalized e-mail; the key bans and reports are recorded under.
    pub identity_key: String,
    pub display_name: String,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub identity_key: String,
    pub display_name: String,
    pub interests: BTreeSet<String>,
    live: bool,
}

impl Participant {
    pub fn is_live(&self) -> bool {
        self.live
    }
}

/// Checks a display name is at most [`MAX_NAME_CHARS`] characters as sent,
/// padding included, and non-empty once trimmed. Returns the trimmed name.
pub fn validate_display_name(name: &str) -> Result<String, LobbyError> {
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(LobbyError::InvalidInput("Name is too long".into()));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(LobbyError::InvalidInput("Name is required".into()));
    }
    Ok(name.to_owned())
}

/// Every currently connected participant, keyed by connection.
///
/// The only owner of `Participant` values; the queue and the session table
/// hold ids.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<ConnectionId, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        profile: ParticipantProfile,
    ) -> Result<ParticipantId, LobbyError> {
        let display_name = validate_display_name(&profile.display_name)?;

        if self.participants.contains_key(&connection_id) {
            return Err(LobbyError::InvalidInput("You have already joined".into()));
        }

        let interests = profile
            .interests
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        info!(%connection_id, name = %display_name, "Participant registered");

        self.participants.insert(
            connection_id,
            Participant {
                id: connection_id,
                identity_key: profile.identity_key,
                display_name,
                interests,
                live: true,
            },
        );
        Ok(connection_id)
    }

    /// Removes the participant. Calling it for an absent id is a no-op.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        let removed = self.participants.remove(connection_id);
        if removed.is_some() {
            info!(%connection_id, "Participant unregistered");
        }
        removed
    }

    pub fn is_live(&self, connection_id: &ConnectionId) -> bool {
        self.participants
            .get(connection_id)
            .is_some_and(Participant::is_live)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.participants.contains_key(connection_id)
    }

    /// Flags a participant whose connection can no longer be written to.
    /// They stay registered until their disconnect event arrives.
    pub fn mark_offline(&mut self, connection_id: &ConnectionId) {
        if let Some(participant) = self.participants.get_mut(connection_id) {
            if participant.live {
                debug!(%connection_id, "Participant marked offline");
            }
            participant.live = false;
        }
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants.get(connection_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
