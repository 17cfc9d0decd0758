use crate::error::LobbyError;
use chrono::{DateTime, Duration, Utc};
use duet_core::{ParticipantId, SessionId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Hands out session ids, unique for the lifetime of the allocator.
///
/// Clones share the counter.
#[derive(Debug, Clone)]
pub struct SessionIdAllocator {
    next: Arc<AtomicU64>,
}

impl SessionIdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }

    pub fn allocate(&self) -> SessionId {
        SessionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub initiator: ParticipantId,
    pub responder: ParticipantId,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    reporters: HashSet<ParticipantId>,
}

impl Session {
    pub fn participants(&self) -> [ParticipantId; 2] {
        [self.initiator, self.responder]
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.initiator == *id || self.responder == *id
    }

    pub fn role_of(&self, id: &ParticipantId) -> Option<SessionRole> {
        if self.initiator == *id {
            Some(SessionRole::Initiator)
        } else if self.responder == *id {
            Some(SessionRole::Responder)
        } else {
            None
        }
    }

    /// The member that is not `id`, or `None` if `id` is not a member.
    pub fn other(&self, id: &ParticipantId) -> Option<ParticipantId> {
        match self.role_of(id)? {
            SessionRole::Initiator => Some(self.responder),
            SessionRole::Responder => Some(self.initiator),
        }
    }

    pub fn reporters(&self) -> &HashSet<ParticipantId> {
        &self.reporters
    }
}

/// Active sessions, with a participant index so lookups by member are O(1).
#[derive(Debug)]
pub struct SessionTable {
    ids: SessionIdAllocator,
    sessions: HashMap<SessionId, Session>,
    by_participant: HashMap<ParticipantId, SessionId>,
}

impl SessionTable {
    pub fn new(ids: SessionIdAllocator) -> Self {
        Self {
            ids,
            sessions: HashMap::new(),
            by_participant: HashMap::new(),
        }
    }

    pub fn create(
        &mut self,
        initiator: ParticipantId,
        responder: ParticipantId,
    ) -> Result<SessionId, LobbyError> {
        if initiator == responder {
            return Err(LobbyError::InvariantViolation(format!(
                "cannot pair {initiator} with itself"
            )));
        }
        for id in [initiator, responder] {
            if let Some(existing) = self.by_participant.get(&id) {
                return Err(LobbyError::InvariantViolation(format!(
                    "{id} is already in room {existing}"
                )));
            }
        }

        let id = self.ids.allocate();
        self.sessions.insert(
            id,
            Session {
                id,
                initiator,
                responder,
                created_at: Utc::now(),
                ended_at: None,
                duration: None,
                reporters: HashSet::new(),
            },
        );
        self.by_participant.insert(initiator, id);
        self.by_participant.insert(responder, id);

        info!(room_id = %id, %initiator, %responder, "Room created");
        Ok(id)
    }

    /// Removes the session and returns it with its end time filled in.
    ///
    /// Ending an unknown session logs and returns `None`; teardown races make
    /// double ends normal.
    pub fn end(&mut self, session_id: SessionId) -> Option<Session> {
        let Some(mut session) = self.sessions.remove(&session_id) else {
            warn!(room_id = %session_id, "End requested for unknown room");
            return None;
        };

        for id in session.participants() {
            self.by_participant.remove(&id);
        }

        let ended_at = Utc::now();
        session.duration = Some(ended_at - session.created_at);
        session.ended_at = Some(ended_at);

        info!(room_id = %session_id, "Room ended");
        Some(session)
    }

    pub fn find_by_participant(&self, id: &ParticipantId) -> Option<SessionId> {
        self.by_participant.get(id).copied()
    }

    pub fn other_participant(
        &self,
        session_id: SessionId,
        self_id: &ParticipantId,
    ) -> Option<ParticipantId> {
        self.sessions.get(&session_id)?.other(self_id)
    }

    /// Records `reporter` against the session. Returns `true` only when the
    /// reporter is a member and had not reported this session before.
    pub fn add_reporter(&mut self, session_id: SessionId, reporter: ParticipantId) -> bool {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return false;
        };
        if !session.contains(&reporter) {
            warn!(room_id = %session_id, %reporter, "Report from a non-member ignored");
            return false;
        }
        session.reporters.insert(reporter)
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
