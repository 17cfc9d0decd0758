use crate::collaborators::{ParticipantSnapshot, PersistEvent, SessionRecord};
use crate::error::LobbyError;
use crate::lobby::effect::Effect;
use crate::lobby::relay::{RelaySignal, SignalingRelay};
use crate::matchmaking::{
    MatchQueue, Pair, ParticipantProfile, ParticipantRegistry, SessionIdAllocator, SessionTable,
    validate_display_name,
};
use duet_core::{ConnectionId, ParticipantId, ServerMessage, SessionId};
use tracing::{debug, error, info, warn};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    /// Registered but neither queued nor paired (e.g. gone offline).
    Connected,
    Waiting,
    Paired(SessionId),
    Disconnected,
}

/// Join, match, leave, report and disconnect transitions over the registry,
/// the match queue and the session table.
///
/// Synchronous and single-owner: every method runs to completion and returns
/// the effects it produced, in the order they must be observed. Collaborator
/// calls happen outside, before or after a transition.
#[derive(Debug)]
pub struct LifecycleController {
    registry: ParticipantRegistry,
    queue: MatchQueue,
    sessions: SessionTable,
}

impl LifecycleController {
    pub fn new(ids: SessionIdAllocator) -> Self {
        Self {
            registry: ParticipantRegistry::new(),
            queue: MatchQueue::new(),
            sessions: SessionTable::new(ids),
        }
    }

    /// Cheap checks on join fields, before identity verification starts.
    pub fn check_join(
        &self,
        connection_id: &ConnectionId,
        email: &str,
        name: &str,
    ) -> Result<(), LobbyError> {
        if email.trim().is_empty() || name.trim().is_empty() {
            return Err(LobbyError::InvalidInput(
                "Email and name are required".into(),
            ));
        }
        validate_display_name(name)?;
        if self.registry.contains(connection_id) {
            return Err(LobbyError::InvalidInput("You have already joined".into()));
        }
        Ok(())
    }

    /// Registers a verified participant, queues them and runs matching.
    pub fn admit(
        &mut self,
        connection_id: ConnectionId,
        profile: ParticipantProfile,
    ) -> Result<Vec<Effect>, LobbyError> {
        let id = self.registry.register(connection_id, profile)?;

        let mut effects = vec![Effect::deliver(id, ServerMessage::Lobby)];
        self.queue.enqueue(id);
        self.run_matching(&mut effects);
        Ok(effects)
    }

    pub fn relay(
        &self,
        sender: ParticipantId,
        session_id: SessionId,
        signal: RelaySignal,
    ) -> Vec<Effect> {
        match SignalingRelay::new(&self.sessions, &self.registry).relay(session_id, sender, signal)
        {
            Ok(delivery) => {
                debug!(%sender, to = %delivery.to, room_id = %session_id, "Relaying signal");
                vec![Effect::Deliver(delivery)]
            }
            Err(e) => {
                warn!(%sender, room_id = %session_id, error = %e, "Dropping signal");
                Vec::new()
            }
        }
    }

    /// Explicit leave: both members go back to waiting, the peer first.
    pub fn leave(&mut self, connection_id: ParticipantId) -> Vec<Effect> {
        let Some(session_id) = self.sessions.find_by_participant(&connection_id) else {
            debug!(%connection_id, "Leave requested outside a room");
            return Vec::new();
        };

        let mut effects = Vec::new();
        self.teardown(session_id, connection_id, &mut effects);

        if self.registry.is_live(&connection_id) {
            effects.push(Effect::deliver(connection_id, ServerMessage::Lobby));
            self.queue.enqueue(connection_id);
        }

        self.run_matching(&mut effects);
        effects
    }

    /// Records a report. Only the first report per member per room counts.
    pub fn report(&mut self, reporter: ParticipantId, session_id: SessionId) -> Vec<Effect> {
        if !self.sessions.add_reporter(session_id, reporter) {
            debug!(%reporter, room_id = %session_id, "Report ignored");
            return Vec::new();
        }

        let reporter_key = self.identity_key(&reporter).unwrap_or_default();
        let reported_key = self
            .sessions
            .other_participant(session_id, &reporter)
            .and_then(|other| self.identity_key(&other));

        info!(%reporter, room_id = %session_id, "Room reported");
        vec![
            Effect::deliver(reporter, ServerMessage::ReportSuccess),
            Effect::Persist(PersistEvent::ReportFiled {
                session_id,
                reporter_key,
                reported_key,
            }),
        ]
    }

    /// Connection closed. Safe to call more than once.
    pub fn disconnect(&mut self, connection_id: ParticipantId) -> Vec<Effect> {
        let removed = self.registry.unregister(&connection_id);
        self.queue.remove(&connection_id);

        let mut effects = Vec::new();
        if let Some(session_id) = self.sessions.find_by_participant(&connection_id) {
            self.teardown(session_id, connection_id, &mut effects);
            self.run_matching(&mut effects);
        } else if removed.is_none() {
            debug!(%connection_id, "Disconnect for unknown participant");
        }
        effects
    }

    /// The connection can no longer be written to; stop matching it.
    pub fn mark_offline(&mut self, connection_id: &ParticipantId) {
        self.registry.mark_offline(connection_id);
        self.queue.remove(connection_id);
    }

    pub fn state_of(&self, connection_id: &ParticipantId) -> ParticipantState {
        if !self.registry.contains(connection_id) {
            return ParticipantState::Disconnected;
        }
        if let Some(session_id) = self.sessions.find_by_participant(connection_id) {
            return ParticipantState::Paired(session_id);
        }
        if self.queue.contains(connection_id) {
            ParticipantState::Waiting
        } else {
            ParticipantState::Connected
        }
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Ends the room `departing` was in, then tells the other member and puts
    /// them back in the queue.
    fn teardown(
        &mut self,
        session_id: SessionId,
        departing: ParticipantId,
        effects: &mut Vec<Effect>,
    ) {
        let Some(session) = self.sessions.end(session_id) else {
            return;
        };

        if let (Some(ended_at), Some(duration)) = (session.ended_at, session.duration) {
            effects.push(Effect::Persist(PersistEvent::SessionEnded {
                session_id,
                ended_at,
                duration,
            }));
        }

        let Some(peer) = session.other(&departing) else {
            return;
        };
        if !self.registry.is_live(&peer) {
            debug!(%peer, room_id = %session_id, "Peer offline, not requeued");
            return;
        }

        effects.push(Effect::deliver(peer, ServerMessage::UserDisconnected));
        effects.push(Effect::deliver(peer, ServerMessage::Lobby));
        self.queue.enqueue(peer);
    }

    /// Pairs everyone it can. The participant popped second initiates.
    fn run_matching(&mut self, effects: &mut Vec<Effect>) {
        for Pair { first, second } in self.queue.drain(&self.registry) {
            let (initiator, responder) = (second, first);
            match self.sessions.create(initiator, responder) {
                Ok(room_id) => {
                    info!(%room_id, %initiator, %responder, "Participants matched");
                    effects.push(Effect::deliver(
                        initiator,
                        ServerMessage::SendOffer { room_id },
                    ));
                    effects.push(Effect::deliver(
                        responder,
                        ServerMessage::AwaitOffer { room_id },
                    ));
                    if let Some(record) = self.session_record(room_id) {
                        effects.push(Effect::Persist(PersistEvent::SessionStarted(record)));
                    }
                }
                // The queue never holds a paired participant.
                Err(e) => error!(%initiator, %responder, error = %e, "Could not open room"),
            }
        }
    }

    fn session_record(&self, session_id: SessionId) -> Option<SessionRecord> {
        let session = self.sessions.get(session_id)?;
        Some(SessionRecord {
            session_id,
            initiator: self.snapshot(&session.initiator)?,
            responder: self.snapshot(&session.responder)?,
            created_at: session.created_at,
        })
    }

    fn snapshot(&self, id: &ParticipantId) -> Option<ParticipantSnapshot> {
        let participant = self.registry.get(id)?;
        Some(ParticipantSnapshot {
            connection_id: participant.id,
            identity_key: participant.identity_key.clone(),
            display_name: participant.display_name.clone(),
        })
    }

    fn identity_key(&self, id: &ParticipantId) -> Option<String> {
        self.registry.get(id).map(|p| p.identity_key.clone())
    }
}
