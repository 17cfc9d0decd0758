use crate::collaborators::PersistEvent;
use duet_core::{ParticipantId, ServerMessage};

/// A message bound for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ParticipantId,
    pub message: ServerMessage,
}

/// Something a lifecycle transition asks the outside world to do.
///
/// Transitions return effects in the order they must become observable.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Deliver(Delivery),
    Persist(PersistEvent),
}

impl Effect {
    pub fn deliver(to: ParticipantId, message: ServerMessage) -> Self {
        Self::Deliver(Delivery { to, message })
    }
}
