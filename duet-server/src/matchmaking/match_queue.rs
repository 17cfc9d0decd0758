use crate::matchmaking::registry::ParticipantRegistry;
use duet_core::ParticipantId;
use tracing::{debug, warn};

/// Two participants taken off the queue together.
///
/// `first` was popped first (the most recently queued), `second` after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub first: ParticipantId,
    pub second: ParticipantId,
}

/// Waiting line of unmatched participants.
///
/// Appends at the tail and pops pairs from the tail, so the most recently
/// queued participants are matched first. This is a recency policy, not
/// arrival-order fairness: someone who has waited longest can keep waiting
/// while newer arrivals pair with each other.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: Vec<ParticipantId>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the id was already queued.
    pub fn enqueue(&mut self, id: ParticipantId) -> bool {
        if self.entries.contains(&id) {
            warn!(connection_id = %id, "Participant is already queued");
            return false;
        }
        self.entries.push(id);
        true
    }

    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|queued| queued != id);
        before != self.entries.len()
    }

    /// Pops pairs of live participants until fewer than two remain.
    ///
    /// Entries that are no longer live are discarded on the way. A single
    /// live leftover stays at the tail.
    pub fn drain(&mut self, registry: &ParticipantRegistry) -> Vec<Pair> {
        let mut pairs = Vec::new();

        loop {
            let Some(first) = self.pop_live(registry) else {
                break;
            };
            let Some(second) = self.pop_live(registry) else {
                self.entries.push(first);
                break;
            };
            debug!(%first, %second, "Popped pair from match queue");
            pairs.push(Pair { first, second });
        }

        pairs
    }

    fn pop_live(&mut self, registry: &ParticipantRegistry) -> Option<ParticipantId> {
        while let Some(id) = self.entries.pop() {
            if registry.is_live(&id) {
                return Some(id);
            }
            debug!(connection_id = %id, "Discarding stale queue entry");
        }
        None
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ParticipantId> {
        self.entries.iter()
    }
}
