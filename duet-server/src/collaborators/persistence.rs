use crate::error::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use duet_core::{ParticipantId, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSnapshot {
    pub connection_id: ParticipantId,
    pub identity_key: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub initiator: ParticipantSnapshot,
    pub responder: ParticipantSnapshot,
    pub created_at: DateTime<Utc>,
}

/// Session history sink. The lobby writes to it and never reads from it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn session_started(&self, record: SessionRecord) -> Result<(), CollaboratorError>;

    async fn session_ended(
        &self,
        session_id: SessionId,
        ended_at: DateTime<Utc>,
        duration: Duration,
    ) -> Result<(), CollaboratorError>;

    async fn report_filed(
        &self,
        session_id: SessionId,
        reporter_key: String,
        reported_key: Option<String>,
    ) -> Result<(), CollaboratorError>;
}

/// A history write produced by a lobby state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistEvent {
    SessionStarted(SessionRecord),
    SessionEnded {
        session_id: SessionId,
        ended_at: DateTime<Utc>,
        duration: Duration,
    },
    ReportFiled {
        session_id: SessionId,
        reporter_key: String,
        reported_key: Option<String>,
    },
}

/// Applies persistence events in order, off the lobby task.
///
/// Failures are logged and dropped; the in-memory state has already moved on.
pub struct PersistenceWorker {
    store: Arc<dyn SessionStore>,
    events_rx: mpsc::UnboundedReceiver<PersistEvent>,
}

impl PersistenceWorker {
    pub fn new(store: Arc<dyn SessionStore>) -> (Self, mpsc::UnboundedSender<PersistEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (Self { store, events_rx }, events_tx)
    }

    pub async fn run(mut self) {
        debug!("Persistence worker started");

        while let Some(event) = self.events_rx.recv().await {
            if let Err(e) = self.apply(event).await {
                warn!(error = %e, "Failed to persist session history");
            }
        }

        info!("Persistence worker finished");
    }

    async fn apply(&self, event: PersistEvent) -> Result<(), CollaboratorError> {
        match event {
            PersistEvent::SessionStarted(record) => self.store.session_started(record).await,
            PersistEvent::SessionEnded {
                session_id,
                ended_at,
                duration,
            } => {
                self.store
                    .session_ended(session_id, ended_at, duration)
                    .await
            }
            PersistEvent::ReportFiled {
                session_id,
                reporter_key,
                reported_key,
            } => {
                self.store
                    .report_filed(session_id, reporter_key, reported_key)
                    .await
            }
        }
    }
}
