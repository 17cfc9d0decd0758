use crate::collaborators::identity::{BanList, IdentityVerifier, Verification, identity_key};
use crate::collaborators::persistence::{SessionRecord, SessionStore};
use crate::error::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, DashSet};
use duet_core::SessionId;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub display_name: String,
    pub verified: bool,
    pub college: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub record: SessionRecord,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    /// Identity keys of reporters, in the order the reports arrived.
    pub reported_by: Vec<String>,
}

/// Process-lifetime stand-in for the account, moderation and history
/// services. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: DashMap<String, DirectoryEntry>,
    banned: DashSet<String>,
    sessions: DashMap<SessionId, StoredSession>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_verified(&self, email: &str, display_name: &str) {
        self.record_verified(email, display_name, None);
    }

    /// Creates or replaces the account for `email` as verified.
    pub fn record_verified(&self, email: &str, display_name: &str, college: Option<String>) {
        self.accounts.insert(
            identity_key(email),
            DirectoryEntry {
                display_name: display_name.trim().to_owned(),
                verified: true,
                college,
            },
        );
    }

    pub fn add_unverified(&self, email: &str) {
        self.accounts.insert(
            identity_key(email),
            DirectoryEntry {
                display_name: String::new(),
                verified: false,
                college: None,
            },
        );
    }

    pub fn account(&self, email: &str) -> Option<DirectoryEntry> {
        self.accounts.get(&identity_key(email)).map(|e| e.clone())
    }

    pub fn ban(&self, identity_key: &str) {
        info!(%identity_key, "Identity banned");
        self.banned.insert(identity_key.to_owned());
    }

    pub fn session(&self, session_id: SessionId) -> Option<StoredSession> {
        self.sessions.get(&session_id).map(|s| s.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl IdentityVerifier for InMemoryDirectory {
    async fn verify(&self, email: &str, name: &str) -> Result<Verification, CollaboratorError> {
        let Some(entry) = self.accounts.get(&identity_key(email)) else {
            return Ok(Verification::unverified());
        };
        if !entry.verified {
            return Ok(Verification::unverified());
        }

        let display_name = if entry.display_name.is_empty() {
            name.trim().to_owned()
        } else {
            entry.display_name.clone()
        };
        Ok(Verification::verified(display_name))
    }
}

#[async_trait]
impl BanList for InMemoryDirectory {
    async fn is_banned(&self, identity_key: &str) -> Result<bool, CollaboratorError> {
        Ok(self.banned.contains(identity_key))
    }
}

#[async_trait]
impl SessionStore for InMemoryDirectory {
    async fn session_started(&self, record: SessionRecord) -> Result<(), CollaboratorError> {
        self.sessions.insert(
            record.session_id,
            StoredSession {
                record,
                ended_at: None,
                duration: None,
                reported_by: Vec::new(),
            },
        );
        Ok(())
    }

    async fn session_ended(
        &self,
        session_id: SessionId,
        ended_at: DateTime<Utc>,
        duration: Duration,
    ) -> Result<(), CollaboratorError> {
        let Some(mut stored) = self.sessions.get_mut(&session_id) else {
            return Err(CollaboratorError::Rejected(format!(
                "no history for room {session_id}"
            )));
        };
        stored.ended_at = Some(ended_at);
        stored.duration = Some(duration);
        Ok(())
    }

    async fn report_filed(
        &self,
        session_id: SessionId,
        reporter_key: String,
        reported_key: Option<String>,
    ) -> Result<(), CollaboratorError> {
        let Some(mut stored) = self.sessions.get_mut(&session_id) else {
            return Err(CollaboratorError::Rejected(format!(
                "no history for room {session_id}"
            )));
        };
        if !stored.reported_by.contains(&reporter_key) {
            warn!(
                room_id = %session_id,
                reporter = %reporter_key,
                reported = reported_key.as_deref().unwrap_or("unknown"),
                "Room reported"
            );
            stored.reported_by.push(reporter_key);
        }
        Ok(())
    }
}
