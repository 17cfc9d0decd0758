use async_trait::async_trait;
use duet_server::{BanList, CollaboratorError, IdentityVerifier, InMemoryDirectory, Verification};
use std::sync::Arc;
use tokio::sync::Notify;

/// Identity service that is always down.
pub struct FailingVerifier;

#[async_trait]
impl IdentityVerifier for FailingVerifier {
    async fn verify(&self, _email: &str, _name: &str) -> Result<Verification, CollaboratorError> {
        Err(CollaboratorError::Unavailable("identity service down".into()))
    }
}

/// Moderation service that is always down.
pub struct FailingBanList;

#[async_trait]
impl BanList for FailingBanList {
    async fn is_banned(&self, _identity_key: &str) -> Result<bool, CollaboratorError> {
        Err(CollaboratorError::Unavailable("moderation service down".into()))
    }
}

/// Answers from the directory, but holds back the answer for one e-mail
/// until the gate is opened.
pub struct GatedVerifier {
    directory: Arc<InMemoryDirectory>,
    held_email: String,
    gate: Arc<Notify>,
}

impl GatedVerifier {
    pub fn new(directory: Arc<InMemoryDirectory>, held_email: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let verifier = Self {
            directory,
            held_email: held_email.to_owned(),
            gate: gate.clone(),
        };
        (verifier, gate)
    }
}

#[async_trait]
impl IdentityVerifier for GatedVerifier {
    async fn verify(&self, email: &str, name: &str) -> Result<Verification, CollaboratorError> {
        if email == self.held_email {
            self.gate.notified().await;
        }
        self.directory.verify(email, name).await
    }
}
