use crate::error::CollaboratorError;
use async_trait::async_trait;

/// Outcome of an identity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub verified: bool,
    pub display_name: String,
}

impl Verification {
    pub fn verified(display_name: impl Into<String>) -> Self {
        Self {
            verified: true,
            display_name: display_name.into(),
        }
    }

    pub fn unverified() -> Self {
        Self {
            verified: false,
            display_name: String::new(),
        }
    }
}

/// External identity verification. An `Err` refuses the join.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, email: &str, name: &str) -> Result<Verification, CollaboratorError>;
}

/// External moderation list, keyed by identity key.
#[async_trait]
pub trait BanList: Send + Sync {
    async fn is_banned(&self, identity_key: &str) -> Result<bool, CollaboratorError>;
}

/// Key under which bans and reports are recorded for an e-mail address.
pub fn identity_key(email: &str) -> String {
    email.trim().to_lowercase()
}
