//! External services the lobby depends on, seen only through traits.

mod college_email;
mod directory;
mod identity;
mod persistence;

pub use college_email::*;
pub use directory::*;
pub use identity::*;
pub use persistence::*;

use std::sync::Arc;

/// The external services a lobby talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub ban_list: Arc<dyn BanList>,
    pub store: Arc<dyn SessionStore>,
}

impl Collaborators {
    /// Uses one directory for verification, bans and history.
    pub fn in_memory(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            verifier: directory.clone(),
            ban_list: directory.clone(),
            store: directory,
        }
    }
}
