mod app;
mod auth;
pub mod collaborators;
mod config;
mod error;
pub mod lobby;
pub mod matchmaking;
mod rate_limit;
mod signaling;

pub use app::*;
pub use auth::*;
pub use collaborators::{
    BanList, Collaborators, CollegeDomainVerifier, IdentityVerifier, InMemoryDirectory,
    SessionStore, Verification,
};
pub use config::*;
pub use error::*;
pub use lobby::{LifecycleController, Lobby, LobbyCommand, ParticipantState};
pub use matchmaking::SessionIdAllocator;
pub use rate_limit::RateLimiter;
pub use signaling::*;
