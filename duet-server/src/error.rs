//! Error types for the lobby, its external collaborators and the HTTP API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failure of a lobby operation.
///
/// Only `InvalidInput` and `Unauthorized` are shown to clients. The other two
/// are logged and the operation is abandoned; neither ever escapes as a panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LobbyError {
    /// Malformed join fields or a request that makes no sense for the
    /// connection's current state.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Identity not verified, or banned.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An attempt to break a session table invariant (self-pairing, double
    /// pairing).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A message referencing a session or participant that is gone. Expected
    /// while disconnects race with in-flight signaling.
    #[error("stale reference: {0}")]
    StaleReference(String),
}

impl LobbyError {
    /// Text to put in an `error` message for the client, if any.
    pub fn client_message(&self) -> Option<&str> {
        match self {
            Self::InvalidInput(msg) | Self::Unauthorized(msg) => Some(msg),
            Self::InvariantViolation(_) | Self::StaleReference(_) => None,
        }
    }
}

/// Failure reported by an external collaborator (verification, bans,
/// session history).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator rejected request: {0}")]
    Rejected(String),
}

/// Server configuration that cannot be turned into a running service.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("invalid college domain pattern: {0}")]
    InvalidDomainPattern(#[from] regex::Error),
}

/// Failure of an `/api` request. Rendered as `{"error": "..."}`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Too many requests from this IP, please try again later.")]
    RateLimitExceeded,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
