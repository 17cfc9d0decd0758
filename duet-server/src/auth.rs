//! College e-mail registration endpoints under `/api/auth`.

use crate::collaborators::{CollegeDomainVerifier, InMemoryDirectory, identity_key};
use crate::error::ApiError;
use crate::matchmaking::validate_display_name;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const NOT_A_COLLEGE_EMAIL: &str =
    "Please use a valid college email address (.edu, .edu.in, .ac.uk, .ac.in, etc.)";

/// Registers college addresses in the directory and answers lookups.
#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<CollegeDomainVerifier>,
    directory: Arc<InMemoryDirectory>,
}

impl AuthService {
    pub fn new(verifier: Arc<CollegeDomainVerifier>, directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            verifier,
            directory,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedUser {
    pub email: String,
    pub name: String,
    pub college: String,
    pub is_verified: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailResponse {
    pub message: String,
    pub user: VerifiedUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEmailResponse {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
}

/// Routes relative to `/api`.
pub fn auth_routes(auth: AuthService) -> Router {
    Router::new()
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/check-email", post(check_email))
        .with_state(auth)
}

fn required_email(email: Option<String>) -> Result<String, ApiError> {
    email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".into()))
}

async fn verify_email(
    State(auth): State<AuthService>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<VerifyEmailResponse>, ApiError> {
    let email = required_email(request.email)?;
    let name = request.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    let name = validate_display_name(&name)
        .map_err(|e| ApiError::BadRequest(e.client_message().unwrap_or_default().to_owned()))?;

    let Some(college) = auth.verifier.college_name(&email) else {
        return Err(ApiError::BadRequest(NOT_A_COLLEGE_EMAIL.into()));
    };

    let email = identity_key(&email);
    auth.directory
        .record_verified(&email, &name, Some(college.clone()));
    info!(%email, %college, "College e-mail registered");

    Ok(Json(VerifyEmailResponse {
        message: "Email verified successfully".into(),
        user: VerifiedUser {
            email,
            name,
            college,
            is_verified: true,
        },
    }))
}

async fn check_email(
    State(auth): State<AuthService>,
    Json(request): Json<CheckEmailRequest>,
) -> Result<Json<CheckEmailResponse>, ApiError> {
    let email = required_email(request.email)?;

    let response = match auth.directory.account(&email) {
        Some(entry) => CheckEmailResponse {
            verified: entry.verified,
            name: Some(entry.display_name),
            college: entry.college,
        },
        None => CheckEmailResponse {
            verified: false,
            name: None,
            college: None,
        },
    };
    Ok(Json(response))
}
