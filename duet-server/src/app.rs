use crate::auth::{AuthService, auth_routes};
use crate::collaborators::Collaborators;
use crate::config::ServerConfig;
use crate::error::ConfigError;
use crate::lobby::{LifecycleController, Lobby};
use crate::matchmaking::SessionIdAllocator;
use crate::rate_limit::{RateLimiter, rate_limit};
use crate::signaling::{ConnectionTable, SignalingService, ws_handler};
use axum::extract::State;
use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use duet_core::RtcConfiguration;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct RtcConfigResponse {
    pub config: RtcConfiguration,
}

/// Spawns the lobby actor and returns the service the HTTP layer talks to.
///
/// The lobby task finishes once the service and all its clones are dropped.
pub fn start_lobby(
    config: &ServerConfig,
    collaborators: Collaborators,
) -> (SignalingService, JoinHandle<()>) {
    let (lobby_tx, lobby_rx) = mpsc::channel(config.lobby_capacity);
    let connections = ConnectionTable::new();

    let controller = LifecycleController::new(SessionIdAllocator::new());
    let lobby = Lobby::new(
        controller,
        lobby_rx,
        collaborators,
        Arc::new(connections.clone()),
    );
    let task = tokio::spawn(lobby.run());

    info!(capacity = config.lobby_capacity, "Lobby started");
    let service = SignalingService::new(lobby_tx, connections, config.rtc_configuration());
    (service, task)
}

/// Everything under `/api` is rate limited per client address; `/` and
/// `/ws` are not.
pub fn router(
    service: SignalingService,
    auth: AuthService,
    config: &ServerConfig,
) -> Result<Router, ConfigError> {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit));
    let api = Router::new()
        .route("/rtc-config", get(rtc_config))
        .with_state(service.clone())
        .merge(auth_routes(auth))
        .layer(from_fn_with_state(limiter, rate_limit));

    Ok(Router::new()
        .route("/", get(health))
        .route("/ws", get(ws_handler))
        .with_state(service)
        .nest("/api", api)
        .layer(cors_layer(config.cors_origin.as_deref())?)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        None | Some("*") => Ok(layer.allow_origin(Any)),
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidCorsOrigin(origin.to_owned()))?;
            Ok(layer.allow_origin(origin))
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "message": "Duet signaling server is running",
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn rtc_config(State(service): State<SignalingService>) -> Json<RtcConfigResponse> {
    Json(RtcConfigResponse {
        config: service.rtc_configuration().clone(),
    })
}
