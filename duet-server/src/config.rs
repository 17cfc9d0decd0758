use duet_core::{IceServerConfig, RtcConfiguration};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Extra academic domains accepted by the college e-mail verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollegeDomainConfig {
    /// Domain suffixes, matched on a label boundary (`uni.example` accepts
    /// `maths.uni.example`).
    pub extra_suffixes: Vec<String>,
    /// Exact domains.
    pub known_domains: Vec<String>,
}

/// TURN relay credentials. Only used when all three parts are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnServer {
    pub url: String,
    pub username: String,
    pub credential: String,
}

/// Per-client request budget for the `/api` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
    pub stun_server: String,
    pub turn_server: Option<TurnServer>,
    /// Bound of the lobby command channel.
    pub lobby_capacity: usize,
    pub college_domains: CollegeDomainConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_origin: None,
            stun_server: DEFAULT_STUN_SERVER.to_owned(),
            turn_server: None,
            lobby_capacity: 1024,
            college_domains: CollegeDomainConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = vec![IceServerConfig {
            urls: vec![self.stun_server.clone()],
            username: None,
            credential: None,
        }];

        if let Some(turn) = &self.turn_server {
            servers.push(IceServerConfig {
                urls: vec![turn.url.clone()],
                username: Some(turn.username.clone()),
                credential: Some(turn.credential.clone()),
            });
        }

        servers
    }

    pub fn rtc_configuration(&self) -> RtcConfiguration {
        RtcConfiguration {
            ice_servers: self.ice_servers(),
        }
    }
}

/// Splits a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
