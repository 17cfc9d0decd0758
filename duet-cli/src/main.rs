use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use duet_server::{
    AuthService, Collaborators, CollegeDomainConfig, CollegeDomainVerifier, InMemoryDirectory,
    RateLimitConfig, ServerConfig, TurnServer, router, split_list, start_lobby,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "duet=info,duet_server=info,tower_http=info";

/// How long the lobby gets to wind down after the listener stops.
const LOBBY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Pairs college students for one-on-one video calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServeArgs),

    /// Check whether an address would pass college e-mail verification.
    CheckEmail {
        email: String,

        #[command(flatten)]
        domains: DomainArgs,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Allowed browser origin; any origin when unset.
    #[arg(long, env = "CORS_ORIGIN")]
    cors_origin: Option<String>,

    #[arg(long, env = "STUN_SERVER", default_value = duet_server::DEFAULT_STUN_SERVER)]
    stun_server: String,

    #[arg(long, env = "TURN_SERVER")]
    turn_server: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", hide_env_values = true)]
    turn_credential: Option<String>,

    #[command(flatten)]
    domains: DomainArgs,

    #[arg(long, env = "LOBBY_CAPACITY", default_value_t = 1024)]
    lobby_capacity: usize,

    /// Length of the `/api` rate-limit window in milliseconds.
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS", default_value_t = 900_000)]
    rate_limit_window_ms: u64,

    /// Requests allowed per client address in each window.
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 100)]
    rate_limit_max_requests: u32,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

#[derive(Args)]
struct DomainArgs {
    /// Extra academic domain suffixes, comma-separated.
    #[arg(long, env = "ADDITIONAL_COLLEGE_DOMAINS", default_value = "")]
    college_domains: String,

    /// Exact college domains, comma-separated.
    #[arg(long, env = "KNOWN_COLLEGE_DOMAINS", default_value = "")]
    known_domains: String,
}

impl DomainArgs {
    fn config(&self) -> CollegeDomainConfig {
        CollegeDomainConfig {
            extra_suffixes: split_list(&self.college_domains),
            known_domains: split_list(&self.known_domains),
        }
    }
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        let turn_server = match (&self.turn_server, &self.turn_username, &self.turn_credential) {
            (Some(url), Some(username), Some(credential)) => Some(TurnServer {
                url: url.clone(),
                username: username.clone(),
                credential: credential.clone(),
            }),
            _ => None,
        };

        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            cors_origin: self.cors_origin.clone(),
            stun_server: self.stun_server.clone(),
            turn_server,
            lobby_capacity: self.lobby_capacity,
            college_domains: self.domains.config(),
            rate_limit: RateLimitConfig {
                window: Duration::from_millis(self.rate_limit_window_ms),
                max_requests: self.rate_limit_max_requests,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Serve(args) => serve(args).await,
        Commands::CheckEmail { email, domains } => check_email(&email, &domains),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.log_json);

    let config = args.server_config();
    let verifier = Arc::new(
        CollegeDomainVerifier::new(&config.college_domains)
            .context("Failed to build college domain verifier")?,
    );
    let directory = Arc::new(InMemoryDirectory::new());
    let collaborators = Collaborators {
        verifier: verifier.clone(),
        ban_list: directory.clone(),
        store: directory.clone(),
    };

    let (service, lobby) = start_lobby(&config, collaborators);
    let auth = AuthService::new(verifier, directory);
    let app = router(service, auth, &config).context("Invalid server configuration")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    println!("{}", "🚀 Duet signaling server is up".green().bold());
    println!("   🌐 HTTP:      http://{}", config.bind_addr);
    println!("   🔌 WebSocket: ws://{}/ws", config.bind_addr);
    if config.turn_server.is_some() {
        println!("   🛰  TURN relay configured");
    }
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    match tokio::time::timeout(LOBBY_DRAIN_TIMEOUT, lobby).await {
        Ok(Ok(())) => info!("Lobby stopped"),
        Ok(Err(e)) => warn!("Lobby task failed: {}", e),
        Err(_) => warn!("Sockets still open, stopping without waiting for the lobby"),
    }

    println!("{}", "👋 Server stopped".cyan());
    Ok(())
}

fn check_email(email: &str, domains: &DomainArgs) -> Result<()> {
    let verifier = CollegeDomainVerifier::new(&domains.config())
        .context("Failed to build college domain verifier")?;

    match verifier.college_name(email) {
        Some(college) => println!("{} {}", "✅ Accepted:".green().bold(), college),
        None => println!("{}", "❌ Not a recognised college e-mail".red().bold()),
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
