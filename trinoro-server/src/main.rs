//! trinoro-server - Trinoro meditation companion service
//!
//! Serves the journal, practice streak, stats, chat and ambient sound APIs
//! over HTTP, backed by a single SQLite database in the root folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use trinoro_common::api::auth::load_shared_secret;
use trinoro_common::config::{
    resolve_secret, CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig,
    ENV_BIND, ENV_FREESOUND_TOKEN, ENV_GEMINI_API_KEY, ENV_SHARED_SECRET,
};
use trinoro_common::db::init_database;
use trinoro_server::services::{FreesoundClient, GeminiClient};
use trinoro_server::{build_router, AppState};

/// Command-line arguments for trinoro-server
#[derive(Parser, Debug)]
#[command(name = "trinoro-server")]
#[command(about = "Meditation journal, streak and recommendation service")]
#[command(version)]
struct Args {
    /// Folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5740
    #[arg(short, long, env = ENV_BIND)]
    bind: Option<String>,

    /// Config file (default: ~/.config/trinoro/config.toml, then /etc/trinoro/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = CompiledDefaults::for_current_platform();

    // Peek at the config file for the log level; it is loaded properly below
    let config_path = TomlConfig::locate(args.config.as_deref());
    let log_level = config_path
        .as_deref()
        .and_then(|path| TomlConfig::from_file(path).ok())
        .map(|config| config.logging.level)
        .unwrap_or_else(|| defaults.log_level.clone());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting Trinoro server (trinoro-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = TomlConfig::load(config_path.as_deref());

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), &toml_config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;
    info!("✓ Database ready");

    let shared_secret = match std::env::var(ENV_SHARED_SECRET) {
        Ok(value) => value
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{} must be an integer", ENV_SHARED_SECRET))?,
        Err(_) => load_shared_secret(&pool)
            .await
            .context("Failed to load identity adapter shared secret")?,
    };
    if shared_secret == 0 {
        warn!("Identity callback signature checks disabled (shared_secret = 0)");
    } else {
        info!("✓ Loaded identity adapter shared secret");
    }

    let streak_policy = toml_config.streak_policy.unwrap_or_default();
    info!("Streak policy: {:?}", streak_policy);

    let mut state = AppState::new(pool, shared_secret)
        .with_streak_policy(streak_policy)
        .with_session_ttl(chrono::Duration::hours(
            toml_config
                .session_ttl_hours
                .unwrap_or(defaults.session_ttl_hours),
        ))
        .with_auth_skew_ms(
            toml_config
                .auth_timestamp_skew_ms
                .unwrap_or(defaults.auth_timestamp_skew_ms),
        );

    match resolve_secret(
        "Freesound token",
        ENV_FREESOUND_TOKEN,
        toml_config.freesound_token.as_ref(),
    ) {
        Some(token) => {
            let client = FreesoundClient::new(token, toml_config.freesound_base_url.clone())
                .context("Failed to create Freesound client")?;
            state = state.with_sounds(client);
        }
        None => warn!("No Freesound token configured; ambient sound search will fail"),
    }

    match resolve_secret(
        "Gemini API key",
        ENV_GEMINI_API_KEY,
        toml_config.gemini_api_key.as_ref(),
    ) {
        Some(key) => {
            let model = toml_config
                .gemini_model
                .clone()
                .unwrap_or_else(|| defaults.gemini_model.clone());
            let client = GeminiClient::new(key, Some(model), toml_config.gemini_base_url.clone())
                .context("Failed to create Gemini client")?;
            info!("Chat recommendations via {}", client.model());
            state = state.with_chat(client);
        }
        None => info!("No Gemini API key configured; chat uses the offline recommender"),
    }

    let app = build_router(state);

    let bind = args
        .bind
        .or(toml_config.bind.clone())
        .unwrap_or(defaults.bind);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("trinoro-server listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
