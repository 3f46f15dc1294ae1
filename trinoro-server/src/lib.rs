//! trinoro-server library
//!
//! HTTP service for the Trinoro meditation companion: journal, practice
//! streaks and stats, ambient sound lookup and the chat recommender.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use trinoro_common::streak::StreakPolicy;

pub mod api;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};
use services::{FreesoundClient, GeminiClient};

/// Default session lifetime (30 days)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;
/// Default accepted clock skew on signed identity callbacks
pub const DEFAULT_AUTH_SKEW_MS: i64 = 300_000;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Identity adapter signing secret; 0 disables signature checks
    pub shared_secret: i64,
    pub auth_skew_ms: i64,
    pub session_ttl: chrono::Duration,
    pub streak_policy: StreakPolicy,
    /// `None` when no Freesound token is configured
    pub sounds: Option<Arc<FreesoundClient>>,
    /// `None` falls back to the offline recommender
    pub chat: Option<Arc<GeminiClient>>,
}

impl AppState {
    pub fn new(db: SqlitePool, shared_secret: i64) -> Self {
        Self {
            db,
            shared_secret,
            auth_skew_ms: DEFAULT_AUTH_SKEW_MS,
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            streak_policy: StreakPolicy::default(),
            sounds: None,
            chat: None,
        }
    }

    pub fn with_streak_policy(mut self, policy: StreakPolicy) -> Self {
        self.streak_policy = policy;
        self
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_auth_skew_ms(mut self, skew_ms: i64) -> Self {
        self.auth_skew_ms = skew_ms;
        self
    }

    pub fn with_sounds(mut self, client: FreesoundClient) -> Self {
        self.sounds = Some(Arc::new(client));
        self
    }

    pub fn with_chat(mut self, client: GeminiClient) -> Self {
        self.chat = Some(Arc::new(client));
        self
    }
}

/// Build application router
///
/// `/health`, `/api/buildinfo` and `/api/auth/callback` are public; every
/// other route resolves the caller through [`api::CurrentUser`].
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let auth = Router::new()
        .route("/api/auth/callback", post(api::auth_callback))
        .route("/api/auth/signout", post(api::sign_out))
        .route("/api/auth/session", get(api::current_session));

    let practice = Router::new()
        .route("/api/journal", post(api::create_journal_entry).get(api::list_journal_entries))
        .route("/api/streak", post(api::record_session).get(api::get_calendar))
        .route("/api/user/stats", get(api::get_user_stats));

    let assistant = Router::new()
        .route("/api/chat", post(api::chat))
        .route("/api/sounds", get(api::search_sound));

    Router::new()
        .merge(api::health_routes())
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(auth)
        .merge(practice)
        .merge(assistant)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
