//! Identity and session handling
//!
//! The OAuth exchange happens in the identity adapter, outside this service.
//! The adapter reports the verified profile to `/api/auth/callback` with a
//! signed body; the service answers with an opaque session token that the
//! browser carries as a cookie (or API clients as a bearer token).

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use tracing::{debug, info};
use trinoro_common::api::{verify_signed, Ack, ApiEnvelope, SessionGrant, SignInCallback};
use trinoro_common::db::{sessions, users};
use trinoro_common::models::{User, UserProfile};

use crate::{ApiError, ApiResult, AppState};

pub const SESSION_COOKIE: &str = "trinoro_session";

/// Authenticated caller, resolved from the session token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let user_id = sessions::find_session_user(&state.db, &token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        let user = users::get_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(ApiError::user_not_found)?;

        Ok(CurrentUser { user, token })
    }
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// POST /api/auth/callback
///
/// Verifies the adapter's signature, upserts the user by email and opens a
/// session.
pub async fn auth_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let json_value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;

    verify_signed(&json_value, state.shared_secret, state.auth_skew_ms)?;

    let callback: SignInCallback = serde_json::from_value(json_value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid sign-in body: {}", e)))?;

    let email = callback
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let name = callback
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.clone());

    let user = users::upsert_user(
        &state.db,
        &UserProfile {
            email,
            name,
            image: callback.image,
        },
    )
    .await?;

    let purged = sessions::purge_expired(&state.db).await?;
    if purged > 0 {
        debug!("Purged {} expired sessions", purged);
    }

    let (token, expires_at) = sessions::create_session(&state.db, user.id, state.session_ttl).await?;
    info!(user_id = %user.id, "User signed in");

    let cookie = session_cookie(&token, state.session_ttl.num_seconds());
    let grant = SessionGrant {
        token,
        expires_at,
        user,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(ApiEnvelope::ok(grant))))
}

/// POST /api/auth/signout
///
/// Succeeds whether or not the token still names a live session.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token(&headers) {
        if sessions::delete_session(&state.db, &token).await? {
            info!("Session closed");
        }
    }

    Ok((
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(ApiEnvelope::ok(Ack {
            message: "Signed out".to_string(),
        })),
    ))
}

/// GET /api/auth/session
pub async fn current_session(current: CurrentUser) -> Json<ApiEnvelope<User>> {
    Json(ApiEnvelope::ok(current.user))
}
