//! Chat recommender and ambient sound lookup

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use tracing::debug;
use trinoro_common::api::{ApiEnvelope, ChatRequest, SoundPreview, SoundQuery};
use trinoro_common::chat::{self, ChatReply};

use super::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

/// POST /api/chat
///
/// Uses the generative model when configured, the offline keyword
/// recommender otherwise.
pub async fn chat(
    State(state): State<AppState>,
    _current: CurrentUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ApiEnvelope<ChatReply>>> {
    let Json(req) = payload?;
    let message = required(req.message, "Message is required")?;

    let reply = match &state.chat {
        Some(client) => client.recommend(&message).await.map_err(|e| {
            ApiError::Upstream("Failed to generate response".to_string(), e.to_string())
        })?,
        None => {
            debug!("No generative API key configured, using offline recommender");
            chat::offline_reply(&message)
        }
    };

    Ok(Json(ApiEnvelope::ok(reply)))
}

/// GET /api/sounds?query=
pub async fn search_sound(
    State(state): State<AppState>,
    _current: CurrentUser,
    query: Result<Query<SoundQuery>, QueryRejection>,
) -> ApiResult<Json<ApiEnvelope<SoundPreview>>> {
    let Query(query) = query?;
    let keyword = required(query.query, "Query is required")?;

    let Some(client) = &state.sounds else {
        return Err(ApiError::Upstream(
            "Sound search failed".to_string(),
            "Freesound token not configured".to_string(),
        ));
    };

    let sound = client
        .search(&keyword)
        .await
        .map_err(|e| ApiError::Upstream("Sound search failed".to_string(), e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("No sound found".to_string()))?;

    Ok(Json(ApiEnvelope::ok(sound)))
}
