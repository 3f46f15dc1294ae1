//! Journal endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use tracing::info;
use trinoro_common::api::{ApiEnvelope, CreateJournalRequest, JournalQuery};
use trinoro_common::db::journal;
use trinoro_common::models::{JournalEntry, Mood, NewJournalEntry};

use super::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validate a create request into a storable entry
pub fn parse_new_entry(req: CreateJournalRequest) -> ApiResult<NewJournalEntry> {
    let (Some(mood), Some(text)) = (non_blank(req.mood), non_blank(req.text)) else {
        return Err(ApiError::BadRequest("Mood and text are required".to_string()));
    };

    let mood: Mood = mood.parse()?;

    let mut tags: Vec<String> = Vec::new();
    for tag in req.tags.unwrap_or_default() {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    Ok(NewJournalEntry { mood, text, tags })
}

/// POST /api/journal
pub async fn create_journal_entry(
    State(state): State<AppState>,
    current: CurrentUser,
    payload: Result<Json<CreateJournalRequest>, JsonRejection>,
) -> ApiResult<Json<ApiEnvelope<JournalEntry>>> {
    let Json(req) = payload?;
    let new_entry = parse_new_entry(req)?;

    let entry = journal::create_entry(&state.db, current.user.id, &new_entry).await?;
    info!(user_id = %current.user.id, entry_id = %entry.id, mood = %entry.mood, "Journal entry created");

    Ok(Json(ApiEnvelope::ok(entry)))
}

/// GET /api/journal?query=&limit=&skip=
pub async fn list_journal_entries(
    State(state): State<AppState>,
    current: CurrentUser,
    query: Result<Query<JournalQuery>, QueryRejection>,
) -> ApiResult<Json<ApiEnvelope<Vec<JournalEntry>>>> {
    let Query(query) = query?;

    let entries = match query.search_text() {
        Some(text) => journal::search_entries(&state.db, current.user.id, text).await?,
        None => {
            journal::list_entries(
                &state.db,
                current.user.id,
                query.limit.unwrap_or(journal::DEFAULT_PAGE_SIZE),
                query.skip.unwrap_or(0),
            )
            .await?
        }
    };

    Ok(Json(ApiEnvelope::ok(entries)))
}
