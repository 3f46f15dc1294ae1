//! Practice recording, calendar and stats endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use trinoro_common::api::{Ack, ApiEnvelope, CalendarQuery, RecordSessionRequest};
use trinoro_common::db::streaks;
use trinoro_common::streak::is_valid_session_minutes;
use trinoro_common::models::{StreakRecord, UserStats};
use trinoro_common::time;

use super::CurrentUser;
use crate::services::practice;
use crate::{ApiError, ApiResult, AppState};

/// POST /api/streak
pub async fn record_session(
    State(state): State<AppState>,
    current: CurrentUser,
    payload: Result<Json<RecordSessionRequest>, JsonRejection>,
) -> ApiResult<Json<ApiEnvelope<Ack>>> {
    let Json(req) = payload?;

    let minutes = req
        .minutes
        .filter(|m| is_valid_session_minutes(*m))
        .ok_or_else(|| ApiError::BadRequest("Valid minutes are required".to_string()))?;

    practice::record_session(
        &state.db,
        &current.user,
        minutes,
        req.has_journal_entry,
        state.streak_policy,
        time::today(),
    )
    .await?;

    Ok(Json(ApiEnvelope::ok(Ack {
        message: "Meditation session recorded successfully".to_string(),
    })))
}

/// GET /api/streak?year=&month=
///
/// Defaults to the current month.
pub async fn get_calendar(
    State(state): State<AppState>,
    current: CurrentUser,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> ApiResult<Json<ApiEnvelope<Vec<StreakRecord>>>> {
    let Query(query) = query?;
    let (this_year, this_month) = time::current_year_month();

    let records = streaks::calendar(
        &state.db,
        current.user.id,
        query.year.unwrap_or(this_year),
        query.month.unwrap_or(this_month),
    )
    .await?;

    Ok(Json(ApiEnvelope::ok(records)))
}

/// GET /api/user/stats
pub async fn get_user_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiEnvelope<UserStats>>> {
    let stats = practice::user_stats(&state.db, &current.user, time::today()).await?;
    Ok(Json(ApiEnvelope::ok(stats)))
}
