//! Session recording and statistics
//!
//! Recording a session touches two tables: the per-day streak record (atomic
//! upsert) and the user's counters. The counter update follows the configured
//! [`StreakPolicy`].

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;
use trinoro_common::db::{journal, streaks, users};
use trinoro_common::models::{User, UserStats};
use trinoro_common::streak::{self, StreakCounters, StreakPolicy};
use trinoro_common::{Error, Result};

/// Record `minutes` of practice on `today` and update the user's counters.
pub async fn record_session(
    pool: &SqlitePool,
    user: &User,
    minutes: i64,
    has_journal_entry: bool,
    policy: StreakPolicy,
    today: NaiveDate,
) -> Result<StreakCounters> {
    if !streak::is_valid_session_minutes(minutes) {
        return Err(Error::InvalidInput("Valid minutes are required".to_string()));
    }

    let record = streaks::record_day(pool, user.id, today, minutes, has_journal_entry).await?;

    let counters = match policy {
        StreakPolicy::Recompute => {
            let days = streaks::list_days_desc(pool, user.id).await?;
            streak::recompute(&days, today, user.longest_streak)
        }
        StreakPolicy::Incremental => streak::advance_incremental(
            StreakCounters {
                current: user.streak_count,
                longest: user.longest_streak,
                last_day: user.last_meditation_date,
            },
            today,
        ),
    };

    users::apply_session(pool, user.id, minutes, &counters).await?;

    info!(
        user_id = %user.id,
        day = %today,
        minutes = minutes,
        day_total = record.meditation_minutes,
        current_streak = counters.current,
        longest_streak = counters.longest,
        ?policy,
        "Recorded meditation session"
    );

    Ok(counters)
}

/// Stats derived from the user's records and journal moods.
pub async fn user_stats(pool: &SqlitePool, user: &User, today: NaiveDate) -> Result<UserStats> {
    let records = streaks::list_records_desc(pool, user.id).await?;
    let moods = journal::list_moods(pool, user.id).await?;
    Ok(streak::compute_stats(&records, &moods, user.longest_streak, today))
}
