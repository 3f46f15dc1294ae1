//! Per-day practice records

use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{format_day, format_timestamp, parse_day, parse_timestamp, parse_uuid};
use crate::models::StreakRecord;
use crate::{time, Result};

const RECORD_COLUMNS: &str = "id, user_id, day, meditation_minutes, journal_entry, created_at";

fn record_from_row(row: &SqliteRow) -> Result<StreakRecord> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let day: String = row.try_get("day")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(StreakRecord {
        id: parse_uuid("id", &id)?,
        user_id: parse_uuid("user_id", &user_id)?,
        date: parse_day("day", &day)?,
        meditation_minutes: row.try_get("meditation_minutes")?,
        journal_entry: row.try_get::<i64, _>("journal_entry")? != 0,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

/// Add a session to the user's record for `day`, creating it if absent.
///
/// Minutes accumulate and the journal flag is sticky. The unique
/// (user_id, day) index makes concurrent calls for the same day merge
/// instead of producing a second row.
pub async fn record_day(
    pool: &SqlitePool,
    user_id: Uuid,
    day: NaiveDate,
    minutes: i64,
    journal_entry: bool,
) -> Result<StreakRecord> {
    let sql = format!(
        r#"
        INSERT INTO streak_records (id, user_id, day, meditation_minutes, journal_entry, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, day) DO UPDATE SET
            meditation_minutes = meditation_minutes + excluded.meditation_minutes,
            journal_entry = MAX(journal_entry, excluded.journal_entry)
        RETURNING {}
        "#,
        RECORD_COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(format_day(day))
        .bind(minutes)
        .bind(journal_entry as i64)
        .bind(format_timestamp(&time::now()))
        .fetch_one(pool)
        .await?;

    record_from_row(&row)
}

/// All records for a user, most recent day first
pub async fn list_records_desc(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<StreakRecord>> {
    let sql = format!(
        "SELECT {} FROM streak_records WHERE user_id = ? ORDER BY day DESC",
        RECORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(record_from_row).collect()
}

/// Just the days, most recent first
pub async fn list_days_desc(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<NaiveDate>> {
    let days: Vec<String> =
        sqlx::query_scalar("SELECT day FROM streak_records WHERE user_id = ? ORDER BY day DESC")
            .bind(user_id.to_string())
            .fetch_all(pool)
            .await?;

    days.iter().map(|d| parse_day("day", d)).collect()
}

/// Records with `start <= day <= end`, ascending
pub async fn records_in_range(
    pool: &SqlitePool,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<StreakRecord>> {
    let sql = format!(
        "SELECT {} FROM streak_records WHERE user_id = ? AND day >= ? AND day <= ? ORDER BY day ASC",
        RECORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id.to_string())
        .bind(format_day(start))
        .bind(format_day(end))
        .fetch_all(pool)
        .await?;

    rows.iter().map(record_from_row).collect()
}

/// Records for one calendar month
pub async fn calendar(
    pool: &SqlitePool,
    user_id: Uuid,
    year: i32,
    month: u32,
) -> Result<Vec<StreakRecord>> {
    let (start, end) = time::month_bounds(year, month)?;
    records_in_range(pool, user_id, start, end).await
}
