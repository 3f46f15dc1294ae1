//! User records

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{format_day, format_timestamp, parse_day, parse_timestamp, parse_uuid};
use crate::models::{User, UserProfile};
use crate::streak::StreakCounters;
use crate::{time, Error, Result};

const USER_COLUMNS: &str = "id, email, name, image, streak_count, longest_streak, \
     last_meditation_date, last_access_date, total_meditation_minutes, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    let last_meditation_date: Option<String> = row.try_get("last_meditation_date")?;
    let last_access_date: String = row.try_get("last_access_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(User {
        id: parse_uuid("id", &id)?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        image: row.try_get("image")?,
        streak_count: row.try_get::<i64, _>("streak_count")?.max(0) as u32,
        longest_streak: row.try_get::<i64, _>("longest_streak")?.max(0) as u32,
        last_meditation_date: last_meditation_date
            .map(|d| parse_day("last_meditation_date", &d))
            .transpose()?,
        last_access_date: parse_timestamp("last_access_date", &last_access_date)?,
        total_meditation_minutes: row.try_get("total_meditation_minutes")?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

/// Create the user on first sign-in, refresh identity fields afterwards.
///
/// Counters and `created_at` survive repeated sign-ins.
pub async fn upsert_user(pool: &SqlitePool, profile: &UserProfile) -> Result<User> {
    let email = profile.email.trim();
    if email.is_empty() {
        return Err(Error::InvalidInput("Email is required".to_string()));
    }

    let now = format_timestamp(&time::now());

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, image, last_access_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            name = excluded.name,
            image = excluded.image,
            last_access_date = excluded.last_access_date,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(&profile.name)
    .bind(profile.image.as_deref())
    .bind(&now)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_user_by_email(pool, email)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} missing after upsert", email)))
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Add `minutes` to the lifetime total and store new streak counters.
///
/// `longest_streak` is only ever raised.
pub async fn apply_session(
    pool: &SqlitePool,
    user_id: Uuid,
    minutes: i64,
    counters: &StreakCounters,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            total_meditation_minutes = total_meditation_minutes + ?,
            streak_count = ?,
            longest_streak = MAX(longest_streak, ?),
            last_meditation_date = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(minutes)
    .bind(counters.current as i64)
    .bind(counters.longest as i64)
    .bind(counters.last_day.map(format_day))
    .bind(format_timestamp(&time::now()))
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("User not found".to_string()));
    }

    Ok(())
}
