//! Sign-in sessions
//!
//! A session is an opaque random token mapped to a user id with an expiry.
//! The identity adapter establishes it; every authenticated request looks it up.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::{time, Result};

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Issue a new token for `user_id` valid for `ttl`
pub async fn create_session(
    pool: &SqlitePool,
    user_id: Uuid,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>)> {
    let token = generate_token();
    let now = time::now();
    let expires_at = now + ttl;

    sqlx::query("INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&token)
        .bind(user_id.to_string())
        .bind(format_timestamp(&now))
        .bind(format_timestamp(&expires_at))
        .execute(pool)
        .await?;

    Ok((token, expires_at))
}

/// User id behind `token`, or `None` if unknown or expired
pub async fn find_session_user(pool: &SqlitePool, token: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let expires_at: String = row.try_get("expires_at")?;
    if parse_timestamp("expires_at", &expires_at)? <= time::now() {
        return Ok(None);
    }

    let user_id: String = row.try_get("user_id")?;
    parse_uuid("user_id", &user_id).map(Some)
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove expired sessions, returning how many were deleted
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(format_timestamp(&time::now()))
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
