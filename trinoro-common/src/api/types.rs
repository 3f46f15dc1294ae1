//! Shared API request/response types
//!
//! Used by `trinoro-server` to decode requests and encode responses, and by
//! `trinoro-client` for the opposite direction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

// ========================================
// Envelopes
// ========================================

/// Success envelope: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure envelope: `{"success": false, "error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Plain acknowledgement payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

// ========================================
// Identity
// ========================================

/// Signed sign-in report from the identity adapter
///
/// `timestamp` and `hash` are checked against the raw body before this is
/// decoded; they are carried here only so the struct round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInCallback {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Issued session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

// ========================================
// Journal
// ========================================

/// `POST /api/journal` body. Fields are optional so that missing ones get a
/// field-level message instead of a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJournalRequest {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// `GET /api/journal` query. `q` is accepted as an alias of `query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: Option<i64>,
}

impl JournalQuery {
    /// Non-blank search text, if any
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .or(self.q.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ========================================
// Streak
// ========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSessionRequest {
    /// Whole minutes. Anything else (fractions, strings, null) reads as absent
    /// so the handler answers with its field-level message.
    #[serde(default, deserialize_with = "whole_minutes")]
    pub minutes: Option<i64>,
    #[serde(default)]
    pub has_journal_entry: bool,
}

fn whole_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
}

// ========================================
// Chat and sounds
// ========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoundQuery {
    #[serde(default)]
    pub query: Option<String>,
}

/// Short preview clip returned by the sound search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundPreview {
    pub id: u64,
    pub name: String,
    /// Streamable low-quality MP3 URL
    pub preview: String,
}
