//! Data model
//!
//! Wire names are camelCase so the existing browser client can consume the
//! JSON unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Self-reported mood attached to a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Sad,
    Angry,
    Neutral,
    Excited,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Sad,
        Mood::Angry,
        Mood::Neutral,
        Mood::Excited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Neutral => "neutral",
            Mood::Excited => "excited",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("Invalid mood: {}", s)))
    }
}

/// One record per authenticated identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub streak_count: u32,
    pub longest_streak: u32,
    pub last_meditation_date: Option<NaiveDate>,
    pub last_access_date: DateTime<Utc>,
    pub total_meditation_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verified identity reported by the identity provider on sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: Mood,
    pub text: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new journal entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewJournalEntry {
    pub mood: Mood,
    pub text: String,
    pub tags: Vec<String>,
}

/// Per-user, per-day meditation tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub meditation_minutes: i64,
    pub journal_entry: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregated statistics, recomputed on demand
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_sessions: u32,
    pub total_minutes: i64,
    pub average_session_length: f64,
    pub journal_entries: u32,
    pub mood_distribution: BTreeMap<Mood, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_parse_is_case_insensitive() {
        assert_eq!("Happy".parse::<Mood>().unwrap(), Mood::Happy);
        assert_eq!(" calm ".parse::<Mood>().unwrap(), Mood::Calm);
        assert!("furious".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Excited).unwrap(), "\"excited\"");
    }

    #[test]
    fn test_stats_wire_names_are_camel_case() {
        let mut stats = UserStats::default();
        stats.mood_distribution.insert(Mood::Sad, 2);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("currentStreak").is_some());
        assert!(json.get("averageSessionLength").is_some());
        assert_eq!(json["moodDistribution"]["sad"], 2);
    }
}
