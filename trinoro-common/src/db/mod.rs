//! Store accessors over SQLite
//!
//! Narrow create/read/update functions over the users, journal entries,
//! streak records and sessions tables. Identifiers are stored as UUID text,
//! timestamps as RFC 3339 text and calendar days as `YYYY-MM-DD` text, so
//! lexical order equals chronological order.

pub mod init;
pub mod journal;
pub mod sessions;
pub mod streaks;
pub mod users;

pub use init::{create_schema, init_database, init_in_memory};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed-width fractional seconds keep ORDER BY on the text column correct
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

pub(crate) fn parse_day(column: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}
