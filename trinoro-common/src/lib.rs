//! # Trinoro Common Library
//!
//! Shared code for the Trinoro service and its clients:
//! - Data model (users, journal entries, streak records, derived stats)
//! - Store accessors over SQLite (behind the `sqlx` feature)
//! - Streak/statistics aggregation
//! - Offline mood recommender and chat reply types
//! - Request signing for the identity adapter
//! - Configuration loading

pub mod api;
pub mod chat;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod streak;
pub mod time;

pub use error::{Error, Result};
pub use models::{JournalEntry, Mood, StreakRecord, User, UserStats};
