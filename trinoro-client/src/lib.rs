//! # Trinoro client library
//!
//! HTTP client for the Trinoro service plus the state containers a front end
//! drives: the meditation timer, breath pacer, journal, streak calendar,
//! ambient sound mixer and chat session.

pub mod ambient;
pub mod breath;
pub mod chat;
pub mod client;
pub mod error;
pub mod journal_store;
pub mod streak_store;
pub mod timer;

pub use ambient::{AmbientMixer, AmbientSound};
pub use breath::{BinauralBeats, BreathControls, BreathPacer, BreathPhase};
pub use chat::{ChatMessage, ChatRole, ChatSession};
pub use client::TrinoroClient;
pub use error::{ClientError, Result};
pub use journal_store::JournalStore;
pub use streak_store::StreakStore;
pub use timer::MeditationTimer;
