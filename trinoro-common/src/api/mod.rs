//! API module for shared HTTP API functionality
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared-secret storage (via sqlx)
//! - Shared request/response types
//!
//! The server wraps these with axum handlers; the client uses the same types
//! to decode responses.

pub mod auth;
pub mod types;

pub use auth::{calculate_hash, sign, validate_hash, validate_timestamp, verify_signed, ApiAuthError};
#[cfg(feature = "sqlx")]
pub use auth::{initialize_shared_secret, load_shared_secret, store_shared_secret};
pub use types::{
    Ack, ApiEnvelope, CalendarQuery, ChatRequest, CreateJournalRequest, ErrorBody, JournalQuery,
    RecordSessionRequest, SessionGrant, SignInCallback, SoundPreview, SoundQuery,
};
