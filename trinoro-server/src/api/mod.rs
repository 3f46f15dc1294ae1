//! HTTP API handlers for trinoro-server

pub mod assistant;
pub mod auth;
pub mod buildinfo;
pub mod health;
pub mod journal;
pub mod streak;

pub use assistant::{chat, search_sound};
pub use auth::{auth_callback, current_session, sign_out, CurrentUser, SESSION_COOKIE};
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use journal::{create_journal_entry, list_journal_entries};
pub use streak::{get_calendar, get_user_stats, record_session};
