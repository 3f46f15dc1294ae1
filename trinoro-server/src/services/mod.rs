//! External API clients and multi-table operations

pub mod freesound_client;
pub mod gemini_client;
pub mod practice;

pub use freesound_client::{FreesoundClient, FreesoundError};
pub use gemini_client::{GeminiClient, GeminiError};
