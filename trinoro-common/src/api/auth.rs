//! Request signing for the identity adapter
//!
//! The identity adapter completes the OAuth exchange with the provider and
//! then reports the verified profile to the service. That report is signed:
//!
//! - The body carries `timestamp` (Unix epoch ms) and `hash` (SHA-256 hex)
//! - `hash` is computed over the canonical JSON of the body with `hash`
//!   replaced by 64 zeros, followed by the shared secret as a decimal i64
//! - The timestamp must fall inside the configured skew window
//! - A shared secret of 0 disables checking
//!
//! Everything here is framework-free; the server wraps it in axum handlers.

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Settings key holding the shared secret
pub const SHARED_SECRET_KEY: &str = "auth_shared_secret";

#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    #[error("Invalid signature")]
    InvalidHash { provided: String, calculated: String },

    #[error("Missing timestamp field")]
    MissingTimestamp,

    #[error("Missing hash field")]
    MissingHash,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

// ========================================
// Shared Secret Management
// ========================================

/// Load the shared secret from the settings table, creating one if absent.
#[cfg(feature = "sqlx")]
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(SHARED_SECRET_KEY)
        .fetch_optional(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret.
#[cfg(feature = "sqlx")]
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    store_shared_secret(db, secret).await?;
    tracing::info!("Generated new identity adapter shared secret");

    Ok(secret)
}

/// Overwrite the stored shared secret (0 disables signature checks).
#[cfg(feature = "sqlx")]
pub async fn store_shared_secret(db: &SqlitePool, secret: i64) -> Result<(), ApiAuthError> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SHARED_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(())
}

// ========================================
// Timestamp Validation
// ========================================

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reject timestamps more than `max_skew_ms` in the past or future.
///
/// ```
/// use trinoro_common::api::auth::{now_millis, validate_timestamp};
///
/// let now = now_millis();
/// assert!(validate_timestamp(now - 500, 1000).is_ok());
/// assert!(validate_timestamp(now - 5000, 1000).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64, max_skew_ms: i64) -> Result<(), ApiAuthError> {
    let now = now_millis();
    // Saturating: `timestamp` is caller-controlled and may be i64::MIN/MAX
    let diff = now.saturating_sub(timestamp);

    if diff > max_skew_ms {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms)", diff, max_skew_ms),
        });
    }

    let ahead = diff.saturating_neg();
    if ahead > max_skew_ms {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms in future (max {}ms)", ahead, max_skew_ms),
        });
    }

    Ok(())
}

// ========================================
// Hash Calculation and Validation
// ========================================

/// Signature over `json_value` with its `hash` field zeroed.
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let to_hash = format!("{}{}", to_canonical_json(&value), shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
///
/// ```
/// use trinoro_common::api::auth::to_canonical_json;
/// use serde_json::json;
///
/// let canonical = to_canonical_json(&json!({"z": 3, "a": [1, "x"]}));
/// assert_eq!(canonical, r#"{"a":[1,"x"],"z":3}"#);
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

pub fn validate_hash(provided: &str, json_value: &Value, shared_secret: i64) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);
    if provided.eq_ignore_ascii_case(&calculated) {
        Ok(())
    } else {
        Err(ApiAuthError::InvalidHash {
            provided: provided.to_string(),
            calculated,
        })
    }
}

/// Stamp `timestamp` and `hash` onto a JSON object body.
///
/// Used by the identity adapter (and tests) to produce a signed callback.
pub fn sign(mut body: Value, shared_secret: i64) -> Value {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("timestamp".to_string(), Value::from(now_millis()));
    }
    let hash = calculate_hash(&body, shared_secret);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(hash));
    }
    body
}

/// Full check of a signed body: timestamp window, then hash.
pub fn verify_signed(body: &Value, shared_secret: i64, max_skew_ms: i64) -> Result<(), ApiAuthError> {
    if shared_secret == 0 {
        return Ok(());
    }

    let timestamp = body
        .get("timestamp")
        .and_then(Value::as_i64)
        .ok_or(ApiAuthError::MissingTimestamp)?;
    let hash = body
        .get("hash")
        .and_then(Value::as_str)
        .ok_or(ApiAuthError::MissingHash)?;

    validate_timestamp(timestamp, max_skew_ms)?;
    validate_hash(hash, body, shared_secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_64_hex_chars() {
        let hash = calculate_hash(&json!({"email": "a@b.c", "hash": "x"}), 42);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_ignores_existing_hash_value() {
        let a = calculate_hash(&json!({"email": "a@b.c", "hash": "one"}), 42);
        let b = calculate_hash(&json!({"email": "a@b.c", "hash": "two"}), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_depends_on_secret() {
        let body = json!({"email": "a@b.c"});
        assert_ne!(calculate_hash(&body, 1), calculate_hash(&body, 2));
    }

    #[test]
    fn test_canonical_json_escapes_strings() {
        let canonical = to_canonical_json(&json!({"name": "Ann \"A\""}));
        assert_eq!(canonical, r#"{"name":"Ann \"A\""}"#);
    }

    #[test]
    fn test_sign_then_verify() {
        let body = sign(json!({"email": "a@b.c", "name": "Ann"}), 777);
        assert!(verify_signed(&body, 777, 1000).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let mut body = sign(json!({"email": "a@b.c", "name": "Ann"}), 777);
        body["email"] = json!("mallory@b.c");
        assert!(matches!(
            verify_signed(&body, 777, 1000),
            Err(ApiAuthError::InvalidHash { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let mut body = json!({"email": "a@b.c", "timestamp": now_millis() - 10_000});
        let hash = calculate_hash(&body, 777);
        body["hash"] = json!(hash);
        assert!(matches!(
            verify_signed(&body, 777, 1000),
            Err(ApiAuthError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        for timestamp in [i64::MIN, i64::MAX] {
            assert!(matches!(
                validate_timestamp(timestamp, 300_000),
                Err(ApiAuthError::InvalidTimestamp { .. })
            ));

            let body = json!({"email": "a@b.c", "timestamp": timestamp, "hash": DUMMY_HASH});
            assert!(matches!(
                verify_signed(&body, 777, 300_000),
                Err(ApiAuthError::InvalidTimestamp { .. })
            ));
        }
    }

    #[test]
    fn test_verify_requires_fields() {
        assert!(matches!(
            verify_signed(&json!({"email": "a@b.c"}), 777, 1000),
            Err(ApiAuthError::MissingTimestamp)
        ));
        assert!(matches!(
            verify_signed(&json!({"timestamp": now_millis()}), 777, 1000),
            Err(ApiAuthError::MissingHash)
        ));
    }

    #[test]
    fn test_zero_secret_disables_checks() {
        assert!(verify_signed(&json!({"email": "a@b.c"}), 0, 1000).is_ok());
    }
}
