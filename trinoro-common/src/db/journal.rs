//! Journal entries
//!
//! Entries are immutable once written. Tags are stored as a JSON array.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::{JournalEntry, Mood, NewJournalEntry};
use crate::{time, Error, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

fn entry_from_row(row: &SqliteRow) -> Result<JournalEntry> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let mood: String = row.try_get("mood")?;
    let tags: String = row.try_get("tags")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(JournalEntry {
        id: parse_uuid("id", &id)?,
        user_id: parse_uuid("user_id", &user_id)?,
        mood: mood.parse()?,
        text: row.try_get("text")?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| Error::Internal(format!("Failed to parse tags: {}", e)))?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

/// Escape LIKE wildcards so user text matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub async fn create_entry(
    pool: &SqlitePool,
    user_id: Uuid,
    entry: &NewJournalEntry,
) -> Result<JournalEntry> {
    let now = time::now();
    let journal_entry = JournalEntry {
        id: Uuid::new_v4(),
        user_id,
        mood: entry.mood,
        text: entry.text.clone(),
        tags: entry.tags.clone(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO journal_entries (id, user_id, mood, text, tags, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(journal_entry.id.to_string())
    .bind(user_id.to_string())
    .bind(journal_entry.mood.as_str())
    .bind(&journal_entry.text)
    .bind(serde_json::to_string(&journal_entry.tags)?)
    .bind(format_timestamp(&journal_entry.created_at))
    .bind(format_timestamp(&journal_entry.updated_at))
    .execute(pool)
    .await?;

    Ok(journal_entry)
}

/// Newest first, paginated. `limit` is clamped to 1..=MAX_PAGE_SIZE.
pub async fn list_entries(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
    skip: i64,
) -> Result<Vec<JournalEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, mood, text, tags, created_at, updated_at
        FROM journal_entries
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(limit.clamp(1, MAX_PAGE_SIZE))
    .bind(skip.max(0))
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// Case-insensitive substring match over entry text and tags, newest first.
pub async fn search_entries(pool: &SqlitePool, user_id: Uuid, query: &str) -> Result<Vec<JournalEntry>> {
    let pattern = like_pattern(query.trim());

    let rows = sqlx::query(
        r#"
        SELECT id, user_id, mood, text, tags, created_at, updated_at
        FROM journal_entries
        WHERE user_id = ?
          AND (
            text LIKE ? ESCAPE '\'
            OR EXISTS (
                SELECT 1 FROM json_each(journal_entries.tags)
                WHERE json_each.value LIKE ? ESCAPE '\'
            )
          )
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// Mood of every entry the user has written
pub async fn list_moods(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Mood>> {
    let moods: Vec<String> = sqlx::query_scalar("SELECT mood FROM journal_entries WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await?;

    moods.iter().map(|m| m.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, users::upsert_user};
    use crate::models::UserProfile;

    async fn setup() -> (SqlitePool, Uuid) {
        let pool = init_in_memory().await.unwrap();
        let user = upsert_user(
            &pool,
            &UserProfile {
                email: "ann@example.com".to_string(),
                name: "Ann".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();
        (pool, user.id)
    }

    fn new_entry(mood: Mood, text: &str, tags: &[&str]) -> NewJournalEntry {
        NewJournalEntry {
            mood,
            text: text.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let (pool, user_id) = setup().await;
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "first", &[])).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        create_entry(&pool, user_id, &new_entry(Mood::Happy, "second", &["sun"])).await.unwrap();

        let entries = list_entries(&pool, user_id, DEFAULT_PAGE_SIZE, 0).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "second");
        assert_eq!(entries[0].tags, vec!["sun".to_string()]);
        assert_eq!(entries[1].text, "first");
    }

    #[tokio::test]
    async fn test_list_respects_limit_and_skip() {
        let (pool, user_id) = setup().await;
        for i in 0..5 {
            create_entry(&pool, user_id, &new_entry(Mood::Neutral, &format!("entry {}", i), &[]))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = list_entries(&pool, user_id, 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].text, "entry 3");
        assert_eq!(page[1].text, "entry 2");
    }

    #[tokio::test]
    async fn test_search_matches_text_case_insensitively() {
        let (pool, user_id) = setup().await;
        create_entry(&pool, user_id, &new_entry(Mood::Sad, "Rainy Monday", &[])).await.unwrap();
        create_entry(&pool, user_id, &new_entry(Mood::Happy, "Sunny day", &[])).await.unwrap();

        let found = search_entries(&pool, user_id, "rainy").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Rainy Monday");
    }

    #[tokio::test]
    async fn test_search_matches_tags() {
        let (pool, user_id) = setup().await;
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "walk", &["Gratitude", "outdoors"]))
            .await
            .unwrap();
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "desk", &["work"])).await.unwrap();

        let found = search_entries(&pool, user_id, "gratitude").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "walk");
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (pool, user_id) = setup().await;
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "plain text", &[])).await.unwrap();
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "100% focused", &[])).await.unwrap();

        let found = search_entries(&pool, user_id, "%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "100% focused");
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_user() {
        let (pool, user_id) = setup().await;
        let other = upsert_user(
            &pool,
            &UserProfile {
                email: "bob@example.com".to_string(),
                name: "Bob".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();

        create_entry(&pool, other.id, &new_entry(Mood::Angry, "bob's day", &[])).await.unwrap();

        assert!(list_entries(&pool, user_id, 50, 0).await.unwrap().is_empty());
        assert!(search_entries(&pool, user_id, "day").await.unwrap().is_empty());
        assert!(list_moods(&pool, user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_moods() {
        let (pool, user_id) = setup().await;
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "a", &[])).await.unwrap();
        create_entry(&pool, user_id, &new_entry(Mood::Calm, "b", &[])).await.unwrap();
        create_entry(&pool, user_id, &new_entry(Mood::Excited, "c", &[])).await.unwrap();

        let mut moods = list_moods(&pool, user_id).await.unwrap();
        moods.sort();
        assert_eq!(moods, vec![Mood::Calm, Mood::Calm, Mood::Excited]);
    }
}
