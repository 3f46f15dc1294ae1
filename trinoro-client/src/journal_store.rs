//! Client-side journal state

use std::collections::BTreeMap;
use tracing::warn;
use trinoro_common::models::{JournalEntry, Mood};
use trinoro_common::streak::mood_distribution;

use crate::client::TrinoroClient;

#[derive(Debug, Default)]
pub struct JournalStore {
    /// Newest first
    pub entries: Vec<JournalEntry>,
    /// Distinct tags across loaded entries, in first-seen order
    pub tags: Vec<String>,
    pub search_query: String,
    pub error: Option<String>,
}

impl JournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_entry(&mut self, client: &TrinoroClient, mood: Mood, text: &str, tags: &[String]) {
        self.error = None;
        match client.create_entry(mood, text, tags).await {
            Ok(entry) => self.entries.insert(0, entry),
            Err(e) => {
                warn!("Failed to save journal entry: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    pub async fn load_entries(&mut self, client: &TrinoroClient) {
        self.error = None;
        match client.list_entries(None, None).await {
            Ok(entries) => {
                self.tags = unique_tags(&entries);
                self.entries = entries;
            }
            Err(e) => {
                warn!("Failed to load journal entries: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    /// Blank queries reload the full list
    pub async fn search_entries(&mut self, client: &TrinoroClient, query: &str) {
        if query.trim().is_empty() {
            self.search_query.clear();
            self.load_entries(client).await;
            return;
        }

        self.error = None;
        self.search_query = query.to_string();
        match client.search_entries(query).await {
            Ok(entries) => self.entries = entries,
            Err(e) => {
                warn!("Failed to search journal entries: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn mood_distribution(&self) -> BTreeMap<Mood, u32> {
        mood_distribution(self.entries.iter().map(|e| e.mood))
    }

    pub fn entries_by_mood(&self, mood: Mood) -> Vec<&JournalEntry> {
        self.entries.iter().filter(|e| e.mood == mood).collect()
    }

    pub fn entries_by_tag(&self, tag: &str) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.tags.iter().any(|t| t == tag))
            .collect()
    }
}

fn unique_tags(entries: &[JournalEntry]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}
