//! Client-side streak calendar and stats

use tracing::warn;
use trinoro_common::models::{StreakRecord, UserStats};
use trinoro_common::time;

use crate::client::TrinoroClient;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// `45m`, `1h`, `1h 30m`
pub fn format_duration(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("{}h {}m", hours, rest)
    } else {
        format!("{}h", hours)
    }
}

/// English month name for 1..=12
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get((month as usize).checked_sub(1)?).copied()
}

#[derive(Debug)]
pub struct StreakStore {
    pub stats: Option<UserStats>,
    pub calendar: Vec<StreakRecord>,
    pub current_year: i32,
    pub current_month: u32,
    pub error: Option<String>,
}

impl Default for StreakStore {
    fn default() -> Self {
        let (current_year, current_month) = time::current_year_month();
        Self {
            stats: None,
            calendar: Vec::new(),
            current_year,
            current_month,
            error: None,
        }
    }
}

impl StreakStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_stats(&mut self, client: &TrinoroClient) {
        self.error = None;
        match client.stats().await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => {
                warn!("Failed to load stats: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    /// Load a month; missing arguments fall back to the store's current month.
    /// On success the loaded month becomes the current one.
    pub async fn load_calendar(&mut self, client: &TrinoroClient, year: Option<i32>, month: Option<u32>) {
        let year = year.unwrap_or(self.current_year);
        let month = month.unwrap_or(self.current_month);

        self.error = None;
        match client.calendar(year, month).await {
            Ok(records) => {
                self.calendar = records;
                self.current_year = year;
                self.current_month = month;
            }
            Err(e) => {
                warn!("Failed to load streak calendar: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    /// Record a session, then refresh stats and the calendar
    pub async fn record_session(&mut self, client: &TrinoroClient, minutes: i64, has_journal_entry: bool) {
        self.error = None;
        if let Err(e) = client.record_session(minutes, has_journal_entry).await {
            warn!("Failed to record session: {}", e);
            self.error = Some(e.user_message());
            return;
        }

        self.load_stats(client).await;
        self.load_calendar(client, None, None).await;
    }

    /// Switch the displayed month and load it
    pub async fn set_current_month(&mut self, client: &TrinoroClient, year: i32, month: u32) {
        self.current_year = year;
        self.current_month = month;
        self.load_calendar(client, Some(year), Some(month)).await;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
