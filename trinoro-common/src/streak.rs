//! Streak and statistics aggregation
//!
//! Pure functions over a user's streak records and journal moods. Nothing in
//! here touches the store; callers load the rows and pass them in.
//!
//! Two ways of maintaining a user's streak counters exist:
//! - [`StreakPolicy::Recompute`] derives both counters from the full record
//!   set after every recorded session (default).
//! - [`StreakPolicy::Incremental`] compares today with the last meditation
//!   day and bumps, keeps or resets the stored counter.
//!
//! Under either policy the stored longest streak never decreases.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Mood, StreakRecord, UserStats};
use crate::time::days_between;

/// Upper bound on the minutes a single recorded session may carry (one day)
pub const MAX_SESSION_MINUTES: i64 = 24 * 60;

/// Whether `minutes` is an acceptable length for one recorded session
pub fn is_valid_session_minutes(minutes: i64) -> bool {
    (1..=MAX_SESSION_MINUTES).contains(&minutes)
}

/// How a user's stored streak counters are updated after a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakPolicy {
    #[default]
    Recompute,
    Incremental,
}

/// Stored per-user counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakCounters {
    pub current: u32,
    pub longest: u32,
    pub last_day: Option<NaiveDate>,
}

/// Sorted, de-duplicated days, most recent first. Days after `today` are dropped.
fn distinct_days_desc(days: &[NaiveDate], today: NaiveDate) -> Vec<NaiveDate> {
    let mut sorted: Vec<NaiveDate> = days.iter().copied().filter(|d| *d <= today).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}

/// Consecutive days ending today, or yesterday if today has no session yet.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let days = distinct_days_desc(days, today);

    let Some(first) = days.first() else {
        return 0;
    };
    if days_between(today, *first) > 1 {
        return 0;
    }

    let mut streak = 1;
    for pair in days.windows(2) {
        if days_between(pair[0], pair[1]) == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Longest run of day-over-day consecutive records anywhere in history.
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    let mut sorted: Vec<NaiveDate> = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in sorted {
        run = match previous {
            Some(prev) if days_between(day, prev) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    longest
}

/// Full recomputation from the record set, never lowering `stored_longest`.
pub fn recompute(days: &[NaiveDate], today: NaiveDate, stored_longest: u32) -> StreakCounters {
    let current = current_streak(days, today);
    let longest = longest_streak(days).max(current).max(stored_longest);
    let last_day = days.iter().copied().filter(|d| *d <= today).max();

    StreakCounters {
        current,
        longest,
        last_day,
    }
}

/// Incremental update for a session recorded on `today`.
pub fn advance_incremental(counters: StreakCounters, today: NaiveDate) -> StreakCounters {
    let current = match counters.last_day {
        Some(last) => match days_between(today, last) {
            // Already meditated today
            d if d <= 0 => counters.current.max(1),
            1 => counters.current + 1,
            _ => 1,
        },
        None => 1,
    };

    StreakCounters {
        current,
        longest: counters.longest.max(current),
        last_day: Some(counters.last_day.map_or(today, |last| last.max(today))),
    }
}

/// Count journal entries per mood.
pub fn mood_distribution<I>(moods: I) -> BTreeMap<Mood, u32>
where
    I: IntoIterator<Item = Mood>,
{
    let mut distribution = BTreeMap::new();
    for mood in moods {
        *distribution.entry(mood).or_insert(0) += 1;
    }
    distribution
}

/// Average minutes per recorded session day; 0 when there are none.
pub fn average_session_length(total_minutes: i64, total_sessions: u32) -> f64 {
    if total_sessions == 0 {
        0.0
    } else {
        total_minutes as f64 / total_sessions as f64
    }
}

/// Derive [`UserStats`] from a user's streak records and journal moods.
pub fn compute_stats(
    records: &[StreakRecord],
    moods: &[Mood],
    stored_longest: u32,
    today: NaiveDate,
) -> UserStats {
    let days: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    let counters = recompute(&days, today, stored_longest);

    let total_sessions = records.len() as u32;
    let total_minutes = records
        .iter()
        .fold(0i64, |acc, r| acc.saturating_add(r.meditation_minutes));

    UserStats {
        current_streak: counters.current,
        longest_streak: counters.longest,
        total_sessions,
        total_minutes,
        average_session_length: average_session_length(total_minutes, total_sessions),
        journal_entries: moods.len() as u32,
        mood_distribution: mood_distribution(moods.iter().copied()),
    }
}
