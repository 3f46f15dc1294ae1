//! Countdown timer for a meditation session

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_DURATION_MINUTES: u32 = 10;
/// Longest settable session. Durations also arrive from chat recommendations.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeditationTimer {
    seconds_left: u32,
    is_running: bool,
    /// Minutes
    duration: u32,
}

impl Default for MeditationTimer {
    fn default() -> Self {
        Self {
            seconds_left: 0,
            is_running: false,
            duration: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl MeditationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// No-op while already running
    pub fn start(&mut self) {
        if self.is_running {
            return;
        }
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Stop and refill; `minutes` also replaces the configured duration
    pub fn reset(&mut self, minutes: Option<u32>) {
        self.is_running = false;
        self.set_duration(minutes.unwrap_or(self.duration));
    }

    /// Clamped to [`MAX_DURATION_MINUTES`]
    pub fn set_duration(&mut self, minutes: u32) {
        let minutes = minutes.min(MAX_DURATION_MINUTES);
        self.duration = minutes;
        self.seconds_left = minutes.saturating_mul(60);
    }

    /// Advance one second. Returns true when this tick finished the session.
    pub fn tick(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        if self.seconds_left <= 1 {
            self.seconds_left = 0;
            self.is_running = false;
            return true;
        }
        self.seconds_left -= 1;
        false
    }

    /// `MM:SS`
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.seconds_left / 60, self.seconds_left % 60)
    }
}

/// Drive `timer` once a second until it finishes or is paused.
///
/// `on_finish` runs once if the countdown reaches zero.
pub fn spawn_ticker<F>(timer: Arc<Mutex<MeditationTimer>>, on_finish: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            let finished = {
                let Ok(mut timer) = timer.lock() else {
                    tracing::warn!("Timer state poisoned, stopping ticker");
                    return;
                };
                if !timer.is_running() {
                    return;
                }
                timer.tick()
            };

            if finished {
                tracing::info!("Meditation session complete");
                on_finish();
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let timer = MeditationTimer::new();
        assert_eq!(timer.duration(), 10);
        assert_eq!(timer.seconds_left(), 0);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_set_duration_refills() {
        let mut timer = MeditationTimer::new();
        timer.set_duration(5);
        assert_eq!(timer.seconds_left(), 300);
        assert_eq!(timer.display(), "05:00");
    }

    #[test]
    fn test_oversized_duration_is_clamped() {
        let mut timer = MeditationTimer::new();
        timer.set_duration(80_000_000);
        assert_eq!(timer.duration(), MAX_DURATION_MINUTES);
        assert_eq!(timer.seconds_left(), 86_400);
        assert_eq!(timer.display(), "1440:00");

        timer.reset(Some(u32::MAX));
        assert_eq!(timer.duration(), MAX_DURATION_MINUTES);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_tick_counts_down_and_finishes() {
        let mut timer = MeditationTimer::new();
        timer.reset(Some(1));
        timer.start();

        for _ in 0..59 {
            assert!(!timer.tick());
        }
        assert_eq!(timer.display(), "00:01");
        assert!(timer.tick());
        assert_eq!(timer.seconds_left(), 0);
        assert!(!timer.is_running());
        assert!(!timer.tick());
    }

    #[test]
    fn test_paused_timer_does_not_tick() {
        let mut timer = MeditationTimer::new();
        timer.reset(None);
        timer.start();
        timer.tick();
        timer.pause();
        timer.tick();
        assert_eq!(timer.seconds_left(), 599);
    }

    #[test]
    fn test_reset_stops_and_keeps_duration() {
        let mut timer = MeditationTimer::new();
        timer.set_duration(20);
        timer.start();
        timer.tick();
        timer.reset(None);
        assert!(!timer.is_running());
        assert_eq!(timer.seconds_left(), 1200);
        assert_eq!(timer.duration(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_finishes_session() {
        let timer = Arc::new(Mutex::new(MeditationTimer::new()));
        {
            let mut t = timer.lock().unwrap();
            t.set_duration(1);
            t.start();
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = spawn_ticker(timer.clone(), move || {
            let _ = tx.send(());
        });

        rx.await.unwrap();
        handle.await.unwrap();
        let t = timer.lock().unwrap();
        assert_eq!(t.seconds_left(), 0);
        assert!(!t.is_running());
    }
}
