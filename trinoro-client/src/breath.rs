//! Breath pacing and binaural beat controls
//!
//! Two mutually exclusive practice aids sit beside the timer:
//!
//! - [`BreathPacer`] walks a breathing pattern (Inhale/Hold/Exhale[/Hold]),
//!   counting each phase down once a second.
//! - [`BinauralBeats`] holds the selected left/right tone pair. Tone
//!   synthesis is the front end's job. While beats are active the
//!   [`AmbientMixer`] is disabled.
//!
//! [`BreathControls`] switches between the two and stops whichever is
//! running when the mode changes.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ambient::AmbientMixer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl fmt::Display for BreathPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BreathPhase::Inhale => "Inhale",
            BreathPhase::Hold => "Hold",
            BreathPhase::Exhale => "Exhale",
        };
        f.write_str(label)
    }
}

/// Named breathing pattern; each step is a phase length in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathPreset {
    pub label: &'static str,
    pub pattern: &'static [u32],
}

impl BreathPreset {
    /// Phase for step `index` of this pattern
    pub fn phase(&self, index: usize) -> BreathPhase {
        match (self.pattern.len(), index) {
            (_, 0) => BreathPhase::Inhale,
            (3, 1) | (4, 1) | (4, 3) => BreathPhase::Hold,
            _ => BreathPhase::Exhale,
        }
    }

    /// `4-7-8`
    pub fn describe(&self) -> String {
        self.pattern
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

pub const BREATH_PRESETS: &[BreathPreset] = &[
    BreathPreset {
        label: "Box (4-4-4-4)",
        pattern: &[4, 4, 4, 4],
    },
    BreathPreset {
        label: "4-7-8",
        pattern: &[4, 7, 8],
    },
    BreathPreset {
        label: "Calm (5-5)",
        pattern: &[5, 5],
    },
];

/// Left/right carrier frequencies in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinauralPreset {
    pub label: &'static str,
    pub left_hz: u32,
    pub right_hz: u32,
}

impl BinauralPreset {
    pub fn beat_hz(&self) -> u32 {
        self.left_hz.abs_diff(self.right_hz)
    }
}

pub const BINAURAL_PRESETS: &[BinauralPreset] = &[
    BinauralPreset {
        label: "Focus",
        left_hz: 220,
        right_hz: 230,
    },
    BinauralPreset {
        label: "Relax",
        left_hz: 200,
        right_hz: 210,
    },
    BinauralPreset {
        label: "Sleep",
        left_hz: 180,
        right_hz: 186,
    },
    BinauralPreset {
        label: "Deep",
        left_hz: 150,
        right_hz: 158,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreathPacer {
    preset: BreathPreset,
    active: bool,
    step: usize,
    seconds_left: u32,
}

impl Default for BreathPacer {
    fn default() -> Self {
        Self {
            preset: BREATH_PRESETS[0],
            active: false,
            step: 0,
            seconds_left: 0,
        }
    }
}

impl BreathPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(&self) -> &BreathPreset {
        &self.preset
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current phase; `None` while stopped
    pub fn phase(&self) -> Option<BreathPhase> {
        self.active.then(|| self.preset.phase(self.step))
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// Pick a preset by label. Refused while running or for unknown labels.
    pub fn select_preset(&mut self, label: &str) -> bool {
        if self.active {
            return false;
        }
        match BREATH_PRESETS.iter().find(|p| p.label == label) {
            Some(preset) => {
                self.preset = *preset;
                true
            }
            None => false,
        }
    }

    /// Begin at the first inhale. No-op while already running.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.step = 0;
        self.seconds_left = self.step_length(0);
        debug!(pattern = %self.preset.describe(), "Breath pacing started");
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.step = 0;
        self.seconds_left = 0;
    }

    /// Advance one second. Returns true when a new phase began.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        if self.seconds_left <= 1 {
            self.step = (self.step + 1) % self.preset.pattern.len().max(1);
            self.seconds_left = self.step_length(self.step);
            return true;
        }
        self.seconds_left -= 1;
        false
    }

    fn step_length(&self, step: usize) -> u32 {
        self.preset.pattern.get(step).copied().unwrap_or(1).max(1)
    }
}

/// Drive `pacer` once a second until it is stopped
pub fn spawn_pacer(pacer: Arc<Mutex<BreathPacer>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await;

        loop {
            interval.tick().await;

            let Ok(mut state) = pacer.lock() else {
                warn!("Breath pacer state poisoned, stopping");
                return;
            };
            if !state.is_active() {
                return;
            }
            state.tick();
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinauralBeats {
    preset: BinauralPreset,
    active: bool,
}

impl Default for BinauralBeats {
    fn default() -> Self {
        Self {
            preset: BINAURAL_PRESETS[0],
            active: false,
        }
    }
}

impl BinauralBeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(&self) -> &BinauralPreset {
        &self.preset
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Refused while playing or for unknown labels
    pub fn select_preset(&mut self, label: &str) -> bool {
        if self.active {
            return false;
        }
        match BINAURAL_PRESETS.iter().find(|p| p.label == label) {
            Some(preset) => {
                self.preset = *preset;
                true
            }
            None => false,
        }
    }

    /// Start the beats and silence the ambient mixer
    pub fn start(&mut self, mixer: &mut AmbientMixer) {
        self.active = true;
        mixer.set_enabled(false);
    }

    pub fn stop(&mut self, mixer: &mut AmbientMixer) {
        self.active = false;
        mixer.set_enabled(true);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Binaural,
    Breath,
}

/// Mode switch over the pacer and the beats
#[derive(Debug, Default)]
pub struct BreathControls {
    mode: Option<ControlMode>,
    pub pacer: BreathPacer,
    pub binaural: BinauralBeats,
}

impl BreathControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<ControlMode> {
        self.mode
    }

    /// Switching modes stops anything running
    pub fn set_mode(&mut self, mode: ControlMode, mixer: &mut AmbientMixer) {
        if self.binaural.is_active() {
            self.binaural.stop(mixer);
        }
        if self.pacer.is_active() {
            self.pacer.stop();
        }
        self.mode = Some(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pacer: &mut BreathPacer, seconds: usize) -> Vec<(BreathPhase, u32)> {
        (0..seconds)
            .map(|_| {
                pacer.tick();
                (pacer.phase().unwrap(), pacer.seconds_left())
            })
            .collect()
    }

    #[test]
    fn test_preset_tables() {
        let labels: Vec<_> = BREATH_PRESETS.iter().map(|p| p.label).collect();
        assert_eq!(labels, ["Box (4-4-4-4)", "4-7-8", "Calm (5-5)"]);
        assert_eq!(BREATH_PRESETS[1].describe(), "4-7-8");

        let beats: Vec<_> = BINAURAL_PRESETS.iter().map(|p| (p.label, p.beat_hz())).collect();
        assert_eq!(beats, [("Focus", 10), ("Relax", 10), ("Sleep", 6), ("Deep", 8)]);
    }

    #[test]
    fn test_phase_names_follow_pattern_length() {
        let box_breath = BREATH_PRESETS[0];
        let phases: Vec<_> = (0..4).map(|i| box_breath.phase(i)).collect();
        assert_eq!(
            phases,
            [BreathPhase::Inhale, BreathPhase::Hold, BreathPhase::Exhale, BreathPhase::Hold]
        );

        let calm = BREATH_PRESETS[2];
        assert_eq!(calm.phase(1), BreathPhase::Exhale);
        assert_eq!(BREATH_PRESETS[1].phase(2).to_string(), "Exhale");
    }

    #[test]
    fn test_start_shows_first_inhale() {
        let mut pacer = BreathPacer::new();
        assert_eq!(pacer.phase(), None);

        pacer.start();
        assert_eq!(pacer.phase(), Some(BreathPhase::Inhale));
        assert_eq!(pacer.seconds_left(), 4);
    }

    #[test]
    fn test_each_phase_lasts_its_pattern_length() {
        let mut pacer = BreathPacer::new();
        assert!(pacer.select_preset("4-7-8"));
        pacer.start();

        let ticks = run(&mut pacer, 19);
        assert_eq!(ticks[2], (BreathPhase::Inhale, 1));
        assert_eq!(ticks[3], (BreathPhase::Hold, 7));
        assert_eq!(ticks[9], (BreathPhase::Hold, 1));
        assert_eq!(ticks[10], (BreathPhase::Exhale, 8));
        // Cycle wraps back to inhale after 4 + 7 + 8 seconds
        assert_eq!(ticks[18], (BreathPhase::Inhale, 4));
    }

    #[test]
    fn test_start_twice_does_not_restart() {
        let mut pacer = BreathPacer::new();
        pacer.start();
        pacer.tick();
        pacer.start();
        assert_eq!(pacer.seconds_left(), 3);
    }

    #[test]
    fn test_stop_clears_state() {
        let mut pacer = BreathPacer::new();
        pacer.start();
        pacer.tick();
        pacer.stop();

        assert!(!pacer.is_active());
        assert_eq!(pacer.phase(), None);
        assert_eq!(pacer.seconds_left(), 0);
        assert!(!pacer.tick());
    }

    #[test]
    fn test_preset_locked_while_running() {
        let mut pacer = BreathPacer::new();
        pacer.start();
        assert!(!pacer.select_preset("Calm (5-5)"));
        pacer.stop();
        assert!(pacer.select_preset("Calm (5-5)"));
        assert!(!pacer.select_preset("Nope"));
        assert_eq!(pacer.preset().label, "Calm (5-5)");
    }

    #[test]
    fn test_binaural_disables_ambient() {
        let mut mixer = AmbientMixer::new();
        let mut beats = BinauralBeats::new();
        assert!(beats.select_preset("Sleep"));

        beats.start(&mut mixer);
        assert!(beats.is_active());
        assert!(!mixer.is_enabled());
        assert!(!beats.select_preset("Deep"));

        beats.stop(&mut mixer);
        assert!(mixer.is_enabled());
        assert_eq!(beats.preset().right_hz, 186);
    }

    #[test]
    fn test_switching_mode_stops_everything() {
        let mut mixer = AmbientMixer::new();
        let mut controls = BreathControls::new();

        controls.set_mode(ControlMode::Binaural, &mut mixer);
        controls.binaural.start(&mut mixer);
        controls.set_mode(ControlMode::Breath, &mut mixer);
        assert!(!controls.binaural.is_active());
        assert!(mixer.is_enabled());

        controls.pacer.start();
        controls.set_mode(ControlMode::Binaural, &mut mixer);
        assert!(!controls.pacer.is_active());
        assert_eq!(controls.mode(), Some(ControlMode::Binaural));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_task_advances_and_exits_on_stop() {
        let pacer = Arc::new(Mutex::new(BreathPacer::new()));
        pacer.lock().unwrap().start();

        let handle = spawn_pacer(pacer.clone());
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        {
            let p = pacer.lock().unwrap();
            assert_eq!(p.phase(), Some(BreathPhase::Hold));
            assert_eq!(p.seconds_left(), 4);
        }

        pacer.lock().unwrap().stop();
        handle.await.unwrap();
    }
}
