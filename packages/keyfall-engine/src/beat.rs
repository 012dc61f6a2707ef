//! # Beat Scheduler
//!
//! The metronome clock. Independent of the note timeline; it only shares the
//! caller's notion of "now".
//!
//! ## Drift
//! The k-th beat after start is due at `origin + k * interval`. Targets are
//! always computed from the origin, never by re-arming a countdown from the
//! moment the previous beat fired, so scheduling overhead can't accumulate:
//! at 120 bpm the tenth beat is due at exactly `origin + 5000`.
//!
//! ## Tempo changes
//! A new tempo or meter set while running applies from the next scheduled
//! beat onward. That beat keeps its target; the segment after it is rebased
//! on it with the new interval.
//!
//! ## Example
//! ```rust
//! use keyfall_engine::{BeatConfig, BeatScheduler};
//!
//! let mut metronome = BeatScheduler::new(BeatConfig::default());
//! metronome.start(0.0);
//! let beats = metronome.poll(2000.0);
//! assert_eq!(beats.len(), 4);
//! assert_eq!(beats[0].beat, 1);
//! assert!(beats[0].accent);
//! assert_eq!(beats[3].target_ms, 2000.0);
//! ```

use crate::error::EngineError;
use log::debug;
use serde::Serialize;

pub const MIN_BPM: u16 = 40;
pub const MAX_BPM: u16 = 240;
pub const DEFAULT_BPM: u16 = 120;

/// Supported meters, in beats per measure
pub const SUPPORTED_BEATS_PER_MEASURE: [u8; 4] = [3, 4, 5, 6];

/// Beats in one measure; only [`SUPPORTED_BEATS_PER_MEASURE`] can be built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BeatsPerMeasure(u8);

impl BeatsPerMeasure {
    pub fn new(beats: u8) -> Result<Self, EngineError> {
        if SUPPORTED_BEATS_PER_MEASURE.contains(&beats) {
            Ok(Self(beats))
        } else {
            Err(EngineError::ConfigError(format!(
                "beats per measure must be one of {:?}, got {}",
                SUPPORTED_BEATS_PER_MEASURE, beats
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for BeatsPerMeasure {
    fn default() -> Self {
        Self(4)
    }
}

/// Named tempos offered as quick picks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TempoPreset {
    Largo,
    Andante,
    Moderato,
    Allegro,
}

impl TempoPreset {
    pub const ALL: [TempoPreset; 4] = [
        TempoPreset::Largo,
        TempoPreset::Andante,
        TempoPreset::Moderato,
        TempoPreset::Allegro,
    ];

    pub fn bpm(self) -> u16 {
        match self {
            TempoPreset::Largo => 60,
            TempoPreset::Andante => 90,
            TempoPreset::Moderato => 120,
            TempoPreset::Allegro => 150,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TempoPreset::Largo => "Largo",
            TempoPreset::Andante => "Andante",
            TempoPreset::Moderato => "Moderato",
            TempoPreset::Allegro => "Allegro",
        }
    }
}

/// A validated tempo and meter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatConfig {
    bpm: u16,
    beats_per_measure: BeatsPerMeasure,
}

impl BeatConfig {
    pub fn new(bpm: u16, beats_per_measure: BeatsPerMeasure) -> Result<Self, EngineError> {
        check_bpm(bpm)?;
        Ok(Self {
            bpm,
            beats_per_measure,
        })
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn beats_per_measure(&self) -> BeatsPerMeasure {
        self.beats_per_measure
    }

    /// Milliseconds between beats
    pub fn interval_ms(&self) -> f64 {
        60_000.0 / self.bpm as f64
    }
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            beats_per_measure: BeatsPerMeasure::default(),
        }
    }
}

fn check_bpm(bpm: u16) -> Result<(), EngineError> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(())
    } else {
        Err(EngineError::ConfigError(format!(
            "bpm must be between {} and {}, got {}",
            MIN_BPM, MAX_BPM, bpm
        )))
    }
}

/// One emitted beat
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatEvent {
    /// 1-based count of beats since start
    pub sequence: u64,
    /// Position in the measure, 1-based
    pub beat: u8,
    /// First beat of the measure
    pub accent: bool,
    /// Absolute time the beat was due, in the caller's clock
    pub target_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatState {
    pub bpm: u16,
    pub beats_per_measure: u8,
    /// 0 when stopped
    pub current_beat: u8,
    pub running: bool,
}

#[derive(Debug, Clone)]
pub struct BeatScheduler {
    config: BeatConfig,
    running: bool,
    current_beat: u8,
    emitted: u64,
    // Beats from `anchor_sequence` on are due at
    // anchor_ms + (sequence - anchor_sequence) * segment_interval
    anchor_ms: f64,
    anchor_sequence: u64,
    segment_interval: f64,
}

impl BeatScheduler {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            config,
            running: false,
            current_beat: 0,
            emitted: 0,
            anchor_ms: 0.0,
            anchor_sequence: 0,
            segment_interval: config.interval_ms(),
        }
    }

    pub fn config(&self) -> BeatConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_beat(&self) -> u8 {
        self.current_beat
    }

    pub fn state(&self) -> BeatState {
        BeatState {
            bpm: self.config.bpm,
            beats_per_measure: self.config.beats_per_measure.get(),
            current_beat: self.current_beat,
            running: self.running,
        }
    }

    /// Begin emitting; the first beat is due one interval after `now`.
    /// Starting a running scheduler does nothing.
    pub fn start(&mut self, now: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.current_beat = 0;
        self.emitted = 0;
        self.anchor_ms = now;
        self.anchor_sequence = 0;
        self.segment_interval = self.config.interval_ms();
        debug!("beat scheduler started at {:.1} ({} bpm)", now, self.config.bpm);
    }

    /// Stop and forget every pending beat. Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
        self.current_beat = 0;
        self.emitted = 0;
    }

    /// Stop and restore the default tempo and meter.
    pub fn reset(&mut self) {
        self.stop();
        self.config = BeatConfig::default();
        self.segment_interval = self.config.interval_ms();
    }

    /// Absolute time of the next beat, if running
    pub fn next_target(&self) -> Option<f64> {
        if !self.running {
            return None;
        }
        Some(self.target_of(self.emitted + 1))
    }

    fn target_of(&self, sequence: u64) -> f64 {
        self.anchor_ms + (sequence - self.anchor_sequence) as f64 * self.segment_interval
    }

    /// Emit every beat due at or before `now`, each stamped with its own target.
    pub fn poll(&mut self, now: f64) -> Vec<BeatEvent> {
        let mut beats = Vec::new();
        while let Some(target) = self.next_target() {
            if target > now {
                break;
            }
            self.emitted += 1;
            let per_measure = self.config.beats_per_measure.get();
            self.current_beat = if self.current_beat >= per_measure {
                1
            } else {
                self.current_beat + 1
            };
            let event = BeatEvent {
                sequence: self.emitted,
                beat: self.current_beat,
                accent: self.current_beat == 1,
                target_ms: target,
            };
            debug!(
                "beat {} ({}/{}) due {:.1}",
                event.sequence, event.beat, per_measure, target
            );
            beats.push(event);
        }
        beats
    }

    /// Change tempo. Out-of-range values are rejected and the old tempo kept.
    pub fn set_bpm(&mut self, bpm: u16) -> Result<(), EngineError> {
        check_bpm(bpm)?;
        if bpm == self.config.bpm {
            return Ok(());
        }
        self.rebase_next_beat();
        self.config.bpm = bpm;
        self.segment_interval = self.config.interval_ms();
        Ok(())
    }

    pub fn set_beats_per_measure(&mut self, beats: u8) -> Result<(), EngineError> {
        self.config.beats_per_measure = BeatsPerMeasure::new(beats)?;
        Ok(())
    }

    pub fn set_preset(&mut self, preset: TempoPreset) -> Result<(), EngineError> {
        self.set_bpm(preset.bpm())
    }

    /// Anchor the segment on the already scheduled next beat.
    fn rebase_next_beat(&mut self) {
        if !self.running {
            return;
        }
        let next = self.emitted + 1;
        self.anchor_ms = self.target_of(next);
        self.anchor_sequence = next;
    }
}

impl Default for BeatScheduler {
    fn default() -> Self {
        Self::new(BeatConfig::default())
    }
}
