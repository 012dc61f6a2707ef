//! Engine configuration
//!
//! Tunable judgment geometry and metronome defaults, loadable from YAML:
//!
//! ```yaml
//! judgment:
//!   fall-speed: 300
//!   hit-zone: 520
//!   perfect-window: 30
//!   good-window: 60
//!   overrun-margin: 100
//!   max-travel: 600
//! metronome:
//!   bpm: 120
//!   beats-per-measure: 4
//! ```
//!
//! Every field is optional and falls back to the defaults above.

use crate::beat::{BeatConfig, BeatsPerMeasure};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Judgment geometry, in position units (the vertical travel of a note).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JudgmentConfig {
    /// Position units travelled per second after onset
    pub fall_speed: f64,
    /// Position at which a note is due
    pub hit_zone: f64,
    /// Distance from the hit zone strictly below which a hit is Perfect
    pub perfect_window: f64,
    /// Distance from the hit zone strictly below which a hit is Good
    pub good_window: f64,
    /// How far past the hit zone an unhit note may travel before it is Missed
    pub overrun_margin: f64,
    /// Progress is clamped here; an unhit note reaching it is Missed
    pub max_travel: f64,
}

impl Default for JudgmentConfig {
    fn default() -> Self {
        Self {
            fall_speed: 300.0,
            hit_zone: 520.0,
            perfect_window: 30.0,
            good_window: 60.0,
            overrun_margin: 100.0,
            max_travel: 600.0,
        }
    }
}

impl JudgmentConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let finite = [
            self.fall_speed,
            self.hit_zone,
            self.perfect_window,
            self.good_window,
            self.overrun_margin,
            self.max_travel,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(EngineError::ConfigError(
                "judgment values must be finite numbers".to_string(),
            ));
        }
        if self.fall_speed <= 0.0 {
            return Err(EngineError::ConfigError(format!(
                "fall-speed must be positive, got {}",
                self.fall_speed
            )));
        }
        if self.perfect_window <= 0.0 || self.perfect_window > self.good_window {
            return Err(EngineError::ConfigError(format!(
                "perfect-window ({}) must be positive and no wider than good-window ({})",
                self.perfect_window, self.good_window
            )));
        }
        if self.hit_zone <= 0.0 || self.max_travel <= 0.0 {
            return Err(EngineError::ConfigError(
                "hit-zone and max-travel must be positive".to_string(),
            ));
        }
        if self.hit_zone + self.perfect_window > self.max_travel {
            return Err(EngineError::ConfigError(format!(
                "hit-zone ({}) plus perfect-window ({}) must not exceed max-travel ({})",
                self.hit_zone, self.perfect_window, self.max_travel
            )));
        }
        if self.overrun_margin < 0.0 {
            return Err(EngineError::ConfigError(format!(
                "overrun-margin must not be negative, got {}",
                self.overrun_margin
            )));
        }
        Ok(())
    }
}

/// Raw metronome section, validated into a [`BeatConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MetronomeConfig {
    pub bpm: u16,
    pub beats_per_measure: u8,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        let beat = BeatConfig::default();
        Self {
            bpm: beat.bpm(),
            beats_per_measure: beat.beats_per_measure().get(),
        }
    }
}

impl MetronomeConfig {
    pub fn to_beat_config(&self) -> Result<BeatConfig, EngineError> {
        BeatConfig::new(self.bpm, BeatsPerMeasure::new(self.beats_per_measure)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub judgment: JudgmentConfig,
    pub metronome: MetronomeConfig,
}

impl EngineConfig {
    /// Parse and validate a YAML configuration document.
    ///
    /// # Example
    /// ```
    /// use keyfall_engine::EngineConfig;
    ///
    /// let config = EngineConfig::from_yaml("judgment:\n  fall-speed: 450\n")?;
    /// assert_eq!(config.judgment.fall_speed, 450.0);
    /// assert_eq!(config.judgment.hit_zone, 520.0);
    /// # Ok::<(), keyfall_engine::EngineError>(())
    /// ```
    pub fn from_yaml(source: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = if source.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(source).map_err(|e| EngineError::ConfigError(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.judgment.validate()?;
        self.metronome.to_beat_config().map(|_| ())
    }
}
