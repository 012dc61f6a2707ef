//! Hit judgment
//!
//! Correlates the currently pressed keys with active notes. For each pressed
//! key the judge picks the matching active note nearest the hit zone (lowest
//! index on a tie) and classifies the distance:
//!
//! | distance            | result  |
//! |---------------------|---------|
//! | `< perfect_window`  | Perfect |
//! | `< good_window`     | Good    |
//! | otherwise           | ignored |
//!
//! A press too far from the hit zone is not a Miss; misses come only from the
//! note field's overrun rule.

use crate::config::JudgmentConfig;
use crate::field::NoteField;
use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Perfect,
    Good,
    Miss,
}

impl Judgment {
    /// Points before the combo multiplier
    pub fn base_points(self) -> f64 {
        match self {
            Judgment::Perfect => 100.0,
            Judgment::Good => 50.0,
            Judgment::Miss => 0.0,
        }
    }

    pub fn keeps_combo(self) -> bool {
        self != Judgment::Miss
    }
}

/// The judge's request that the field move a note to Hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRequest {
    pub index: usize,
    pub judgment: Judgment,
    pub distance: f64,
}

/// A classification reported upward to the score aggregator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgedNote {
    pub index: usize,
    pub id: String,
    pub pitch: Pitch,
    pub judgment: Judgment,
    /// Distance from the hit zone; `None` for misses
    pub distance: Option<f64>,
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitJudge {
    hit_zone: f64,
    perfect_window: f64,
    good_window: f64,
}

impl HitJudge {
    pub fn new(config: &JudgmentConfig) -> Self {
        Self {
            hit_zone: config.hit_zone,
            perfect_window: config.perfect_window,
            good_window: config.good_window,
        }
    }

    pub fn classify(&self, distance: f64) -> Option<Judgment> {
        if distance < self.perfect_window {
            Some(Judgment::Perfect)
        } else if distance < self.good_window {
            Some(Judgment::Good)
        } else {
            None
        }
    }

    /// Decide which notes the pressed keys hit. Reads the field only.
    ///
    /// At most one request per pressed key, each for a distinct note.
    pub fn judge(&self, field: &NoteField, pressed: &BTreeSet<Pitch>) -> Vec<HitRequest> {
        let mut requests = Vec::new();

        for &pitch in pressed {
            let mut nearest: Option<(usize, f64)> = None;
            for (index, live) in field.active() {
                if live.pitch() != pitch || live.is_judged() {
                    continue;
                }
                let distance = (live.progress() - self.hit_zone).abs();
                // strict comparison keeps the lowest index on a tie
                if nearest.map_or(true, |(_, best)| distance < best) {
                    nearest = Some((index, distance));
                }
            }

            if let Some((index, distance)) = nearest {
                if let Some(judgment) = self.classify(distance) {
                    requests.push(HitRequest {
                        index,
                        judgment,
                        distance,
                    });
                }
            }
        }

        requests
    }
}

impl Default for HitJudge {
    fn default() -> Self {
        Self::new(&JudgmentConfig::default())
    }
}
