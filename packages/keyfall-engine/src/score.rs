//! Score aggregation
//!
//! Scoring per classification, with `combo` the streak *before* this judgment:
//!
//! - Perfect: `score += 100 * (1 + combo * 0.1)`, combo + 1
//! - Good: `score += 50 * (1 + combo * 0.1)`, combo + 1
//! - Miss: combo back to 0, score unchanged
//!
//! Accuracy is `(perfect * 100 + good * 50) / (judged * 100) * 100`, or 100
//! before anything has been judged.

use crate::judgment::Judgment;
use log::warn;
use serde::{Deserialize, Serialize};

/// Combo bonus per note already in the streak
pub const COMBO_BONUS: f64 = 0.1;

/// Accuracy for counts of each outcome; 100 when all are zero
pub fn accuracy_of(perfect: u32, good: u32, miss: u32) -> f64 {
    let judged = perfect as u64 + good as u64 + miss as u64;
    if judged == 0 {
        return 100.0;
    }
    let earned = perfect as f64 * 100.0 + good as f64 * 50.0;
    earned / (judged as f64 * 100.0) * 100.0
}

/// Running statistics for a session in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub score: f64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub accuracy: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0.0,
            combo: 0,
            max_combo: 0,
            perfect: 0,
            good: 0,
            miss: 0,
            accuracy: 100.0,
        }
    }
}

impl GameState {
    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.miss
    }
}

/// The finalized outcome handed to whoever persists results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub score: f64,
    /// Combo standing when the session ended
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub accuracy: f64,
}

impl SessionResult {
    /// Score as displayed, rounded to a whole number
    pub fn display_score(&self) -> String {
        format!("{:.0}", self.score)
    }

    /// Accuracy as displayed, one decimal place
    pub fn display_accuracy(&self) -> String {
        format!("{:.1}%", self.accuracy)
    }
}

impl From<&GameState> for SessionResult {
    fn from(state: &GameState) -> Self {
        Self {
            score: state.score,
            combo: state.combo,
            max_combo: state.max_combo,
            perfect: state.perfect,
            good: state.good,
            miss: state.miss,
            accuracy: state.accuracy,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    state: GameState,
    result: Option<SessionResult>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classification; returns the points it earned.
    ///
    /// Ignored once the aggregator is finalized.
    pub fn record(&mut self, judgment: Judgment) -> f64 {
        if self.result.is_some() {
            warn!("ignoring {:?} recorded after finalization", judgment);
            return 0.0;
        }

        let state = &mut self.state;
        let points = judgment.base_points() * (1.0 + state.combo as f64 * COMBO_BONUS);

        match judgment {
            Judgment::Perfect => state.perfect += 1,
            Judgment::Good => state.good += 1,
            Judgment::Miss => state.miss += 1,
        }

        if judgment.keeps_combo() {
            state.score += points;
            state.combo += 1;
            state.max_combo = state.max_combo.max(state.combo);
        } else {
            state.combo = 0;
        }

        state.accuracy = accuracy_of(state.perfect, state.good, state.miss);
        if judgment.keeps_combo() {
            points
        } else {
            0.0
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Freeze the current state. Later calls return the same snapshot.
    pub fn finalize(&mut self) -> SessionResult {
        self.result
            .get_or_insert_with(|| SessionResult::from(&self.state))
            .clone()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.result.is_some()
    }
}
