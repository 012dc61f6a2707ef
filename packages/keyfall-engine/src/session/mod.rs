//! # Session Module
//!
//! Drives one play-through of a chart on a single cooperative timeline.
//!
//! ## Tick Order
//! Every [`Session::tick`] runs the same fixed sequence, so no step ever sees
//! a half-updated note set:
//! 1. **Input** - buffered press/release events are applied to the pressed-key set
//! 2. **Clock** - elapsed time is read from the playback clock
//! 3. **Field** - notes advance; overrun notes become misses
//! 4. **Judge** - pressed keys are correlated with active notes
//! 5. **Score** - every classification is recorded
//! 6. **Finish** - once all notes are terminal the result is frozen
//!
//! ## Input
//! `press` and `release` may be called at any time between ticks; the events
//! wait in a buffer until the next running tick. Pausing keeps the buffer.
//!
//! ## Example
//! ```rust
//! use keyfall_engine::{parse_chart, EngineConfig, Judgment, Session};
//!
//! let chart = parse_chart("C4:0:400")?;
//! let mut session = Session::new(chart, &EngineConfig::default())?;
//! session.start(0.0);
//!
//! // at the default 300 units/s the note reaches the hit zone (520) after ~1733 ms
//! session.press("C4".parse().unwrap(), 1730.0);
//! let report = session.tick(1733.0);
//!
//! assert_eq!(report.judgments[0].judgment, Judgment::Perfect);
//! assert_eq!(report.result.unwrap().perfect, 1);
//! # Ok::<(), keyfall_engine::EngineError>(())
//! ```

use crate::chart::ScheduledNote;
use crate::clock::PlaybackClock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::field::{FieldEvent, NoteField, NoteView};
use crate::judgment::{HitJudge, JudgedNote, Judgment};
use crate::pitch::Pitch;
use crate::score::{GameState, ScoreAggregator, SessionResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Press,
    Release,
}

/// A key going down or up, as reported by whatever input device is in use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub kind: InputKind,
    pub pitch: Pitch,
    pub timestamp_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Ready,
    Playing,
    Paused,
    Finished,
    Stopped,
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub elapsed_ms: f64,
    /// Misses first, then hits, each in chart order
    pub judgments: Vec<JudgedNote>,
    /// Set on the tick that finished the session
    pub result: Option<SessionResult>,
}

impl TickReport {
    fn idle(elapsed_ms: f64) -> Self {
        Self {
            elapsed_ms,
            judgments: Vec::new(),
            result: None,
        }
    }
}

pub struct Session {
    clock: PlaybackClock,
    field: NoteField,
    judge: HitJudge,
    score: ScoreAggregator,
    input: VecDeque<InputEvent>,
    pressed: BTreeSet<Pitch>,
    status: SessionStatus,
}

impl Session {
    /// Build a session for `chart`.
    ///
    /// # Errors
    /// [`EngineError::ConfigError`] when the judgment configuration is invalid.
    pub fn new(chart: Vec<ScheduledNote>, config: &EngineConfig) -> Result<Self, EngineError> {
        config.judgment.validate()?;
        Ok(Self {
            clock: PlaybackClock::new(),
            field: NoteField::new(chart, config.judgment),
            judge: HitJudge::new(&config.judgment),
            score: ScoreAggregator::new(),
            input: VecDeque::new(),
            pressed: BTreeSet::new(),
            status: SessionStatus::Ready,
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Start playing at `now`. From `Paused` this resumes.
    pub fn start(&mut self, now: f64) {
        match self.status {
            SessionStatus::Ready => {
                self.clock.start(now);
                self.status = SessionStatus::Playing;
                info!("Session started with {} notes", self.field.len());
            }
            SessionStatus::Paused => self.resume(now),
            _ => {}
        }
    }

    pub fn pause(&mut self, now: f64) {
        if self.status == SessionStatus::Playing {
            self.clock.pause(now);
            self.status = SessionStatus::Paused;
        }
    }

    pub fn resume(&mut self, now: f64) {
        if self.status == SessionStatus::Paused {
            self.clock.resume(now);
            self.status = SessionStatus::Playing;
        }
    }

    /// End the session early. No further transitions happen and no result is produced.
    pub fn stop(&mut self) {
        if matches!(self.status, SessionStatus::Finished | SessionStatus::Stopped) {
            return;
        }
        self.status = SessionStatus::Stopped;
        self.input.clear();
        self.pressed.clear();
        info!("Session stopped with {} notes unresolved", self.field.remaining());
    }

    /// Start over on the same chart: all notes pending, fresh score.
    pub fn restart(&mut self) {
        self.clock.reset();
        self.field.reset();
        self.score = ScoreAggregator::new();
        self.input.clear();
        self.pressed.clear();
        self.status = SessionStatus::Ready;
    }

    pub fn press(&mut self, pitch: Pitch, now: f64) {
        self.push_input(InputKind::Press, pitch, now);
    }

    pub fn release(&mut self, pitch: Pitch, now: f64) {
        self.push_input(InputKind::Release, pitch, now);
    }

    pub fn push_event(&mut self, event: InputEvent) {
        if matches!(self.status, SessionStatus::Finished | SessionStatus::Stopped) {
            return;
        }
        self.input.push_back(event);
    }

    fn push_input(&mut self, kind: InputKind, pitch: Pitch, timestamp_ms: f64) {
        self.push_event(InputEvent {
            kind,
            pitch,
            timestamp_ms,
        });
    }

    fn apply_input(&mut self) {
        for event in self.input.drain(..) {
            match event.kind {
                InputKind::Press => {
                    self.pressed.insert(event.pitch);
                }
                InputKind::Release => {
                    self.pressed.remove(&event.pitch);
                }
            }
        }
    }

    /// Advance the session to `now`.
    pub fn tick(&mut self, now: f64) -> TickReport {
        if self.status != SessionStatus::Playing {
            return TickReport::idle(self.clock.elapsed(now));
        }

        self.apply_input();
        let elapsed = self.clock.elapsed(now);

        let mut judgments = Vec::new();
        for event in self.field.advance(elapsed) {
            if let FieldEvent::Missed { index, progress, .. } = event {
                if let Some(live) = self.field.get(index) {
                    judgments.push(JudgedNote {
                        index,
                        id: live.note().label(),
                        pitch: live.pitch(),
                        judgment: Judgment::Miss,
                        distance: None,
                        progress,
                    });
                }
            }
        }

        for request in self.judge.judge(&self.field, &self.pressed) {
            if let Some(judged) = self.field.request_hit(&request) {
                judgments.push(judged);
            }
        }

        for judged in &judgments {
            let points = self.score.record(judged.judgment);
            debug!(
                "{} {} {:?} (+{:.1}, combo {})",
                judged.id,
                judged.pitch,
                judged.judgment,
                points,
                self.score.state().combo
            );
        }

        let result = if self.field.is_complete() {
            let result = self.score.finalize();
            self.status = SessionStatus::Finished;
            info!(
                "Session finished: score {}, accuracy {}",
                result.display_score(),
                result.display_accuracy()
            );
            Some(result)
        } else {
            None
        };

        TickReport {
            elapsed_ms: elapsed,
            judgments,
            result,
        }
    }

    /// Active notes and their lanes, for drawing
    pub fn render(&self) -> Vec<NoteView> {
        self.field.render()
    }

    pub fn state(&self) -> &GameState {
        self.score.state()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.score.result()
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        self.clock.elapsed(now)
    }

    pub fn field(&self) -> &NoteField {
        &self.field
    }

    /// Keys held as of the last tick
    pub fn pressed(&self) -> &BTreeSet<Pitch> {
        &self.pressed
    }

    /// Input waiting for the next running tick
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}
