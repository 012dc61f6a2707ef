//! # Note Field
//!
//! The note state machine. The field owns every [`LiveNote`] in an arena
//! indexed by chart position and is the only code that changes a note's
//! status.
//!
//! ## Lifecycle
//! ```text
//! Pending --(elapsed >= onset)--> Active --(hit request)--> Hit
//!                                   |
//!                                   +--(overrun / max travel)--> Missed
//! ```
//!
//! - Hit and Missed are terminal; terminal notes drop out of [`NoteField::active`]
//! - Progress is `(elapsed - onset) / 1000 * fall_speed`, clamped to `[0, max_travel]`
//! - A note is Missed once progress passes `hit_zone + overrun_margin`, or once it
//!   passes `max_travel`, whichever comes first
//! - The session is over when every note is terminal
//!
//! The judge never touches notes directly: it hands the field a
//! [`HitRequest`] and the field decides whether the transition applies.

use crate::chart::ScheduledNote;
use crate::config::JudgmentConfig;
use crate::judgment::{HitRequest, JudgedNote, Judgment};
use crate::layout::lane_position;
use crate::pitch::Pitch;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Pending,
    Active,
    Hit,
    Missed,
}

impl NoteStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NoteStatus::Hit | NoteStatus::Missed)
    }
}

/// Why an active note was missed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissReason {
    /// Travelled past the hit zone by more than the overrun margin
    Overrun,
    /// Left the field
    OutOfTravel,
}

/// What changed during one [`NoteField::advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    Activated { index: usize },
    Missed { index: usize, reason: MissReason, progress: f64 },
}

/// A scheduled note plus its runtime state
#[derive(Debug, Clone, PartialEq)]
pub struct LiveNote {
    note: ScheduledNote,
    status: NoteStatus,
    progress: f64,
    judged: bool,
}

impl LiveNote {
    fn new(note: ScheduledNote) -> Self {
        Self {
            note,
            status: NoteStatus::Pending,
            progress: 0.0,
            judged: false,
        }
    }

    pub fn note(&self) -> &ScheduledNote {
        &self.note
    }

    pub fn pitch(&self) -> Pitch {
        self.note.pitch
    }

    pub fn status(&self) -> NoteStatus {
        self.status
    }

    /// Progress as of the last advance
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_active(&self) -> bool {
        self.status == NoteStatus::Active
    }

    /// Set once the note has been scored or missed
    pub fn is_judged(&self) -> bool {
        self.judged
    }
}

/// Render data for one active note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub index: usize,
    pub id: String,
    pub pitch: Pitch,
    pub progress: f64,
    pub lane_x: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NoteField {
    notes: Vec<LiveNote>,
    geometry: JudgmentConfig,
    remaining: usize,
}

impl NoteField {
    pub fn new(chart: Vec<ScheduledNote>, geometry: JudgmentConfig) -> Self {
        let notes: Vec<LiveNote> = chart.into_iter().map(LiveNote::new).collect();
        let remaining = notes.len();
        Self {
            notes,
            geometry,
            remaining,
        }
    }

    pub fn geometry(&self) -> &JudgmentConfig {
        &self.geometry
    }

    /// Unclamped travel of a note at `elapsed`; negative before onset
    fn raw_progress(&self, note: &ScheduledNote, elapsed: f64) -> f64 {
        (elapsed - note.onset_ms as f64) / 1000.0 * self.geometry.fall_speed
    }

    /// Advance every non-terminal note to `elapsed` milliseconds.
    ///
    /// Returns activations and misses in chart order.
    pub fn advance(&mut self, elapsed: f64) -> Vec<FieldEvent> {
        debug_assert!(elapsed >= 0.0, "advance with negative elapsed {}", elapsed);

        let mut events = Vec::new();
        let miss_line = self.geometry.hit_zone + self.geometry.overrun_margin;
        let max_travel = self.geometry.max_travel;

        for index in 0..self.notes.len() {
            let raw = self.raw_progress(&self.notes[index].note, elapsed);
            let live = &mut self.notes[index];

            if live.status == NoteStatus::Pending && elapsed >= live.note.onset_ms as f64 {
                live.status = NoteStatus::Active;
                events.push(FieldEvent::Activated { index });
            }
            if live.status != NoteStatus::Active {
                continue;
            }

            live.progress = raw.clamp(0.0, max_travel);

            let reason = if raw > miss_line {
                Some(MissReason::Overrun)
            } else if raw > max_travel {
                Some(MissReason::OutOfTravel)
            } else {
                None
            };

            if let Some(reason) = reason {
                live.status = NoteStatus::Missed;
                live.judged = true;
                self.remaining -= 1;
                debug!("{} missed ({:?}) at progress {:.1}", live.note.label(), reason, raw);
                events.push(FieldEvent::Missed {
                    index,
                    reason,
                    progress: live.progress,
                });
            }
        }

        events
    }

    /// Active notes with their arena index, in chart order
    pub fn active(&self) -> impl Iterator<Item = (usize, &LiveNote)> {
        self.notes
            .iter()
            .enumerate()
            .filter(|(_, live)| live.is_active())
    }

    /// Apply a Hit transition if the note is still active and unjudged.
    ///
    /// Returns `None` (and changes nothing) for a terminal or pending note,
    /// so a second request for the same note is harmless.
    pub fn request_hit(&mut self, request: &HitRequest) -> Option<JudgedNote> {
        let live = self.notes.get_mut(request.index)?;
        if live.status != NoteStatus::Active || live.judged {
            return None;
        }
        if request.judgment == Judgment::Miss {
            return None;
        }

        live.status = NoteStatus::Hit;
        live.judged = true;
        self.remaining -= 1;

        Some(JudgedNote {
            index: request.index,
            id: live.note.label(),
            pitch: live.note.pitch,
            judgment: request.judgment,
            distance: Some(request.distance),
            progress: live.progress,
        })
    }

    /// Every note is Hit or Missed
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Notes not yet terminal
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn notes(&self) -> &[LiveNote] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&LiveNote> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn render(&self) -> Vec<NoteView> {
        self.active()
            .map(|(index, live)| NoteView {
                index,
                id: live.note.label(),
                pitch: live.note.pitch,
                progress: live.progress,
                lane_x: lane_position(live.note.pitch),
                duration_ms: live.note.duration_ms,
            })
            .collect()
    }

    /// Back to all-Pending, for a retry of the same chart
    pub fn reset(&mut self) {
        for live in &mut self.notes {
            live.status = NoteStatus::Pending;
            live.progress = 0.0;
            live.judged = false;
        }
        self.remaining = self.notes.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::parse_chart;

    /// One position unit per millisecond, so progress equals time since onset
    fn unit_geometry() -> JudgmentConfig {
        JudgmentConfig {
            fall_speed: 1000.0,
            ..JudgmentConfig::default()
        }
    }

    fn field(chart: &str) -> NoteField {
        NoteField::new(parse_chart(chart).unwrap(), unit_geometry())
    }

    fn hit(index: usize) -> HitRequest {
        HitRequest {
            index,
            judgment: Judgment::Perfect,
            distance: 0.0,
        }
    }

    #[test]
    fn test_pending_until_onset() {
        let mut f = field("C4:1000:400");
        assert!(f.advance(999.0).is_empty());
        assert_eq!(f.notes()[0].status(), NoteStatus::Pending);

        assert_eq!(f.advance(1000.0), vec![FieldEvent::Activated { index: 0 }]);
        assert_eq!(f.notes()[0].status(), NoteStatus::Active);
        assert_eq!(f.notes()[0].progress(), 0.0);
    }

    #[test]
    fn test_progress_follows_fall_speed() {
        let mut f = NoteField::new(parse_chart("C4:0:400").unwrap(), JudgmentConfig::default());
        f.advance(500.0);
        assert_eq!(f.notes()[0].progress(), 150.0);
        f.advance(1000.0);
        assert_eq!(f.notes()[0].progress(), 300.0);
    }

    #[test]
    fn test_overrun_marks_missed() {
        let mut geometry = unit_geometry();
        geometry.max_travel = 1000.0;
        let mut f = NoteField::new(parse_chart("C4:0:400").unwrap(), geometry);

        f.advance(620.0);
        assert!(f.notes()[0].is_active());

        let events = f.advance(621.0);
        assert_eq!(
            events,
            vec![FieldEvent::Missed {
                index: 0,
                reason: MissReason::Overrun,
                progress: 621.0
            }]
        );
        assert_eq!(f.notes()[0].status(), NoteStatus::Missed);
        assert!(f.is_complete());
    }

    #[test]
    fn test_max_travel_marks_missed_before_overrun() {
        // Defaults: hit zone 520 + 100 overrun = 620, but travel ends at 600
        let mut f = field("C4:0:400");
        f.advance(600.0);
        assert!(f.notes()[0].is_active());
        let events = f.advance(601.0);
        assert!(matches!(
            events[0],
            FieldEvent::Missed { reason: MissReason::OutOfTravel, .. }
        ));
        assert_eq!(f.notes()[0].progress(), 600.0);
    }

    #[test]
    fn test_large_jump_activates_and_misses_in_one_advance() {
        let mut f = field("C4:0:400");
        let events = f.advance(5000.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], FieldEvent::Activated { index: 0 });
        assert!(matches!(events[1], FieldEvent::Missed { index: 0, .. }));
    }

    #[test]
    fn test_hit_is_terminal_and_idempotent() {
        let mut f = field("C4:0:400");
        f.advance(500.0);
        assert!(f.request_hit(&hit(0)).is_some());
        assert!(f.request_hit(&hit(0)).is_none());
        assert_eq!(f.notes()[0].status(), NoteStatus::Hit);
        assert!(f.notes()[0].is_judged());

        // A hit note never turns into a miss later on
        assert!(f.advance(10_000.0).is_empty());
        assert_eq!(f.notes()[0].status(), NoteStatus::Hit);
        assert_eq!(f.active().count(), 0);
    }

    #[test]
    fn test_missed_note_rejects_hit_request() {
        let mut f = field("C4:0:400");
        f.advance(700.0);
        assert!(f.request_hit(&hit(0)).is_none());
        assert_eq!(f.notes()[0].status(), NoteStatus::Missed);
    }

    #[test]
    fn test_pending_note_rejects_hit_request() {
        let mut f = field("C4:1000:400");
        f.advance(10.0);
        assert!(f.request_hit(&hit(0)).is_none());
        assert!(f.request_hit(&hit(7)).is_none());
    }

    #[test]
    fn test_complete_when_all_terminal() {
        let mut f = field("C4:0:400,D4:200:400");
        f.advance(300.0);
        f.request_hit(&hit(0));
        assert!(!f.is_complete());
        assert_eq!(f.remaining(), 1);
        f.advance(900.0);
        assert!(f.is_complete());
    }

    #[test]
    fn test_empty_field_is_complete() {
        let f = NoteField::new(Vec::new(), unit_geometry());
        assert!(f.is_complete());
        assert!(f.is_empty());
    }

    #[test]
    fn test_render_lists_active_notes_with_lanes() {
        let mut f = field("C4:0:400,E4:100:400,G4:5000:400");
        f.advance(250.0);
        let views = f.render();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, "note-0");
        assert_eq!(views[0].progress, 250.0);
        assert_eq!(views[1].lane_x, 96.0);
        assert_eq!(views[1].progress, 150.0);
    }

    #[test]
    fn test_reset_restores_pending() {
        let mut f = field("C4:0:400");
        f.advance(900.0);
        f.reset();
        assert_eq!(f.notes()[0].status(), NoteStatus::Pending);
        assert_eq!(f.remaining(), 1);
    }
}
