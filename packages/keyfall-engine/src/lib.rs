//! Timing engine for a falling-note keyboard trainer.
//!
//! Charts are parsed into [`ScheduledNote`]s, a [`Session`] plays them against
//! live key input on a pausable clock, and a [`BeatScheduler`] (or the
//! threaded [`Metronome`]) keeps a drift-free beat.

pub mod beat;
pub mod chart;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod field;
pub mod judgment;
pub mod layout;
pub mod metronome;
pub mod pitch;
pub mod score;
pub mod session;

pub use beat::{BeatConfig, BeatEvent, BeatScheduler, BeatState, BeatsPerMeasure, TempoPreset};
pub use chart::{
    generate_scale, generate_scale_from_str, parse_chart, to_chart_string, ScaleKind,
    ScheduledNote,
};
pub use clock::{MonotonicTime, PlaybackClock};
pub use config::{EngineConfig, JudgmentConfig, MetronomeConfig};
pub use document::{ChartDocument, ChartMetadata};
pub use error::*;
pub use field::{NoteField, NoteStatus, NoteView};
pub use judgment::{HitJudge, JudgedNote, Judgment};
pub use layout::{keyboard_keys, lane_position, KeyboardKey};
pub use metronome::Metronome;
pub use pitch::{Pitch, PitchClass};
pub use score::{GameState, ScoreAggregator, SessionResult};
pub use session::{InputEvent, InputKind, Session, SessionStatus, TickReport};

/// Parse a chart document and build a ready-to-start session for it.
pub fn load_session(
    source: &str,
    config: &EngineConfig,
) -> Result<(ChartMetadata, Session), EngineError> {
    let document = ChartDocument::parse(source)?;
    let session = Session::new(document.notes, config)?;
    Ok((document.metadata, session))
}
