//! # Chart Loader
//!
//! Parses the textual note encoding into [`ScheduledNote`]s and generates
//! practice scales.
//!
//! ## Format
//! Comma-separated triples `Pitch[#]Octave:onsetMs:durationMs`:
//!
//! ```text
//! C4:0:400,C4:500:400,G4:1000:400
//! ```
//!
//! - Notes keep input order; out-of-order onsets are allowed
//! - Whitespace around triples and fields is ignored, so long charts can wrap
//! - One malformed triple rejects the whole chart
//!
//! ## Example
//! ```rust
//! use keyfall_engine::{parse_chart, to_chart_string};
//!
//! let notes = parse_chart("C4:0:400,G4:1000:400")?;
//! assert_eq!(notes.len(), 2);
//! assert_eq!(notes[1].onset_ms, 1000);
//! assert_eq!(to_chart_string(&notes), "C4:0:400,G4:1000:400");
//! # Ok::<(), keyfall_engine::EngineError>(())
//! ```

use crate::error::EngineError;
use crate::pitch::{Pitch, PitchClass};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Velocity assigned to notes parsed from chart text, which doesn't carry one.
pub const DEFAULT_VELOCITY: f32 = 0.8;

/// Spacing between generated scale notes
pub const SCALE_STEP_MS: u64 = 500;

/// Length of each generated scale note
pub const SCALE_NOTE_MS: u64 = 400;

const MAJOR_INTERVALS: [i32; 8] = [0, 2, 4, 5, 7, 9, 11, 12];
const MINOR_INTERVALS: [i32; 8] = [0, 2, 3, 5, 7, 8, 10, 12];

/// A note as written in the chart. Never mutated after loading.
///
/// # Fields
/// - `id`: Position in the chart (0, 1, 2, ...), also the arena index at runtime
/// - `pitch`: Pitch class and octave the player must press
/// - `onset_ms`: When the note enters play, from chart start
/// - `duration_ms`: Written length, always > 0
/// - `velocity`: 0.0-1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNote {
    pub id: usize,
    pub pitch: Pitch,
    pub onset_ms: u64,
    pub duration_ms: u64,
    pub velocity: f32,
}

impl ScheduledNote {
    /// Display identifier, `note-{id}`
    pub fn label(&self) -> String {
        format!("note-{}", self.id)
    }

    pub fn end_ms(&self) -> u64 {
        self.onset_ms + self.duration_ms
    }
}

/// Diatonic scale template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    #[default]
    Major,
    Minor,
}

impl ScaleKind {
    fn intervals(self) -> &'static [i32; 8] {
        match self {
            ScaleKind::Major => &MAJOR_INTERVALS,
            ScaleKind::Minor => &MINOR_INTERVALS,
        }
    }
}

impl FromStr for ScaleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(ScaleKind::Major),
            "minor" => Ok(ScaleKind::Minor),
            _ => Err(format!("Unknown scale kind: {}", s)),
        }
    }
}

/// Parse chart text into scheduled notes.
///
/// # Errors
/// [`EngineError::ParseError`] naming the first bad triple (1-based) when:
/// - a triple doesn't split into exactly three `:` fields
/// - onset or duration isn't an integer, onset is negative, or duration is zero
/// - the pitch token isn't a pitch class followed by an octave
pub fn parse_chart(text: &str) -> Result<Vec<ScheduledNote>, EngineError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    text.split(',')
        .enumerate()
        .map(|(index, triple)| parse_triple(index, triple.trim()))
        .collect()
}

fn parse_triple(index: usize, triple: &str) -> Result<ScheduledNote, EngineError> {
    let error = |message: String| EngineError::ParseError {
        note: index + 1,
        message,
    };

    let fields: Vec<&str> = triple.split(':').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(error(format!(
            "expected pitch:onset:duration, found {} field{} in '{}'",
            fields.len(),
            if fields.len() == 1 { "" } else { "s" },
            triple
        )));
    }

    let pitch: Pitch = fields[0].parse().map_err(error)?;

    let onset: i64 = fields[1]
        .parse()
        .map_err(|_| error(format!("onset '{}' is not an integer", fields[1])))?;
    let duration: i64 = fields[2]
        .parse()
        .map_err(|_| error(format!("duration '{}' is not an integer", fields[2])))?;

    if onset < 0 {
        return Err(error(format!("onset must not be negative, got {}", onset)));
    }
    if duration <= 0 {
        return Err(error(format!("duration must be positive, got {}", duration)));
    }

    Ok(ScheduledNote {
        id: index,
        pitch,
        onset_ms: onset as u64,
        duration_ms: duration as u64,
        velocity: DEFAULT_VELOCITY,
    })
}

/// Serialize notes back to chart text, field order preserved.
pub fn to_chart_string(notes: &[ScheduledNote]) -> String {
    notes
        .iter()
        .map(|n| format!("{}:{}:{}", n.pitch, n.onset_ms, n.duration_ms))
        .collect::<Vec<_>>()
        .join(",")
}

/// Generate an eight-note diatonic scale from a root, one note per step.
///
/// Note `i` starts at `i * 500` ms and lasts 400 ms; the top note is the root
/// an octave up.
///
/// # Example
/// ```
/// use keyfall_engine::{generate_scale, PitchClass, ScaleKind};
///
/// let scale = generate_scale(PitchClass::A, 3, ScaleKind::Minor);
/// let names: Vec<String> = scale.iter().map(|n| n.pitch.to_string()).collect();
/// assert_eq!(names, ["A3", "B3", "C4", "D4", "E4", "F4", "G4", "A4"]);
/// assert_eq!(scale[7].onset_ms, 3500);
/// ```
pub fn generate_scale(root: PitchClass, octave: i8, kind: ScaleKind) -> Vec<ScheduledNote> {
    // labelled `note-{i}` like parsed charts, not `scale-{i}`
    let root_index = root.semitone() as i32;

    kind.intervals()
        .iter()
        .enumerate()
        .map(|(index, interval)| {
            let absolute = root_index + interval;
            ScheduledNote {
                id: index,
                pitch: Pitch {
                    class: PitchClass::from_semitone(absolute),
                    octave: octave.saturating_add((absolute / 12) as i8),
                },
                onset_ms: index as u64 * SCALE_STEP_MS,
                duration_ms: SCALE_NOTE_MS,
                velocity: DEFAULT_VELOCITY,
            }
        })
        .collect()
}

/// [`generate_scale`] from a textual root like `"F#"`.
///
/// # Errors
/// [`EngineError::ParseError`] when the root isn't one of the twelve pitch classes.
pub fn generate_scale_from_str(
    root: &str,
    octave: i8,
    kind: ScaleKind,
) -> Result<Vec<ScheduledNote>, EngineError> {
    let root: PitchClass = root
        .trim()
        .parse()
        .map_err(|message| EngineError::ParseError { note: 1, message })?;
    Ok(generate_scale(root, octave, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_chart() {
        let notes = parse_chart("C4:0:400,E4:500:400,G4:1000:800").unwrap();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].pitch, Pitch::new(PitchClass::C, 4));
        assert_eq!(notes[2].pitch, Pitch::new(PitchClass::G, 4));
        assert_eq!(notes[2].onset_ms, 1000);
        assert_eq!(notes[2].duration_ms, 800);
        assert_eq!(notes[1].label(), "note-1");
        assert!(notes.iter().all(|n| n.velocity == DEFAULT_VELOCITY));
    }

    #[test]
    fn test_parse_keeps_input_order() {
        let notes = parse_chart("G4:1000:400,C4:0:400").unwrap();
        assert_eq!(notes[0].onset_ms, 1000);
        assert_eq!(notes[1].onset_ms, 0);
        assert_eq!(notes[1].id, 1);
    }

    #[test]
    fn test_parse_sharps_and_wrapped_lines() {
        let notes = parse_chart("C#4:0:400,\n  F#5 : 250 : 100 ,\nA#3:300:50").unwrap();
        assert_eq!(notes[0].pitch.class, PitchClass::CSharp);
        assert_eq!(notes[1].pitch, Pitch::new(PitchClass::FSharp, 5));
        assert_eq!(notes[1].onset_ms, 250);
        assert_eq!(notes[2].pitch.octave, 3);
    }

    #[test]
    fn test_empty_text_is_empty_chart() {
        assert_eq!(parse_chart("").unwrap(), Vec::new());
        assert_eq!(parse_chart("  \n ").unwrap(), Vec::new());
    }

    #[test]
    fn test_wrong_field_count_rejects_chart() {
        let err = parse_chart("C4:0:400,E4:500").unwrap_err();
        assert!(matches!(err, EngineError::ParseError { note: 2, .. }));

        let err = parse_chart("C4:0:400:1").unwrap_err();
        assert!(matches!(err, EngineError::ParseError { note: 1, .. }));
    }

    #[test]
    fn test_trailing_comma_is_an_error() {
        let err = parse_chart("C4:0:400,").unwrap_err();
        assert!(matches!(err, EngineError::ParseError { note: 2, .. }));
    }

    #[test]
    fn test_non_integer_fields() {
        assert!(matches!(
            parse_chart("C4:abc:400"),
            Err(EngineError::ParseError { note: 1, .. })
        ));
        assert!(matches!(
            parse_chart("C4:0:4.5"),
            Err(EngineError::ParseError { note: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_pitch() {
        let err = parse_chart("C4:0:400,X4:500:400").unwrap_err();
        match err {
            EngineError::ParseError { note, message } => {
                assert_eq!(note, 2);
                assert!(message.contains("X4"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_negative_onset_and_zero_duration() {
        assert!(parse_chart("C4:-5:400").is_err());
        assert!(parse_chart("C4:0:0").is_err());
        assert!(parse_chart("C4:0:-1").is_err());
    }

    #[test]
    fn test_round_trip_numeric_fields() {
        let source = "C4:0:400,D#4:500:250,B3:1200:800,C5:900:100";
        let notes = parse_chart(source).unwrap();
        let reparsed = parse_chart(&to_chart_string(&notes)).unwrap();
        assert_eq!(notes, reparsed);
        assert_eq!(to_chart_string(&notes), source);
    }

    #[test]
    fn test_major_scale_from_c() {
        let scale = generate_scale(PitchClass::C, 4, ScaleKind::Major);
        let names: Vec<String> = scale.iter().map(|n| n.pitch.to_string()).collect();
        assert_eq!(names, ["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]);
        assert_eq!(scale[3].onset_ms, 1500);
        assert!(scale.iter().all(|n| n.duration_ms == SCALE_NOTE_MS));
    }

    #[test]
    fn test_scale_carries_octave_from_sharp_root() {
        let scale = generate_scale(PitchClass::ASharp, 4, ScaleKind::Major);
        let names: Vec<String> = scale.iter().map(|n| n.pitch.to_string()).collect();
        assert_eq!(names, ["A#4", "C5", "D5", "D#5", "F5", "G5", "A5", "A#5"]);
    }

    #[test]
    fn test_scale_kind_from_str() {
        assert_eq!(" Minor ".parse::<ScaleKind>(), Ok(ScaleKind::Minor));
        assert_eq!("major".parse::<ScaleKind>(), Ok(ScaleKind::Major));
        assert_eq!(
            "dorian".parse::<ScaleKind>(),
            Err("Unknown scale kind: dorian".to_string())
        );
    }

    #[test]
    fn test_generated_scale_labels() {
        let scale = generate_scale(PitchClass::D, 4, ScaleKind::Major);
        assert_eq!(scale[0].label(), "note-0");
        assert_eq!(scale[7].label(), "note-7");
    }

    #[test]
    fn test_scale_from_str() {
        assert_eq!(generate_scale_from_str("G", 3, ScaleKind::Major).unwrap().len(), 8);
        assert!(matches!(
            generate_scale_from_str("Bb", 3, ScaleKind::Major),
            Err(EngineError::ParseError { .. })
        ));
    }

    #[test]
    fn test_scale_serializes_to_parsable_chart() {
        let scale = generate_scale(PitchClass::E, 4, ScaleKind::Minor);
        let text = to_chart_string(&scale);
        assert_eq!(parse_chart(&text).unwrap(), scale);
    }
}
