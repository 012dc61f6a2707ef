//! # Pitch Types
//!
//! Pitch classes and pitch+octave keys shared by charts, input, and layout.
//!
//! ## Naming
//! - Twelve pitch classes, sharps only: `C C# D D# E F F# G G# A A# B`
//! - A [`Pitch`] is a class plus a signed octave, written `C#4`, `A-1`
//! - Octaves change at C, so `B3` is directly below `C4`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the twelve semitone names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PitchClass {
    #[default]
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitone offset from C (0-11)
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Pitch class for a semitone offset; wraps modulo 12
    pub fn from_semitone(semitone: i32) -> Self {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }

    /// The natural a sharp is spelled from (`C#` -> `C`); naturals map to themselves
    pub fn natural(self) -> Self {
        if self.is_sharp() {
            Self::from_semitone(self.semitone() as i32 - 1)
        } else {
            self
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PitchClass::ALL
            .iter()
            .copied()
            .find(|pc| pc.name() == s)
            .ok_or_else(|| format!("unrecognized pitch class '{}'", s))
    }
}

/// A pitch class in a specific octave, the unit of input and judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    pub fn new(class: PitchClass, octave: i8) -> Self {
        Self { class, octave }
    }

    /// MIDI-style note number, with C4 = 60
    pub fn midi_number(self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.class.semitone() as i32
    }

    /// Move by a number of semitones, carrying into the octave
    pub fn transpose(self, semitones: i32) -> Option<Self> {
        let absolute = self.octave as i32 * 12 + self.class.semitone() as i32 + semitones;
        let octave = i8::try_from(absolute.div_euclid(12)).ok()?;
        Some(Self {
            class: PitchClass::from_semitone(absolute),
            octave,
        })
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = String;

    /// Parse a pitch token like `C4`, `F#5`, or `A-1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c == '-' || c.is_ascii_digit())
            .ok_or_else(|| format!("pitch '{}' is missing an octave", s))?;
        let (class_part, octave_part) = s.split_at(split);

        let class: PitchClass = class_part
            .parse()
            .map_err(|_| format!("unrecognized pitch '{}'", s))?;

        let digits = octave_part.strip_prefix('-').unwrap_or(octave_part);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid octave in pitch '{}'", s));
        }
        let octave: i8 = octave_part
            .parse()
            .map_err(|_| format!("octave out of range in pitch '{}'", s))?;

        Ok(Pitch { class, octave })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naturals_and_sharps() {
        assert_eq!("C4".parse::<Pitch>(), Ok(Pitch::new(PitchClass::C, 4)));
        assert_eq!("F#5".parse::<Pitch>(), Ok(Pitch::new(PitchClass::FSharp, 5)));
        assert_eq!("A-1".parse::<Pitch>(), Ok(Pitch::new(PitchClass::A, -1)));
        assert_eq!("G10".parse::<Pitch>(), Ok(Pitch::new(PitchClass::G, 10)));
    }

    #[test]
    fn test_reject_bad_tokens() {
        assert!("H4".parse::<Pitch>().is_err());
        assert!("Bb4".parse::<Pitch>().is_err()); // flats are not part of the chart alphabet
        assert!("E#4".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert!("C-".parse::<Pitch>().is_err());
        assert!("C4x".parse::<Pitch>().is_err());
        assert!("c4".parse::<Pitch>().is_err());
        assert!("C200".parse::<Pitch>().is_err());
    }

    #[test]
    fn test_display_matches_chart_spelling() {
        assert_eq!(Pitch::new(PitchClass::CSharp, 4).to_string(), "C#4");
        assert_eq!(Pitch::new(PitchClass::B, -2).to_string(), "B-2");
    }

    #[test]
    fn test_midi_numbers() {
        assert_eq!(Pitch::new(PitchClass::C, 4).midi_number(), 60);
        assert_eq!(Pitch::new(PitchClass::A, 4).midi_number(), 69);
        assert_eq!(Pitch::new(PitchClass::C, -1).midi_number(), 0);
    }

    #[test]
    fn test_transpose_carries_octave() {
        let b3 = Pitch::new(PitchClass::B, 3);
        assert_eq!(b3.transpose(1), Some(Pitch::new(PitchClass::C, 4)));
        assert_eq!(b3.transpose(-12), Some(Pitch::new(PitchClass::B, 2)));
        assert_eq!(Pitch::new(PitchClass::C, 4).transpose(-1), Some(Pitch::new(PitchClass::B, 3)));
    }

    #[test]
    fn test_natural_of_sharp() {
        assert_eq!(PitchClass::CSharp.natural(), PitchClass::C);
        assert_eq!(PitchClass::ASharp.natural(), PitchClass::A);
        assert_eq!(PitchClass::E.natural(), PitchClass::E);
    }
}
