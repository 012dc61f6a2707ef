//! Keyboard layout
//!
//! Horizontal lane positions for falling notes and the key list of an
//! on-screen keyboard. White keys are 48 units wide starting at `C4 = 0`;
//! a sharp sits 32 units into the white key it is spelled from.

use crate::pitch::{Pitch, PitchClass};
use serde::Serialize;

pub const WHITE_KEY_WIDTH: f64 = 48.0;
pub const BLACK_KEY_OFFSET: f64 = 32.0;

/// Octave whose C sits at position 0
pub const ORIGIN_OCTAVE: i8 = 4;

const WHITE_KEYS: [PitchClass; 7] = [
    PitchClass::C,
    PitchClass::D,
    PitchClass::E,
    PitchClass::F,
    PitchClass::G,
    PitchClass::A,
    PitchClass::B,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardKey {
    pub pitch: Pitch,
    pub is_black: bool,
    pub position: f64,
}

fn white_index(class: PitchClass) -> usize {
    WHITE_KEYS
        .iter()
        .position(|&white| white == class.natural())
        .unwrap_or(0)
}

/// Left edge of the lane a pitch falls in.
pub fn lane_position(pitch: Pitch) -> f64 {
    let octave_offset = (pitch.octave as i32 - ORIGIN_OCTAVE as i32) as f64 * 7.0 * WHITE_KEY_WIDTH;
    let base = octave_offset + white_index(pitch.class) as f64 * WHITE_KEY_WIDTH;
    if pitch.class.is_sharp() {
        base + BLACK_KEY_OFFSET
    } else {
        base
    }
}

/// Keys of a keyboard spanning `octaves` octaves from `start_octave`,
/// white keys first within each octave.
pub fn keyboard_keys(start_octave: i8, octaves: u8) -> Vec<KeyboardKey> {
    let mut keys = Vec::with_capacity(octaves as usize * 12);
    for step in 0..octaves as i16 {
        let Ok(octave) = i8::try_from(start_octave as i16 + step) else {
            break;
        };
        let classes = PitchClass::ALL
            .iter()
            .filter(|c| !c.is_sharp())
            .chain(PitchClass::ALL.iter().filter(|c| c.is_sharp()));
        for &class in classes {
            let pitch = Pitch::new(class, octave);
            keys.push(KeyboardKey {
                pitch,
                is_black: class.is_sharp(),
                position: lane_position(pitch),
            });
        }
    }
    keys
}
