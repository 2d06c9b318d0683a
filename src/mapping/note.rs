//! Note names, frequencies and pitch ratios
//!
//! Twelve-tone equal temperament referenced to A4 = 440 Hz.

use std::fmt;
use std::str::FromStr;

use crate::error::SamplerError;

/// Reference frequency of A4 in Hz
pub const A4_HZ: f64 = 440.0;

/// Pitch class names, sharps only
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest octave a note can sit in
pub const MIN_OCTAVE: i32 = -10;

/// Highest octave a note can sit in
pub const MAX_OCTAVE: i32 = 20;

const A_INDEX: i32 = 9;
const REFERENCE_OCTAVE: i32 = 4;

/// A pitch class plus octave, e.g. `C#4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note {
    // Ordering relies on octave being compared first.
    octave: i32,
    pitch_class: u8,
}

impl Note {
    /// Create a note from a pitch class (0 = C .. 11 = B) and octave.
    ///
    /// Like every constructor below, the result saturates at
    /// [`MIN_OCTAVE`] and [`MAX_OCTAVE`].
    pub fn new(pitch_class: u8, octave: i32) -> Self {
        Self::from_absolute(octave.saturating_mul(12).saturating_add(pitch_class as i32))
    }

    /// Note `index` semitones above C4 (negative indices go below)
    pub fn from_index(index: i32) -> Self {
        Self::from_absolute(index.saturating_add(REFERENCE_OCTAVE * 12))
    }

    /// Note `semitones` away from A4
    pub fn from_semitones_from_a4(semitones: i32) -> Self {
        Self::from_absolute(semitones.saturating_add(REFERENCE_OCTAVE * 12 + A_INDEX))
    }

    /// Note for a MIDI note number (60 = C4)
    pub fn from_midi(number: u8) -> Self {
        Self::from_absolute(number as i32 - 12)
    }

    /// Nearest note to a frequency in Hz, `None` for non-positive input
    pub fn from_frequency(hz: f64) -> Option<Self> {
        if hz <= 0.0 || !hz.is_finite() {
            return None;
        }
        let semitones = (12.0 * (hz / A4_HZ).log2()).round() as i32;
        Some(Self::from_semitones_from_a4(semitones))
    }

    fn from_absolute(absolute: i32) -> Self {
        let absolute = absolute.clamp(MIN_OCTAVE * 12, MAX_OCTAVE * 12 + 11);
        Self {
            octave: absolute.div_euclid(12),
            pitch_class: absolute.rem_euclid(12) as u8,
        }
    }

    fn absolute(&self) -> i32 {
        self.octave * 12 + self.pitch_class as i32
    }

    /// Pitch class, 0 = C .. 11 = B
    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    /// Octave number (C4 is middle C)
    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Pitch class name without octave
    pub fn name(&self) -> &'static str {
        NOTE_NAMES[self.pitch_class as usize]
    }

    /// Signed semitone distance from A4
    pub fn semitones_from_a4(&self) -> i32 {
        self.pitch_class as i32 - A_INDEX + (self.octave - REFERENCE_OCTAVE) * 12
    }

    /// Index relative to C4, the inverse of [`Note::from_index`]
    pub fn index(&self) -> i32 {
        self.absolute() - REFERENCE_OCTAVE * 12
    }

    /// MIDI note number, if within 0..=127
    pub fn midi(&self) -> Option<u8> {
        u8::try_from(self.absolute() + 12).ok().filter(|n| *n <= 127)
    }

    /// Frequency in Hz: `440 * 2^((octave - 4) + (pc - 9) / 12)`
    pub fn frequency(&self) -> f64 {
        let exponent = (self.octave - REFERENCE_OCTAVE) as f64
            + (self.pitch_class as i32 - A_INDEX) as f64 / 12.0;
        A4_HZ * 2.0_f64.powf(exponent)
    }

    /// Playback ratio relative to A4: `2^(semitones / 12)`
    pub fn pitch_ratio(&self) -> f64 {
        2.0_f64.powf(self.semitones_from_a4() as f64 / 12.0)
    }

    /// Shift by a number of semitones
    pub fn transpose(&self, semitones: i32) -> Self {
        Self::from_absolute(self.absolute().saturating_add(semitones))
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::from_index(0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SamplerError::InvalidNote(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave_str.parse().map_err(|_| invalid())?;
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return Err(invalid());
        }
        Ok(Self::from_absolute(octave * 12 + base + accidental))
    }
}

impl serde::Serialize for Note {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Note {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
