//! Quantize notes onto musical scales

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Note;
use crate::error::SamplerError;

/// The built-in scale catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    #[default]
    Major,
    Minor,
    Pentatonic,
}

impl ScaleKind {
    /// Every catalog entry, in catalog order
    pub const ALL: [ScaleKind; 3] = [ScaleKind::Major, ScaleKind::Minor, ScaleKind::Pentatonic];

    /// Build the scale for this kind
    pub fn scale(self) -> Scale {
        match self {
            ScaleKind::Major => Scale::major(),
            ScaleKind::Minor => Scale::minor(),
            ScaleKind::Pentatonic => Scale::pentatonic(),
        }
    }
}

/// Musical scale definition (intervals in semitones from root)
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    name: String,
    intervals: Vec<u8>,
}

impl Scale {
    /// Create a new scale
    pub fn new(name: &str, intervals: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            intervals,
        }
    }

    /// Major scale
    pub fn major() -> Self {
        Self::new("Major", vec![0, 2, 4, 5, 7, 9, 11])
    }

    /// Natural minor scale
    pub fn minor() -> Self {
        Self::new("Minor", vec![0, 2, 3, 5, 7, 8, 10])
    }

    /// Major pentatonic scale (root, M2, M3, P5, M6)
    pub fn pentatonic() -> Self {
        Self::new("Pentatonic", vec![0, 2, 4, 7, 9])
    }

    /// Get scale by name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "major" => Some(Self::major()),
            "minor" | "natural_minor" => Some(Self::minor()),
            "pentatonic" | "major_pentatonic" => Some(Self::pentatonic()),
            _ => None,
        }
    }

    /// Get the name of this scale
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the intervals
    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }
}

impl std::str::FromStr for Scale {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| SamplerError::UnknownScale(s.to_string()))
    }
}

/// Snaps notes to the nearest member of a scale built on a root
#[derive(Debug, Clone)]
pub struct ScaleMapper {
    root: Note,
    scale: Scale,
    prefer_higher: bool,
}

impl ScaleMapper {
    /// Create a new scale mapper
    ///
    /// # Arguments
    /// * `root` - Root note of the scale (e.g. C4)
    /// * `scale` - The scale to quantize to
    /// * `prefer_higher` - Search upwards from the input when true, downwards otherwise
    pub fn new(root: Note, scale: Scale, prefer_higher: bool) -> Self {
        Self {
            root,
            scale,
            prefer_higher,
        }
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn prefer_higher(&self) -> bool {
        self.prefer_higher
    }

    pub fn set_root(&mut self, root: Note) {
        self.root = root;
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    pub fn set_prefer_higher(&mut self, prefer_higher: bool) {
        self.prefer_higher = prefer_higher;
    }

    /// The in-scale notes of one octave, starting at the root
    pub fn scale_notes(&self) -> Vec<Note> {
        self.scale
            .intervals()
            .iter()
            .map(|&interval| self.root.transpose(interval as i32))
            .collect()
    }

    /// Whether a note belongs to the scale in any octave
    pub fn contains(&self, note: Note) -> bool {
        let offset = (note.pitch_class() as i32 - self.root.pitch_class() as i32).rem_euclid(12);
        self.scale.intervals().iter().any(|&i| i as i32 % 12 == offset)
    }

    /// Map a note to the nearest in-scale note.
    ///
    /// Distance is measured modulo 12 in the preferred direction only.
    /// Ties go to the interval listed first in the scale.
    pub fn nearest(&self, note: Note) -> Note {
        let input = note.pitch_class() as i32;
        let root = self.root.pitch_class() as i32;

        let mut best: Option<i32> = None;
        for &interval in self.scale.intervals() {
            let candidate = (root + interval as i32).rem_euclid(12);
            let distance = if self.prefer_higher {
                (candidate - input).rem_euclid(12)
            } else {
                (input - candidate).rem_euclid(12)
            };
            if best.map_or(true, |b| distance < b) {
                best = Some(distance);
            }
        }

        match best {
            Some(distance) if self.prefer_higher => note.transpose(distance),
            Some(distance) => note.transpose(-distance),
            None => note,
        }
    }

    /// Quantize a note name, returning the input unchanged when it cannot be parsed
    pub fn quantize_name(&self, name: &str) -> String {
        match name.parse::<Note>() {
            Ok(note) => self.nearest(note).to_string(),
            Err(e) => {
                warn!(note = name, error = %e, "Leaving unparseable note unmapped");
                name.to_string()
            }
        }
    }
}

impl Default for ScaleMapper {
    fn default() -> Self {
        Self::new(Note::default(), Scale::major(), true)
    }
}
