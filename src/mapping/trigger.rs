//! Position to note-index mapping for spatial triggers

use super::mapper::inverse_lerp;
use super::{Mapper, Note};

/// Maps a position along one axis onto a range of note indices.
///
/// Positions outside `[min_position, max_position]`, or any position while
/// mapping is disabled, resolve to the fixed index.
#[derive(Debug, Clone)]
pub struct TriggerMapper {
    min_position: f64,
    max_position: f64,
    min_index: i32,
    max_index: i32,
    invert: bool,
    enabled: bool,
    fixed_index: i32,
}

impl TriggerMapper {
    pub fn new(min_position: f64, max_position: f64, min_index: i32, max_index: i32) -> Self {
        Self {
            min_position: min_position.min(max_position),
            max_position: min_position.max(max_position),
            min_index: min_index.min(max_index),
            max_index: min_index.max(max_index),
            invert: false,
            enabled: true,
            fixed_index: 0,
        }
    }

    /// Map high positions to low notes
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Index used for out-of-range positions
    pub fn with_fixed_index(mut self, index: i32) -> Self {
        self.fixed_index = index;
        self
    }

    /// Disable position mapping so every position yields the fixed index
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Note index for a position
    pub fn index_for(&self, position: f64) -> i32 {
        if !self.enabled || position < self.min_position || position > self.max_position {
            return self.fixed_index;
        }

        let mut t = inverse_lerp(self.min_position, self.max_position, position);
        if self.invert {
            t = 1.0 - t;
        }

        let range = (self.max_index - self.min_index) as f64;
        self.min_index + (t * range).round() as i32
    }

    /// Note for a position, counting indices from C4
    pub fn note_for(&self, position: f64) -> Note {
        Note::from_index(self.index_for(position))
    }
}

impl Default for TriggerMapper {
    fn default() -> Self {
        Self::new(-10.0, 10.0, 0, 24)
    }
}

impl Mapper for TriggerMapper {
    fn name(&self) -> &str {
        "trigger"
    }

    fn map(&self, input: f64) -> f64 {
        self.index_for(input) as f64
    }
}
