//! Decoded sample assets
//!
//! A sample is a mono buffer of `f32` frames plus the playback metadata the
//! sampler needs. Assets are immutable once built and shared through `Arc`.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::mapping::{LinearMapper, Mapper, Note};

/// Playback metadata for a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    /// Unique name the sample is registered under
    pub name: String,

    /// Note the recording was made at (default: C4)
    #[serde(default)]
    pub base_note: Note,

    /// Wrap around at the end of the buffer instead of finishing
    #[serde(default)]
    pub looping: bool,

    /// Volume before velocity and global volume (default: 1.0)
    #[serde(default = "default_unity")]
    pub volume: f64,

    /// Pitch multiplier before note and global pitch (default: 1.0)
    #[serde(default = "default_unity")]
    pub pitch: f64,

    /// Gain at velocity 0.0 (default: 0.0)
    #[serde(default)]
    pub min_velocity: f64,

    /// Gain at velocity 1.0 (default: 1.0)
    #[serde(default = "default_unity")]
    pub max_velocity: f64,
}

fn default_unity() -> f64 { 1.0 }

impl SampleMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_note: Note::default(),
            looping: false,
            volume: 1.0,
            pitch: 1.0,
            min_velocity: 0.0,
            max_velocity: 1.0,
        }
    }

    pub fn with_base_note(mut self, note: Note) -> Self {
        self.base_note = note;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_velocity_range(mut self, min: f64, max: f64) -> Self {
        self.min_velocity = min;
        self.max_velocity = max;
        self
    }

    /// Gain for a 0..1 velocity, interpolated between the declared velocity bounds
    pub fn velocity_gain(&self, velocity: f64) -> f64 {
        LinearMapper::velocity_curve(self.min_velocity, self.max_velocity).map(velocity)
    }
}

/// An immutable decoded sample
#[derive(Debug, Clone)]
pub struct SampleAsset {
    metadata: SampleMetadata,
    frames: Vec<f32>,
    sample_rate: u32,
}

impl SampleAsset {
    pub fn new(metadata: SampleMetadata, frames: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            metadata,
            frames,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Decode a WAV file, mixing all channels down to mono
    pub fn from_wav(path: &Path, metadata: SampleMetadata) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let frames: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        debug!(
            sample = metadata.name.as_str(),
            path = %path.display(),
            frames = frames.len(),
            sample_rate = spec.sample_rate,
            channels,
            "Decoded sample"
        );

        Ok(Self::new(metadata, frames, spec.sample_rate))
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    pub fn frames(&self) -> &[f32] {
        &self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate as f64
    }

    /// Linearly interpolated value at a fractional frame position.
    ///
    /// Looping samples wrap the interpolation neighbour; positions past the
    /// end of a one-shot sample read as silence.
    pub fn frame_at(&self, position: f64) -> f32 {
        let len = self.frames.len();
        if len == 0 || position < 0.0 || position >= len as f64 {
            return 0.0;
        }

        let index = position.floor() as usize;
        let frac = (position - index as f64) as f32;
        let current = self.frames[index];
        let next = if index + 1 < len {
            self.frames[index + 1]
        } else if self.metadata.looping {
            self.frames[0]
        } else {
            0.0
        };

        current + (next - current) * frac
    }
}
