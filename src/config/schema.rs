//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::engine::{NoteEvent, RetriggerBehavior, DEFAULT_BPM, DEFAULT_CAPACITY, MAX_BPM, MIN_BPM};
use crate::mapping::{Note, ScaleKind, ScaleMapper};
use crate::synth::{EnvelopeSettings, SampleAsset, SampleMetadata, MAX_STAGE_SECONDS};

/// Main configuration for the sampler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Master settings (volume, pitch, tempo)
    #[serde(default)]
    pub master: MasterConfig,

    /// ADSR timings for every voice
    #[serde(default)]
    pub envelope: EnvelopeSettings,

    /// Voice pool settings
    #[serde(default)]
    pub pool: PoolConfig,

    /// Scale used for note quantization
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Samples to load
    #[serde(default)]
    pub samples: Vec<SampleConfig>,

    /// Notes to play, on the beat grid
    #[serde(default)]
    pub sequence: Vec<NoteEvent>,
}

impl SamplerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if !(self.master.pitch > 0.0 && self.master.pitch.is_finite()) {
            bail!("Master pitch must be greater than 0");
        }
        if !(MIN_BPM..=MAX_BPM).contains(&self.master.bpm) {
            bail!("BPM must be between {} and {}", MIN_BPM, MAX_BPM);
        }
        if !(0.1..=5.0).contains(&self.master.transition_time) {
            bail!("Tempo transition time must be between 0.1 and 5 seconds");
        }

        let env = &self.envelope;
        for (stage, value) in [("attack", env.attack), ("decay", env.decay), ("release", env.release)] {
            if !(0.0..=MAX_STAGE_SECONDS).contains(&value) {
                bail!("Envelope {} must be between 0 and {} seconds", stage, MAX_STAGE_SECONDS);
            }
        }
        if !(0.0..=1.0).contains(&env.sustain) {
            bail!("Envelope sustain must be between 0.0 and 1.0");
        }

        if self.pool.capacity == 0 || self.pool.capacity > 256 {
            bail!("Pool capacity must be between 1 and 256");
        }
        if self.samples.len() > self.pool.capacity {
            bail!(
                "{} samples configured but the pool only has {} slots",
                self.samples.len(),
                self.pool.capacity
            );
        }

        let mut names = HashSet::new();
        for sample in &self.samples {
            let meta = &sample.metadata;
            if meta.name.is_empty() {
                bail!("Sample for {:?} has an empty name", sample.file);
            }
            if !names.insert(meta.name.as_str()) {
                bail!("Sample '{}' is defined more than once", meta.name);
            }
            if !(0.0..=1.0).contains(&meta.min_velocity) || !(0.0..=1.0).contains(&meta.max_velocity) {
                bail!("Sample '{}' velocity range must be within 0.0 and 1.0", meta.name);
            }
            if !(meta.pitch > 0.0 && meta.pitch.is_finite()) {
                bail!("Sample '{}' pitch must be greater than 0", meta.name);
            }
            if !(meta.volume >= 0.0 && meta.volume.is_finite()) {
                bail!("Sample '{}' volume must be 0.0 or greater", meta.name);
            }
        }

        for event in &self.sequence {
            if !names.contains(event.sample.as_str()) {
                bail!("Sequence event at beat {} references unknown sample '{}'", event.beat, event.sample);
            }
            if !(event.beat >= 0.0 && event.beat.is_finite())
                || !(event.length >= 0.0 && event.length.is_finite())
            {
                bail!("Sequence event at beat {} needs a finite, non-negative position and length", event.beat);
            }
            if !(0.0..=1.0).contains(&event.velocity) {
                bail!("Sequence event at beat {} velocity must be between 0.0 and 1.0", event.beat);
            }
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames rendered per block (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Master settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Global volume 0.0-1.0 (default: 1.0)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Global pitch multiplier (default: 1.0)
    #[serde(default = "default_pitch")]
    pub pitch: f64,

    /// Beats per minute (default: 120)
    #[serde(default = "default_bpm")]
    pub bpm: f64,

    /// Ramp between tempos instead of jumping (default: false)
    #[serde(default)]
    pub smooth_tempo: bool,

    /// Seconds a tempo ramp takes (default: 1.0)
    #[serde(default = "default_transition_time")]
    pub transition_time: f64,
}

fn default_volume() -> f64 { 1.0 }
fn default_pitch() -> f64 { 1.0 }
fn default_bpm() -> f64 { DEFAULT_BPM }
fn default_transition_time() -> f64 { 1.0 }

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            pitch: default_pitch(),
            bpm: default_bpm(),
            smooth_tempo: false,
            transition_time: default_transition_time(),
        }
    }
}

/// Voice pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of voices (default: 16)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Behavior when a sounding note is triggered again (default: restart)
    #[serde(default)]
    pub retrigger: RetriggerBehavior,
}

fn default_capacity() -> usize { DEFAULT_CAPACITY }

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            retrigger: RetriggerBehavior::default(),
        }
    }
}

/// Scale quantization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Scale type (default: major)
    #[serde(default)]
    pub name: ScaleKind,

    /// Root note (default: C4)
    #[serde(default)]
    pub root: Note,

    /// Snap upwards rather than downwards (default: true)
    #[serde(default = "default_prefer_higher")]
    pub prefer_higher: bool,

    /// Quantize sequence notes before playing them (default: false)
    #[serde(default)]
    pub quantize: bool,
}

fn default_prefer_higher() -> bool { true }

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            name: ScaleKind::default(),
            root: Note::default(),
            prefer_higher: default_prefer_higher(),
            quantize: false,
        }
    }
}

impl ScaleConfig {
    /// Build the mapper described by this section
    pub fn mapper(&self) -> ScaleMapper {
        ScaleMapper::new(self.root, self.name.scale(), self.prefer_higher)
    }
}

/// A sample file plus its playback metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    /// WAV file, relative paths resolve against the config file's directory
    pub file: PathBuf,

    #[serde(flatten)]
    pub metadata: SampleMetadata,
}

impl SampleConfig {
    /// Path to the WAV file relative to `base_dir`
    pub fn resolve_path(&self, base_dir: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            base_dir.join(&self.file)
        }
    }

    /// Decode the sample
    pub fn load(&self, base_dir: &Path) -> crate::error::Result<SampleAsset> {
        SampleAsset::from_wav(&self.resolve_path(base_dir), self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> SampleConfig {
        SampleConfig {
            file: PathBuf::from(format!("{}.wav", name)),
            metadata: SampleMetadata::new(name),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SamplerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool.capacity, 16);
        assert_eq!(config.master.bpm, 120.0);
    }

    #[test]
    fn test_default_audio_config() {
        let config: AudioConfig = serde_yaml::from_str("sample_rate: 48000").unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512);
    }

    #[test]
    fn test_envelope_section() {
        let config: SamplerConfig = serde_yaml::from_str("envelope:\n  attack: 0.5\n").unwrap();
        assert_eq!(config.envelope.attack, 0.5);
        assert_eq!(config.envelope.sustain, 0.7);
    }

    #[test]
    fn test_sample_config_flattens_metadata() {
        let yaml = r#"
file: sounds/pluck.wav
name: pluck
base_note: A3
looping: true
min_velocity: 0.2
"#;
        let config: SampleConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.metadata.name, "pluck");
        assert_eq!(config.metadata.base_note.to_string(), "A3");
        assert!(config.metadata.looping);
        assert_eq!(config.metadata.min_velocity, 0.2);
        assert_eq!(config.metadata.max_velocity, 1.0);
        assert_eq!(
            config.resolve_path(Path::new("/kits")),
            PathBuf::from("/kits/sounds/pluck.wav")
        );
    }

    #[test]
    fn test_scale_section() {
        let yaml = "name: pentatonic\nroot: D4\nprefer_higher: false\nquantize: true";
        let config: ScaleConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, ScaleKind::Pentatonic);
        let mapper = config.mapper();
        assert_eq!(mapper.root().to_string(), "D4");
        assert!(!mapper.prefer_higher());
    }

    #[test]
    fn test_invalid_note_rejected() {
        let result: std::result::Result<ScaleConfig, _> = serde_yaml::from_str("root: H9");
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_sample_names() {
        let mut config = SamplerConfig::default();
        config.samples = vec![sample("kick"), sample("kick")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_too_many_samples_for_pool() {
        let mut config = SamplerConfig::default();
        config.pool.capacity = 1;
        config.samples = vec![sample("kick"), sample("snare")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sequence_references_unknown_sample() {
        let mut config = SamplerConfig::default();
        config.samples = vec![sample("kick")];
        config.sequence = vec![NoteEvent::new(0.0, "snare", "C4".parse().unwrap())];
        assert!(config.validate().is_err());

        config.sequence = vec![NoteEvent::new(0.0, "kick", "C4".parse().unwrap())];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_finite_sequence_values() {
        let yaml = r#"
samples:
  - name: kick
    file: kick.wav
sequence:
  - beat: .nan
    sample: kick
    note: C4
"#;
        let config: SamplerConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.sequence[0].beat.is_nan());
        assert!(config.validate().is_err());

        let mut config = SamplerConfig::default();
        config.samples = vec![sample("kick")];
        config.sequence = vec![NoteEvent::new(0.0, "kick", "C4".parse().unwrap()).with_length(f64::INFINITY)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_volume_validated() {
        let mut config = SamplerConfig::default();
        config.samples = vec![sample("kick")];
        config.samples[0].metadata.volume = -0.5;
        assert!(config.validate().is_err());

        config.samples[0].metadata.volume = f64::NAN;
        assert!(config.validate().is_err());

        config.samples[0].metadata.volume = 0.8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_values() {
        let mut config = SamplerConfig::default();
        config.master.bpm = 10.0;
        assert!(config.validate().is_err());

        let mut config = SamplerConfig::default();
        config.envelope.release = 3.0;
        assert!(config.validate().is_err());

        let mut config = SamplerConfig::default();
        config.master.volume = 1.5;
        assert!(config.validate().is_err());
    }
}
