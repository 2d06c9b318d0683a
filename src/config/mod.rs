//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<SamplerConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {:?}", path))?;
    let config: SamplerConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config: {:?}", path))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
audio:
  sample_rate: 48000

master:
  volume: 0.7
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.master.volume, 0.7);
        assert!(config.samples.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let yaml = r#"
envelope:
  attack: 0.01
  decay: 0.2
  sustain: 0.5
  release: 0.4

pool:
  capacity: 8
  retrigger: ignore

scale:
  name: minor
  root: A3

samples:
  - name: bell
    file: bell.wav
    base_note: C5

sequence:
  - beat: 0
    sample: bell
    note: A3
  - beat: 1.5
    sample: bell
    note: C4
    velocity: 0.6
    length: 0.5
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.pool.capacity, 8);
        assert_eq!(config.pool.retrigger, crate::engine::RetriggerBehavior::Ignore);
        assert_eq!(config.samples[0].metadata.base_note.to_string(), "C5");
        assert_eq!(config.sequence.len(), 2);
        assert_eq!(config.sequence[0].velocity, 1.0);
        assert_eq!(config.sequence[1].length, 0.5);
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"master:\n  bpm: 999\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
