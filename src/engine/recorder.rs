//! WAV recorder for rendered sampler output

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use super::Sampler;

/// Writes mono 32-bit float WAV files
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    samples_written: u64,
    peak: f32,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            samples_written: 0,
            peak: 0.0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Largest absolute sample value written so far
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate as f64
    }

    /// Write a single sample
    pub fn write_sample(&mut self, sample: f32) -> Result<()> {
        self.writer
            .write_sample(sample)
            .context("failed to write sample")?;
        self.samples_written += 1;
        self.peak = self.peak.max(sample.abs());
        Ok(())
    }

    /// Write a buffer of samples
    pub fn write_buffer(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            self.write_sample(sample)?;
        }
        Ok(())
    }

    /// Render `frames` frames from a sampler straight into the file
    pub fn record(&mut self, sampler: &mut Sampler, frames: usize) -> Result<()> {
        for _ in 0..frames {
            let frame = sampler.process();
            self.write_sample(frame)?;
        }
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        info!(
            frames = self.samples_written,
            seconds = self.duration_secs(),
            peak = self.peak,
            "Finalizing recording"
        );
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
