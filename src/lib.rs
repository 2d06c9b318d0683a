//! SamplerQuest - Pooled sample playback with ADSR envelopes
//!
//! A fixed pool of voices plays registered samples at arbitrary notes.
//! Notes can be snapped to a scale and scheduled on a beat grid, and
//! the mixed output can be rendered offline to WAV.

pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod synth;

pub use config::SamplerConfig;
pub use engine::Sampler;
pub use error::SamplerError;
