//! Per-voice synthesis: envelopes, decoded samples and sample players.

mod envelope;
mod sample;
mod voice;

pub(crate) use envelope::{clamp_level, clamp_time};
pub use envelope::{Envelope, EnvelopeSettings, EnvelopeStage, MAX_STAGE_SECONDS};
pub use sample::{SampleAsset, SampleMetadata};
pub use voice::{Voice, VoiceState};
