//! Sample-playing voice
//!
//! A voice renders one note of one sample through its own envelope. It holds
//! only a weak reference to the sample; the sampler's registry owns it.

use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use super::envelope::clamp_level;
use super::{Envelope, EnvelopeSettings, SampleAsset};
use crate::mapping::Note;

/// What a voice did during one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceState {
    /// Not bound to a playing note
    Idle,
    /// Still sounding at the given output gain
    Playing(f64),
    /// Stopped during this tick; the owner should reclaim it
    Finished,
}

/// A pooled sample player
#[derive(Debug)]
pub struct Voice {
    slot: usize,
    sample: Option<Weak<SampleAsset>>,
    sample_name: Option<String>,
    envelope: Envelope,
    note: Option<Note>,
    pitch_ratio: f64,
    volume: f64,
    pitch: f64,
    global_volume: f64,
    global_pitch: f64,
    velocity_gain: f64,
    position: f64,
    gain: f64,
    exhausted: bool,
    playing: bool,
}

impl Voice {
    /// Create an idle voice for a pool slot
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            sample: None,
            sample_name: None,
            envelope: Envelope::default(),
            note: None,
            pitch_ratio: 1.0,
            volume: 1.0,
            pitch: 1.0,
            global_volume: 1.0,
            global_pitch: 1.0,
            velocity_gain: 1.0,
            position: 0.0,
            gain: 0.0,
            exhausted: false,
            playing: false,
        }
    }

    /// Bind a sample and take its default volume and pitch
    pub fn initialize(&mut self, sample: &Arc<SampleAsset>, envelope: EnvelopeSettings) {
        let metadata = sample.metadata();
        self.sample = Some(Arc::downgrade(sample));
        self.sample_name = Some(metadata.name.clone());
        self.volume = metadata.volume;
        self.pitch = metadata.pitch;
        self.envelope = Envelope::new(envelope);
        self.position = 0.0;
        self.exhausted = false;
    }

    /// Apply the sampler-wide volume and pitch
    pub fn set_global(&mut self, volume: f64, pitch: f64) {
        self.global_volume = volume;
        self.global_pitch = pitch;
    }

    /// Start a note. Returns false without side effects if no sample is bound.
    pub fn play(&mut self, note: Note, velocity: f64) -> bool {
        let Some(sample) = self.sample.as_ref().and_then(Weak::upgrade) else {
            warn!(slot = self.slot, note = %note, "Voice has no sample bound");
            return false;
        };

        let velocity = clamp_level(velocity);
        self.note = Some(note);
        self.pitch_ratio = note.pitch_ratio();
        self.velocity_gain = sample.metadata().velocity_gain(velocity);
        self.position = 0.0;
        self.gain = 0.0;
        self.exhausted = false;
        self.envelope.start(velocity);
        self.playing = true;

        debug!(
            slot = self.slot,
            sample = sample.name(),
            note = %note,
            velocity,
            pitch_ratio = self.pitch_ratio,
            "Voice started"
        );
        true
    }

    /// Advance the envelope by `delta` seconds and refresh the output gain
    pub fn tick(&mut self, delta: f64) -> VoiceState {
        if !self.playing {
            return VoiceState::Idle;
        }

        let level = self.envelope.update(delta);
        let sample_alive = self.sample.as_ref().is_some_and(|s| s.strong_count() > 0);

        if self.envelope.is_finished() || self.exhausted || !sample_alive {
            self.gain = 0.0;
            self.playing = false;
            return VoiceState::Finished;
        }

        self.gain = level * self.velocity_gain * self.volume * self.global_volume;
        VoiceState::Playing(self.gain)
    }

    /// Render one output frame at `output_rate` and advance the read position
    pub fn next_frame(&mut self, output_rate: u32) -> f32 {
        if !self.playing || self.exhausted {
            return 0.0;
        }
        let Some(sample) = self.sample.as_ref().and_then(Weak::upgrade) else {
            return 0.0;
        };

        let value = sample.frame_at(self.position) * self.gain as f32;
        self.position += self.playback_rate(&sample, output_rate);

        let len = sample.len() as f64;
        if self.position >= len {
            if sample.metadata().looping && len > 0.0 {
                self.position %= len;
            } else {
                self.exhausted = true;
            }
        }

        value
    }

    /// Frames of the sample consumed per output frame
    fn playback_rate(&self, sample: &SampleAsset, output_rate: u32) -> f64 {
        let base = sample.metadata().base_note.pitch_ratio();
        let conversion = sample.sample_rate() as f64 / output_rate.max(1) as f64;
        self.pitch_ratio / base * self.pitch * self.global_pitch * conversion
    }

    /// Release gracefully; the voice finishes when the release stage ends
    pub fn stop(&mut self) {
        if self.playing {
            self.envelope.release();
        }
    }

    /// Clear every binding so the voice can go back to the pool
    pub fn reset(&mut self) {
        self.sample = None;
        self.sample_name = None;
        self.note = None;
        self.envelope.reset();
        self.pitch_ratio = 1.0;
        self.volume = 1.0;
        self.pitch = 1.0;
        self.velocity_gain = 1.0;
        self.position = 0.0;
        self.gain = 0.0;
        self.exhausted = false;
        self.playing = false;
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn note(&self) -> Option<Note> {
        self.note
    }

    pub fn sample_name(&self) -> Option<&str> {
        self.sample_name.as_deref()
    }

    /// Ratio of the note to A4
    pub fn pitch_ratio(&self) -> f64 {
        self.pitch_ratio
    }

    /// Output gain from the last tick
    pub fn amplitude(&self) -> f64 {
        self.gain
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Current read position in sample frames
    pub fn position(&self) -> f64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{EnvelopeStage, SampleMetadata};

    fn asset(looping: bool) -> Arc<SampleAsset> {
        let meta = SampleMetadata::new("tone")
            .with_base_note("A4".parse().unwrap())
            .with_looping(looping);
        Arc::new(SampleAsset::new(meta, vec![0.5; 100], 100))
    }

    fn settings() -> EnvelopeSettings {
        EnvelopeSettings::new(0.0, 0.0, 1.0, 0.1)
    }

    #[test]
    fn test_play_without_sample_fails() {
        let mut voice = Voice::new(0);
        assert!(!voice.play("A4".parse().unwrap(), 1.0));
        assert!(!voice.is_playing());
        assert_eq!(voice.tick(0.01), VoiceState::Idle);
    }

    #[test]
    fn test_play_sets_pitch_ratio() {
        let sample = asset(false);
        let mut voice = Voice::new(3);
        voice.initialize(&sample, settings());

        assert!(voice.play("A5".parse().unwrap(), 1.0));
        assert!(voice.is_playing());
        assert!((voice.pitch_ratio() - 2.0).abs() < 1e-9);
        assert_eq!(voice.sample_name(), Some("tone"));
        assert_eq!(voice.slot(), 3);
    }

    #[test]
    fn test_tick_applies_velocity_and_volume() {
        let sample = asset(true);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.set_global(0.5, 1.0);
        voice.play("A4".parse().unwrap(), 0.5);

        match voice.tick(0.001) {
            VoiceState::Playing(gain) => assert!((gain - 0.25).abs() < 1e-9),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_stop_releases_then_finishes() {
        let sample = asset(true);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.play("A4".parse().unwrap(), 1.0);
        voice.tick(0.01);

        voice.stop();
        assert_eq!(voice.envelope().stage(), EnvelopeStage::Release);
        assert!(matches!(voice.tick(0.05), VoiceState::Playing(_)));
        assert_eq!(voice.tick(0.05), VoiceState::Finished);
        assert!(!voice.is_playing());
    }

    #[test]
    fn test_one_shot_finishes_at_end_of_buffer() {
        let sample = asset(false);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.play("A4".parse().unwrap(), 1.0);

        let mut finished = false;
        for _ in 0..200 {
            if voice.tick(0.01) == VoiceState::Finished {
                finished = true;
                break;
            }
            voice.next_frame(100);
        }
        assert!(finished);
    }

    #[test]
    fn test_looping_sample_keeps_playing() {
        let sample = asset(true);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.play("A5".parse().unwrap(), 1.0);

        for _ in 0..500 {
            assert!(matches!(voice.tick(0.01), VoiceState::Playing(_)));
            voice.next_frame(100);
        }
        assert!(voice.position() < 100.0);
    }

    #[test]
    fn test_playback_rate_follows_note() {
        let sample = asset(true);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.play("A5".parse().unwrap(), 1.0);
        voice.tick(0.0);
        voice.next_frame(100);
        assert!((voice.position() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_dropped_sample_finishes_voice() {
        let sample = asset(true);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.play("A4".parse().unwrap(), 1.0);
        drop(sample);

        assert_eq!(voice.tick(0.01), VoiceState::Finished);
        assert_eq!(voice.next_frame(100), 0.0);
    }

    #[test]
    fn test_reset_clears_binding() {
        let sample = asset(true);
        let mut voice = Voice::new(0);
        voice.initialize(&sample, settings());
        voice.play("C4".parse().unwrap(), 1.0);
        voice.reset();

        assert!(!voice.is_playing());
        assert_eq!(voice.note(), None);
        assert_eq!(voice.sample_name(), None);
        assert!(!voice.play("C4".parse().unwrap(), 1.0));
    }
}
