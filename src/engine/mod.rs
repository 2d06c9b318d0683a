//! Voice pool and sampler controller
//!
//! The [`Sampler`] owns a fixed set of voices. Every voice is either idle
//! (queued for allocation) or active (mapped from the note it is playing);
//! never both. Voices move back to the idle queue when their envelope
//! finishes, their one-shot sample runs out, or their sample is unloaded.

mod recorder;
mod sequencer;
mod tempo;

pub use recorder::Recorder;
pub use sequencer::{NoteEvent, Sequencer};
pub use tempo::{Tempo, DEFAULT_BPM, MAX_BPM, MIN_BPM};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SamplerConfig;
use crate::error::{Result, SamplerError};
use crate::mapping::Note;
use crate::synth::{clamp_level, clamp_time, EnvelopeSettings, SampleAsset, Voice, VoiceState};

/// Default number of voices in the pool
pub const DEFAULT_CAPACITY: usize = 16;

/// What to do when a note is triggered while a voice already plays it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerBehavior {
    /// Reclaim the sounding voice immediately, then start a fresh one
    #[default]
    Restart,
    /// Keep the sounding voice and reject the new trigger
    Ignore,
}

/// Emitted each time a voice is returned to the pool
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceEvent {
    pub slot: usize,
    pub note: Option<Note>,
    pub sample: Option<String>,
}

type VoiceListener = Box<dyn FnMut(&VoiceEvent) + Send>;

/// Fixed-capacity sampler with one active voice per note
pub struct Sampler {
    voices: Vec<Voice>,
    idle: VecDeque<usize>,
    active: HashMap<Note, usize>,
    samples: HashMap<String, Arc<SampleAsset>>,
    envelope: EnvelopeSettings,
    retrigger: RetriggerBehavior,
    sample_rate: u32,
    global_volume: f64,
    global_pitch: f64,
    listener: Option<VoiceListener>,
    finished: Vec<usize>,
}

impl Sampler {
    /// Create a sampler with `capacity` voices rendering at `sample_rate`
    pub fn new(capacity: usize, sample_rate: u32) -> Self {
        let capacity = capacity.max(1);
        let voices: Vec<Voice> = (0..capacity).map(Voice::new).collect();

        info!(capacity, sample_rate, "Initialized voice pool");

        Self {
            voices,
            idle: (0..capacity).collect(),
            active: HashMap::with_capacity(capacity),
            samples: HashMap::new(),
            envelope: EnvelopeSettings::default(),
            retrigger: RetriggerBehavior::default(),
            sample_rate: sample_rate.max(1),
            global_volume: 1.0,
            global_pitch: 1.0,
            listener: None,
            finished: Vec::with_capacity(capacity),
        }
    }

    /// Create a sampler from the pool, envelope and master sections of a config
    pub fn from_config(config: &SamplerConfig) -> Self {
        let mut sampler = Self::new(config.pool.capacity, config.audio.sample_rate);
        sampler.set_envelope_settings(config.envelope);
        sampler.set_retrigger(config.pool.retrigger);
        sampler.set_global_volume(config.master.volume);
        sampler.set_global_pitch(config.master.pitch);
        sampler
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Voices waiting for allocation
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Voices currently bound to a note
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_note_active(&self, note: Note) -> bool {
        self.active.contains_key(&note)
    }

    /// Notes with an active voice, lowest first
    pub fn active_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.active.keys().copied().collect();
        notes.sort();
        notes
    }

    /// The voice playing a note, if any
    pub fn voice_for(&self, note: Note) -> Option<&Voice> {
        self.active.get(&note).map(|&slot| &self.voices[slot])
    }

    /// Output gain of every active voice from the last tick, lowest note first
    pub fn amplitudes(&self) -> Vec<(Note, f64)> {
        self.active_notes()
            .into_iter()
            .map(|note| (note, self.voices[self.active[&note]].amplitude()))
            .collect()
    }

    /// Register a sample for playback under its metadata name
    pub fn load_sample(&mut self, sample: SampleAsset) -> Result<()> {
        self.load_shared(Arc::new(sample))
    }

    /// Register a sample that is shared with other owners
    pub fn load_shared(&mut self, sample: Arc<SampleAsset>) -> Result<()> {
        let name = sample.name().to_string();
        if self.samples.contains_key(&name) {
            warn!(sample = name.as_str(), "Sample is already loaded");
            return Err(SamplerError::SampleAlreadyLoaded(name));
        }
        if self.samples.len() >= self.capacity() {
            warn!(sample = name.as_str(), capacity = self.capacity(), "No free sample slots");
            return Err(SamplerError::SampleCapacity(self.capacity()));
        }

        info!(
            sample = name.as_str(),
            base_note = %sample.metadata().base_note,
            frames = sample.len(),
            "Loaded sample"
        );
        self.samples.insert(name, sample);
        Ok(())
    }

    /// Remove a sample and reclaim every voice playing it
    pub fn unload_sample(&mut self, name: &str) -> bool {
        if self.samples.remove(name).is_none() {
            return false;
        }

        for slot in self.slots_for_sample(name) {
            self.reclaim(slot);
        }
        info!(sample = name, "Unloaded sample");
        true
    }

    /// Names of all loaded samples, sorted
    pub fn available_samples(&self) -> Vec<String> {
        let mut names: Vec<String> = self.samples.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn sample(&self, name: &str) -> Option<&Arc<SampleAsset>> {
        self.samples.get(name)
    }

    /// Trigger a note. Failures are logged and reported as `false`.
    pub fn play_note(&mut self, sample: &str, note: Note, velocity: f64) -> bool {
        match self.try_play_note(sample, note, velocity) {
            Ok(_) => true,
            Err(SamplerError::SampleNotFound(name)) => {
                warn!(
                    sample = name.as_str(),
                    available = ?self.available_samples(),
                    "Sample not found"
                );
                false
            }
            Err(e) => {
                warn!(sample, note = %note, error = %e, "Dropped note");
                false
            }
        }
    }

    /// Trigger a note, returning the slot of the voice that plays it
    pub fn try_play_note(&mut self, sample: &str, note: Note, velocity: f64) -> Result<usize> {
        let asset = self
            .samples
            .get(sample)
            .cloned()
            .ok_or_else(|| SamplerError::SampleNotFound(sample.to_string()))?;

        if let Some(&slot) = self.active.get(&note) {
            match self.retrigger {
                RetriggerBehavior::Ignore => {
                    return Err(SamplerError::NoteActive(note.to_string()));
                }
                RetriggerBehavior::Restart => {
                    debug!(note = %note, slot, "Restarting note");
                    self.reclaim(slot);
                }
            }
        }

        let slot = self
            .idle
            .pop_front()
            .ok_or(SamplerError::PoolExhausted(self.voices.len()))?;

        let voice = &mut self.voices[slot];
        voice.initialize(&asset, self.envelope);
        voice.set_global(self.global_volume, self.global_pitch);
        if !voice.play(note, velocity) {
            voice.reset();
            self.idle.push_front(slot);
            return Err(SamplerError::SampleNotFound(sample.to_string()));
        }

        self.active.insert(note, slot);
        debug!(sample, note = %note, slot, velocity, "Playing note");
        Ok(slot)
    }

    /// Release the voice playing a note; no-op if the note is not active
    pub fn stop_note(&mut self, note: Note) {
        if let Some(&slot) = self.active.get(&note) {
            debug!(note = %note, slot, "Stopping note");
            self.voices[slot].stop();
        }
    }

    /// Release every voice playing a sample
    pub fn stop_sample(&mut self, name: &str) {
        for slot in self.slots_for_sample(name) {
            self.voices[slot].stop();
        }
    }

    /// Release every active voice
    pub fn stop_all(&mut self) {
        for &slot in self.active.values() {
            self.voices[slot].stop();
        }
    }

    /// Set the volume multiplier (0.0-1.0) for active and future voices
    pub fn set_global_volume(&mut self, volume: f64) {
        self.global_volume = clamp_level(volume);
        self.apply_globals();
    }

    /// Set the pitch multiplier for active and future voices; must be positive
    pub fn set_global_pitch(&mut self, pitch: f64) {
        if !(pitch.is_finite() && pitch > 0.0) {
            warn!(pitch, "Ignoring non-positive global pitch");
            return;
        }
        self.global_pitch = pitch;
        self.apply_globals();
    }

    pub fn global_volume(&self) -> f64 {
        self.global_volume
    }

    pub fn global_pitch(&self) -> f64 {
        self.global_pitch
    }

    fn apply_globals(&mut self) {
        for &slot in self.active.values() {
            self.voices[slot].set_global(self.global_volume, self.global_pitch);
        }
    }

    /// Envelope timings used for voices allocated from now on
    pub fn set_envelope_settings(&mut self, settings: EnvelopeSettings) {
        self.envelope = settings.clamped();
    }

    pub fn envelope_settings(&self) -> EnvelopeSettings {
        self.envelope
    }

    pub fn set_attack(&mut self, seconds: f64) {
        self.envelope.attack = clamp_time(seconds);
    }

    pub fn set_decay(&mut self, seconds: f64) {
        self.envelope.decay = clamp_time(seconds);
    }

    pub fn set_sustain(&mut self, level: f64) {
        self.envelope.sustain = clamp_level(level);
    }

    pub fn set_release(&mut self, seconds: f64) {
        self.envelope.release = clamp_time(seconds);
    }

    pub fn set_retrigger(&mut self, retrigger: RetriggerBehavior) {
        self.retrigger = retrigger;
    }

    pub fn retrigger(&self) -> RetriggerBehavior {
        self.retrigger
    }

    /// Observe voices as they return to the pool
    pub fn on_voice_finished<F>(&mut self, listener: F)
    where
        F: FnMut(&VoiceEvent) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Advance every active voice by `delta` seconds, reclaiming the ones that
    /// finished. Returns how many voices went back to the pool.
    pub fn tick(&mut self, delta: f64) -> usize {
        for &slot in self.active.values() {
            if self.voices[slot].tick(delta) == VoiceState::Finished {
                self.finished.push(slot);
            }
        }

        let mut finished = std::mem::take(&mut self.finished);
        finished.sort_unstable();
        let count = finished.len();
        for slot in finished.drain(..) {
            self.reclaim(slot);
        }
        self.finished = finished;
        count
    }

    /// Render one mono output frame
    pub fn process(&mut self) -> f32 {
        self.tick(1.0 / self.sample_rate as f64);

        // Slot order keeps the float sum identical from run to run.
        let rate = self.sample_rate;
        let mut output = 0.0;
        for voice in self.voices.iter_mut().filter(|v| v.is_playing()) {
            output += voice.next_frame(rate);
        }
        output
    }

    /// Fill a buffer with rendered frames
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }

    fn slots_for_sample(&self, name: &str) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .active
            .values()
            .copied()
            .filter(|&slot| self.voices[slot].sample_name() == Some(name))
            .collect();
        slots.sort_unstable();
        slots
    }

    /// Return a voice to the idle queue
    fn reclaim(&mut self, slot: usize) {
        let voice = &mut self.voices[slot];
        let event = VoiceEvent {
            slot,
            note: voice.note(),
            sample: voice.sample_name().map(str::to_string),
        };

        if let Some(note) = event.note {
            if self.active.get(&note) == Some(&slot) {
                self.active.remove(&note);
            }
        }
        voice.reset();
        if !self.idle.contains(&slot) {
            self.idle.push_back(slot);
        }

        debug!(slot, note = ?event.note, "Returned voice to the pool");
        debug_assert_eq!(self.idle.len() + self.active.len(), self.voices.len());

        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }
}
