//! Beat-scheduled note events
//!
//! Events start and stop on beat positions. Advancing converts elapsed
//! seconds to beats through a [`Tempo`] and triggers every boundary that
//! was crossed, in beat order. Stops that share a beat with a start fire
//! first, so back-to-back events on one note hand over cleanly.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Sampler, Tempo};
use crate::mapping::{Note, ScaleMapper};

/// A note scheduled on the beat grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Start position in beats
    pub beat: f64,

    /// Registered sample name
    pub sample: String,

    pub note: Note,

    /// 0.0-1.0 (default: 1.0)
    #[serde(default = "default_velocity")]
    pub velocity: f64,

    /// Length in beats (default: 1.0)
    #[serde(default = "default_length")]
    pub length: f64,
}

fn default_velocity() -> f64 { 1.0 }
fn default_length() -> f64 { 1.0 }

impl NoteEvent {
    pub fn new(beat: f64, sample: impl Into<String>, note: Note) -> Self {
        Self {
            beat,
            sample: sample.into(),
            note,
            velocity: default_velocity(),
            length: default_length(),
        }
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Beat at which the note is released
    pub fn end_beat(&self) -> f64 {
        self.beat + self.length.max(0.0)
    }
}

/// Plays a list of note events into a sampler
#[derive(Debug, Clone)]
pub struct Sequencer {
    events: Vec<NoteEvent>,
    quantizer: Option<ScaleMapper>,
    position: f64,
    next_event: usize,
    pending_stops: Vec<(f64, Note)>,
}

impl Sequencer {
    /// Create a sequencer; events are ordered by start beat, keeping input order for ties.
    /// Events without a finite start beat can never fire and are dropped.
    pub fn new(mut events: Vec<NoteEvent>) -> Self {
        let before = events.len();
        events.retain(|e| e.beat.is_finite());
        if events.len() < before {
            warn!(dropped = before - events.len(), "Dropping events with a non-finite beat");
        }
        events.sort_by(|a, b| a.beat.total_cmp(&b.beat));
        Self {
            events,
            quantizer: None,
            position: 0.0,
            next_event: 0,
            pending_stops: Vec::new(),
        }
    }

    /// Snap every event's note to a scale before playing it
    pub fn with_quantizer(mut self, quantizer: ScaleMapper) -> Self {
        self.quantizer = Some(quantizer);
        self
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Current position in beats
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Beat at which the last event ends
    pub fn length_beats(&self) -> f64 {
        self.events.iter().map(NoteEvent::end_beat).fold(0.0, f64::max)
    }

    /// All events have started and been released
    pub fn is_finished(&self) -> bool {
        self.next_event >= self.events.len() && self.pending_stops.is_empty()
    }

    /// Rewind to beat zero, releasing anything still held
    pub fn reset(&mut self, sampler: &mut Sampler) {
        for (_, note) in self.pending_stops.drain(..) {
            sampler.stop_note(note);
        }
        self.position = 0.0;
        self.next_event = 0;
    }

    /// Advance by `delta` seconds. Returns the number of notes started.
    pub fn advance(&mut self, sampler: &mut Sampler, tempo: &mut Tempo, delta: f64) -> usize {
        tempo.update(delta);
        let end = self.position + delta.max(0.0) * tempo.speed();
        let mut started = 0;

        loop {
            let next_start = self
                .events
                .get(self.next_event)
                .map(|e| e.beat)
                .filter(|&beat| beat < end);
            let next_stop = self
                .pending_stops
                .iter()
                .enumerate()
                .filter(|(_, (beat, _))| *beat < end)
                .min_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
                .map(|(i, (beat, _))| (i, *beat));

            match (next_start, next_stop) {
                (None, None) => break,
                (Some(start), Some((_, stop))) if start < stop => {
                    started += self.start_next(sampler);
                }
                (_, Some((index, _))) => {
                    let (beat, note) = self.pending_stops.swap_remove(index);
                    debug!(beat, note = %note, "Sequencer stop");
                    sampler.stop_note(note);
                }
                (Some(_), None) => {
                    started += self.start_next(sampler);
                }
            }
        }

        self.position = end;
        started
    }

    fn start_next(&mut self, sampler: &mut Sampler) -> usize {
        let event = &self.events[self.next_event];
        self.next_event += 1;

        let note = match &self.quantizer {
            Some(q) => q.nearest(event.note),
            None => event.note,
        };

        debug!(beat = event.beat, sample = event.sample.as_str(), note = %note, "Sequencer start");
        if sampler.play_note(&event.sample, note, event.velocity) {
            // A restarted note belongs to this event now; the earlier release is stale.
            self.pending_stops.retain(|(_, held)| *held != note);
            self.pending_stops.push((event.end_beat(), note));
            1
        } else {
            0
        }
    }
}
