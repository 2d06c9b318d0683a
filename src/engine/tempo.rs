//! BPM controller with optional smooth transitions

use tracing::{debug, info};

use crate::mapping::lerp;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_BPM: f64 = 120.0;

const MIN_TRANSITION_SECS: f64 = 0.1;
const MAX_TRANSITION_SECS: f64 = 5.0;

/// Tempo state driving beat-based sequencing
#[derive(Debug, Clone)]
pub struct Tempo {
    bpm: f64,
    smooth: bool,
    transition_time: f64,
    start_bpm: f64,
    target_bpm: f64,
    transition_elapsed: f64,
    transitioning: bool,
}

impl Tempo {
    /// Create a tempo at `bpm`, clamped to 20-300
    pub fn new(bpm: f64) -> Self {
        let bpm = clamp_bpm(bpm);
        Self {
            bpm,
            smooth: false,
            transition_time: 1.0,
            start_bpm: bpm,
            target_bpm: bpm,
            transition_elapsed: 0.0,
            transitioning: false,
        }
    }

    /// Ramp between tempos over `transition_time` seconds instead of jumping
    pub fn with_smoothing(mut self, smooth: bool, transition_time: f64) -> Self {
        self.smooth = smooth;
        self.transition_time = transition_time.clamp(MIN_TRANSITION_SECS, MAX_TRANSITION_SECS);
        self
    }

    /// Change tempo, immediately or as a ramp when smoothing is on
    pub fn set_bpm(&mut self, bpm: f64) {
        let target = clamp_bpm(bpm);
        if self.smooth {
            debug!(from = self.bpm, to = target, "Starting tempo transition");
            self.start_bpm = self.bpm;
            self.target_bpm = target;
            self.transition_elapsed = 0.0;
            self.transitioning = true;
        } else {
            self.bpm = target;
            self.target_bpm = target;
            self.transitioning = false;
        }
    }

    /// Advance an in-progress transition by `delta` seconds
    pub fn update(&mut self, delta: f64) {
        if !self.transitioning {
            return;
        }

        self.transition_elapsed += delta.max(0.0);
        let progress = self.transition_elapsed / self.transition_time;
        if progress >= 1.0 {
            self.bpm = self.target_bpm;
            self.transitioning = false;
            info!(bpm = self.bpm, "Tempo transition complete");
        } else {
            self.bpm = lerp(self.start_bpm, self.target_bpm, progress);
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn target_bpm(&self) -> f64 {
        self.target_bpm
    }

    /// Beats per second
    pub fn speed(&self) -> f64 {
        self.bpm / 60.0
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_nan() {
        DEFAULT_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_defaults() {
        let tempo = Tempo::default();
        assert_eq!(tempo.bpm(), 120.0);
        assert_eq!(tempo.speed(), 2.0);
        assert_eq!(tempo.seconds_per_beat(), 0.5);
    }

    #[test]
    fn test_tempo_clamps() {
        assert_eq!(Tempo::new(5.0).bpm(), MIN_BPM);
        assert_eq!(Tempo::new(1000.0).bpm(), MAX_BPM);

        let mut tempo = Tempo::default();
        tempo.set_bpm(400.0);
        assert_eq!(tempo.bpm(), MAX_BPM);
    }

    #[test]
    fn test_immediate_change() {
        let mut tempo = Tempo::new(90.0);
        tempo.set_bpm(150.0);
        assert_eq!(tempo.bpm(), 150.0);
        assert!(!tempo.is_transitioning());
    }

    #[test]
    fn test_smooth_transition() {
        let mut tempo = Tempo::new(100.0).with_smoothing(true, 2.0);
        tempo.set_bpm(200.0);
        assert!(tempo.is_transitioning());
        assert_eq!(tempo.bpm(), 100.0);
        assert_eq!(tempo.target_bpm(), 200.0);

        tempo.update(1.0);
        assert!((tempo.bpm() - 150.0).abs() < 1e-9);

        tempo.update(1.5);
        assert_eq!(tempo.bpm(), 200.0);
        assert!(!tempo.is_transitioning());
    }

    #[test]
    fn test_transition_time_is_clamped() {
        let mut tempo = Tempo::new(60.0).with_smoothing(true, 0.0);
        tempo.set_bpm(120.0);
        tempo.update(0.1);
        assert_eq!(tempo.bpm(), 120.0);
    }
}
