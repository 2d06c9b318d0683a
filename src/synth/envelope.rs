//! ADSR envelope generator
//!
//! Linear Attack-Decay-Sustain-Release curve advanced by elapsed time.
//!
//! Stages run `Attack (0 -> 1)`, `Decay (1 -> sustain)`, `Sustain (hold)`,
//! `Release (sustain -> 0)`, then `Finished`. Time left over when a stage
//! completes carries into the next one, so zero-length stages are skipped
//! within a single update and total timing is exact regardless of tick size.
//!
//! Release always ramps from the sustain level. Releasing during Attack or
//! Decay therefore jumps straight onto the release ramp; the step in level is
//! kept as-is rather than smoothed.

use serde::{Deserialize, Serialize};

/// Longest allowed attack, decay or release time in seconds
pub const MAX_STAGE_SECONDS: f64 = 2.0;

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Finished,
}

/// ADSR timings shared by every voice the sampler allocates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSettings {
    /// Seconds to reach peak level (default: 0.1)
    #[serde(default = "default_attack")]
    pub attack: f64,

    /// Seconds to fall from peak to sustain (default: 0.1)
    #[serde(default = "default_decay")]
    pub decay: f64,

    /// Level held while the note is down, 0.0-1.0 (default: 0.7)
    #[serde(default = "default_sustain")]
    pub sustain: f64,

    /// Seconds to fade out after release (default: 0.2)
    #[serde(default = "default_release")]
    pub release: f64,
}

fn default_attack() -> f64 { 0.1 }
fn default_decay() -> f64 { 0.1 }
fn default_sustain() -> f64 { 0.7 }
fn default_release() -> f64 { 0.2 }

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack: default_attack(),
            decay: default_decay(),
            sustain: default_sustain(),
            release: default_release(),
        }
    }
}

impl EnvelopeSettings {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
        .clamped()
    }

    /// Times limited to 0..=2 s and sustain to 0..=1
    pub fn clamped(self) -> Self {
        Self {
            attack: clamp_time(self.attack),
            decay: clamp_time(self.decay),
            sustain: clamp_level(self.sustain),
            release: clamp_time(self.release),
        }
    }
}

pub(crate) fn clamp_time(seconds: f64) -> f64 {
    if seconds.is_nan() {
        0.0
    } else {
        seconds.clamp(0.0, MAX_STAGE_SECONDS)
    }
}

pub(crate) fn clamp_level(level: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// ADSR envelope generator
#[derive(Debug, Clone)]
pub struct Envelope {
    settings: EnvelopeSettings,
    stage: EnvelopeStage,
    elapsed: f64,
    level: f64,
    velocity: f64,
}

impl Envelope {
    /// Create an idle envelope; it stays finished until [`Envelope::start`]
    pub fn new(settings: EnvelopeSettings) -> Self {
        Self {
            settings: settings.clamped(),
            stage: EnvelopeStage::Finished,
            elapsed: 0.0,
            level: 0.0,
            velocity: 1.0,
        }
    }

    pub fn settings(&self) -> EnvelopeSettings {
        self.settings
    }

    /// Replace the timings; a running curve continues with the new values
    pub fn set_settings(&mut self, settings: EnvelopeSettings) {
        self.settings = settings.clamped();
    }

    /// Begin the attack stage from silence.
    ///
    /// Velocity is stored for the caller to apply to the output; it does not
    /// reshape the curve.
    pub fn start(&mut self, velocity: f64) {
        self.elapsed = 0.0;
        self.level = 0.0;
        self.velocity = clamp_level(velocity);
        self.stage = EnvelopeStage::Attack;
    }

    /// Jump to the release stage from any active stage
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Finished {
            self.elapsed = 0.0;
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Force the envelope to silence without a release
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Finished;
        self.elapsed = 0.0;
        self.level = 0.0;
    }

    /// Advance by `delta` seconds and return the current level (0.0-1.0)
    pub fn update(&mut self, delta: f64) -> f64 {
        if self.stage == EnvelopeStage::Finished {
            return 0.0;
        }

        if delta.is_finite() && delta > 0.0 {
            self.elapsed += delta;
        }

        let EnvelopeSettings {
            attack,
            decay,
            sustain,
            release,
        } = self.settings;

        loop {
            match self.stage {
                EnvelopeStage::Attack => {
                    if self.elapsed >= attack {
                        self.elapsed -= attack;
                        self.level = 1.0;
                        self.stage = EnvelopeStage::Decay;
                        continue;
                    }
                    self.level = self.elapsed / attack;
                }

                EnvelopeStage::Decay => {
                    if self.elapsed >= decay {
                        self.elapsed -= decay;
                        self.level = sustain;
                        self.stage = EnvelopeStage::Sustain;
                        continue;
                    }
                    self.level = 1.0 + (sustain - 1.0) * (self.elapsed / decay);
                }

                EnvelopeStage::Sustain => {
                    // Only an explicit release leaves sustain.
                    self.elapsed = 0.0;
                    self.level = sustain;
                }

                EnvelopeStage::Release => {
                    if self.elapsed >= release {
                        self.elapsed = 0.0;
                        self.level = 0.0;
                        self.stage = EnvelopeStage::Finished;
                    } else {
                        self.level = sustain * (1.0 - self.elapsed / release);
                    }
                }

                EnvelopeStage::Finished => {
                    self.level = 0.0;
                }
            }
            break;
        }

        self.level
    }

    /// Current level without advancing
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Velocity captured by the last [`Envelope::start`]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Get current stage
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Seconds spent in the current stage
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.stage == EnvelopeStage::Finished
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(EnvelopeSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn envelope(attack: f64, decay: f64, sustain: f64, release: f64) -> Envelope {
        Envelope::new(EnvelopeSettings::new(attack, decay, sustain, release))
    }

    #[test]
    fn test_envelope_starts_finished() {
        let mut env = Envelope::default();
        assert!(env.is_finished());
        assert_eq!(env.update(0.5), 0.0);
    }

    #[test]
    fn test_envelope_attack_is_linear() {
        let mut env = envelope(0.1, 0.1, 0.7, 0.2);
        env.start(1.0);
        assert_eq!(env.stage(), EnvelopeStage::Attack);

        assert!((env.update(0.025) - 0.25).abs() < EPS);
        assert!((env.update(0.025) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_envelope_decay_to_sustain() {
        let mut env = envelope(0.1, 0.2, 0.5, 0.2);
        env.start(1.0);
        env.update(0.1);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
        assert!((env.level() - 1.0).abs() < EPS);

        assert!((env.update(0.1) - 0.75).abs() < EPS);
        assert!((env.update(0.1) - 0.5).abs() < EPS);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn test_envelope_sustain_holds() {
        let mut env = envelope(0.0, 0.0, 0.6, 0.1);
        env.start(1.0);
        for _ in 0..1000 {
            assert!((env.update(0.01) - 0.6).abs() < EPS);
        }
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn test_envelope_release_to_finished() {
        let mut env = envelope(0.0, 0.0, 0.8, 0.4);
        env.start(1.0);
        env.update(0.0);
        env.release();
        assert_eq!(env.stage(), EnvelopeStage::Release);

        assert!((env.update(0.2) - 0.4).abs() < EPS);
        assert_eq!(env.update(0.2), 0.0);
        assert!(env.is_finished());
    }

    #[test]
    fn test_zero_length_stages_skip_in_one_update() {
        let mut env = envelope(0.0, 0.0, 0.5, 0.0);
        env.start(1.0);
        assert!((env.update(0.0) - 0.5).abs() < EPS);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);

        env.release();
        assert_eq!(env.update(0.0), 0.0);
        assert!(env.is_finished());
    }

    #[test]
    fn test_zero_attack_starts_at_peak() {
        let mut env = envelope(0.0, 0.5, 0.5, 0.5);
        env.start(1.0);
        assert!((env.update(0.0) - 1.0).abs() < EPS);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
    }

    #[test]
    fn test_zero_delta_is_idempotent() {
        let mut env = envelope(0.2, 0.2, 0.5, 0.2);
        env.start(1.0);
        let level = env.update(0.05);
        assert_eq!(env.update(0.0), level);
        assert_eq!(env.update(0.0), level);
    }

    #[test]
    fn test_output_bounded_and_continuous() {
        let mut env = envelope(0.05, 0.08, 0.3, 0.12);
        let dt = 0.001;
        env.start(1.0);

        let mut previous = 0.0;
        for step in 0..400 {
            if step == 200 {
                env.release();
                // Release from sustain starts exactly at the sustain level.
                previous = env.level();
            }
            let level = env.update(dt);
            assert!((0.0..=1.0).contains(&level));
            // Steepest slope is attack: 1.0 per 0.05 s.
            assert!((level - previous).abs() <= dt / 0.05 + EPS, "jump at step {}", step);
            previous = level;
        }
        assert!(env.is_finished());
    }

    #[test]
    fn test_total_duration_matches_settings() {
        let (a, d, r) = (0.3, 0.2, 0.5);
        let mut env = envelope(a, d, 0.4, r);
        let dt = 0.001;
        env.start(1.0);

        let mut elapsed = 0.0;
        while env.stage() != EnvelopeStage::Sustain {
            env.update(dt);
            elapsed += dt;
        }
        env.release();
        while !env.is_finished() {
            env.update(dt);
            elapsed += dt;
        }

        assert!((elapsed - (a + d + r)).abs() < 2.0 * dt, "elapsed {}", elapsed);
    }

    #[test]
    fn test_large_tick_crosses_several_stages() {
        let mut env = envelope(0.1, 0.1, 0.5, 0.3);
        env.start(1.0);
        // Lands halfway through decay.
        assert!((env.update(0.15) - 0.75).abs() < EPS);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
    }

    #[test]
    fn test_release_during_attack_ignores_current_level() {
        let mut early = envelope(1.0, 0.1, 0.6, 0.4);
        early.start(1.0);
        early.update(0.1);
        early.release();

        let mut late = envelope(1.0, 0.1, 0.6, 0.4);
        late.start(1.0);
        late.update(0.9);
        late.release();

        let a = early.update(0.1);
        let b = late.update(0.1);
        assert!((a - b).abs() < EPS);
        assert!((a - 0.45).abs() < EPS);
    }

    #[test]
    fn test_release_when_finished_is_noop() {
        let mut env = Envelope::default();
        env.release();
        assert!(env.is_finished());
    }

    #[test]
    fn test_start_stores_clamped_velocity() {
        let mut env = Envelope::default();
        env.start(1.7);
        assert_eq!(env.velocity(), 1.0);
        env.start(-0.2);
        assert_eq!(env.velocity(), 0.0);
        env.start(0.4);
        assert_eq!(env.velocity(), 0.4);
    }

    #[test]
    fn test_settings_are_clamped() {
        let settings = EnvelopeSettings::new(5.0, -1.0, 1.5, 0.5);
        assert_eq!(settings.attack, MAX_STAGE_SECONDS);
        assert_eq!(settings.decay, 0.0);
        assert_eq!(settings.sustain, 1.0);
        assert_eq!(settings.release, 0.5);
    }

    #[test]
    fn test_reset() {
        let mut env = Envelope::default();
        env.start(1.0);
        env.update(0.05);
        env.reset();
        assert!(env.is_finished());
        assert_eq!(env.level(), 0.0);
    }
}
