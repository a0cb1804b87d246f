//! LFO (Low-Frequency Oscillator) Module
//!
//! Control-rate companion to [`crate::oscillator`]: the same morph-swept
//! phase-distortion/tanh waveshape, driven by either a free-running period
//! or a tempo-synced subdivision of the transport clock. Unlike the audio
//! oscillator, an LFO is reset to phase zero on note-on when configured to
//! do so, and caches its last output for destinations that read it more
//! than once per block.
//!
//! # Tempo sync
//!
//! In [`LfoRate::Synced`] mode the oscillation frequency is derived from
//! the clock's tempo and a subdivision multiplier (straight, triplet,
//! dotted) rather than from a fixed Hz value, so the LFO period always
//! lands on a musically useful fraction of a beat.

#![allow(dead_code)]

use crate::oscillator::shape;

/// Tempo-sync subdivision multiplier, applied to beats-per-second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncSubdivision {
    Straight(f32),
    Triplet(f32),
    Dotted(f32),
}

impl SyncSubdivision {
    /// Converts this subdivision into a frequency, given the transport's
    /// beats-per-second.
    pub fn to_hertz(&self, beats_per_second: f32) -> f32 {
        match self {
            SyncSubdivision::Straight(beats) => beats_per_second / beats.max(1e-6),
            SyncSubdivision::Triplet(beats) => beats_per_second / beats.max(1e-6) * 1.5,
            SyncSubdivision::Dotted(beats) => beats_per_second / beats.max(1e-6) * (2.0 / 3.0),
        }
    }
}

/// LFO rate representation: free-running Hz, or synced to the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LfoRate {
    Hertz(f32),
    Synced(SyncSubdivision),
}

/// Configuration for constructing an [`Lfo`].
#[derive(Debug, Clone, Copy)]
pub struct LfoConfig {
    pub rate: LfoRate,
    pub morph: f32,
    pub duty: f32,
    pub flip: bool,
    /// Force phase to zero on the next note-on this LFO observes.
    pub reset_on_note: bool,
    pub sample_rate: f32,
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self {
            rate: LfoRate::Hertz(2.0),
            morph: 0.5,
            duty: 0.5,
            flip: false,
            reset_on_note: false,
            sample_rate: 48_000.0,
        }
    }
}

/// Control-rate oscillator sharing the audio oscillator's morph-swept
/// waveshape, with free or tempo-synced rate and optional note-reset.
#[derive(Debug, Clone)]
pub struct Lfo {
    rate: LfoRate,
    morph: f32,
    duty: f32,
    flip: bool,
    reset_on_note: bool,
    sample_rate: f32,

    phase: u32,
    last_output: f32,
}

impl Lfo {
    pub fn new() -> Self {
        Self::with_config(LfoConfig::default())
    }

    pub fn with_config(config: LfoConfig) -> Self {
        Self {
            rate: config.rate,
            morph: config.morph.clamp(0.0, 1.0),
            duty: config.duty.clamp(0.0, 1.0),
            flip: config.flip,
            reset_on_note: config.reset_on_note,
            sample_rate: config.sample_rate.max(1.0),
            phase: 0,
            last_output: 0.0,
        }
    }

    pub fn set_rate(&mut self, rate: LfoRate) {
        self.rate = rate;
    }

    pub fn set_morph(&mut self, morph: f32) {
        self.morph = morph.clamp(0.0, 1.0);
    }

    pub fn set_duty(&mut self, duty: f32) {
        self.duty = duty.clamp(0.0, 1.0);
    }

    pub fn set_flip(&mut self, flip: bool) {
        self.flip = flip;
    }

    pub fn set_reset_on_note(&mut self, reset_on_note: bool) {
        self.reset_on_note = reset_on_note;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Forces phase to zero. Called by the owning voice on note-on when
    /// `reset_on_note` is set.
    pub fn reset_phase(&mut self) {
        self.phase = 0;
    }

    /// Called by the owning voice on note-on; resets phase only if this LFO
    /// was configured to do so.
    pub fn note_on(&mut self) {
        if self.reset_on_note {
            self.reset_phase();
        }
    }

    fn frequency_hz(&self, beats_per_second: f32) -> f32 {
        match self.rate {
            LfoRate::Hertz(hz) => hz,
            LfoRate::Synced(subdivision) => subdivision.to_hertz(beats_per_second),
        }
    }

    /// Advances the LFO by one sample, given the transport's current
    /// beats-per-second (ignored in free-running mode). Returns the new
    /// output in `[-1,+1]`.
    pub fn process(&mut self, beats_per_second: f32) -> f32 {
        let frequency = self.frequency_hz(beats_per_second);
        let cycles_per_sample = frequency as f64 / self.sample_rate as f64;
        let increment = (cycles_per_sample * (u32::MAX as f64 + 1.0)) as i64;
        self.phase = self.phase.wrapping_add(increment as u32);

        let normalized_phase = self.phase as f64 / (u32::MAX as f64 + 1.0);
        let mut output = shape(normalized_phase as f32, self.morph, self.duty);
        if self.flip {
            output = -output;
        }
        self.last_output = output;
        output
    }

    /// Processes a block of samples at a fixed tempo, returning each value.
    pub fn process_block(&mut self, count: usize, beats_per_second: f32) -> Vec<f32> {
        (0..count).map(|_| self.process(beats_per_second)).collect()
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}
