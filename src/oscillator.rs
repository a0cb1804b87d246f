//! Oscillator Module
//!
//! Per-voice audio-rate generator. Unlike a classic fixed-waveform
//! oscillator, this one sweeps continuously between a phase-distortion
//! shape and a tanh-saturated shape as `morph` travels `[0,1]`, and exposes
//! a frequency-modulation input so four of these can cross-patch through an
//! [FM depth matrix](crate::fm_matrix::FmMatrix) inside a
//! [`Voice`](crate::voice::Voice).
//!
//! # Phase accumulator
//!
//! Phase is kept as an unsigned 32-bit fixed-point fraction of a cycle
//! rather than an `f32` in `[0,1)`: advancing it by a `u32` increment and
//! letting it wrap on overflow *is* the modulo operation, with no branch
//! and no precision loss as phase approaches 1.0 (an `f32` phase loses
//! ULPs there, which is audible as the phase increment shrinks at high
//! frequencies). The increment is computed once per sample in `f64`
//! (frequency/sample_rate can be a very small fraction) and truncated to
//! `u32` last.
//!
//! # Through-zero FM
//!
//! The frequency-modulation contribution is added to the effective
//! frequency *before* the phase increment is computed, in Hz-equivalent
//! terms, and can be large enough in magnitude to drive the increment
//! negative. A negative increment is not clamped away: phase runs
//! backwards for as long as the instantaneous frequency stays negative,
//! which is the through-zero behavior real analog FM circuits exhibit and
//! that classic phase-only FM algorithms cannot reproduce.

#![allow(dead_code)]

use std::f32::consts::PI;

/// Pitch-tracking mode for an oscillator inside a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchMode {
    /// Frequency is independent of any MIDI note; useful for drones and FM
    /// operators that should not track the keyboard.
    Free,
    /// Frequency tracks the voice's MIDI note through `ratio` and `offset`.
    Key,
}

/// Frequency reference for MIDI note 60 (C4) in [`PitchMode::Key`].
pub const C4_FREQUENCY_HZ: f32 = 261.625_56;

/// Configuration for constructing an [`Oscillator`].
#[derive(Debug, Clone, Copy)]
pub struct OscillatorConfig {
    /// Pitch-tracking mode.
    pub mode: PitchMode,
    /// Base frequency in Hz ([`PitchMode::Free`]) or unused ([`PitchMode::Key`]).
    pub base_frequency: f32,
    /// Morph position in `[0,1]`; `<=0.5` is the phase-distortion branch,
    /// `>0.5` is the tanh-shaping branch.
    pub morph: f32,
    /// Pulse-width-style duty in `[0,1]`; affects only the tanh branch.
    pub duty: f32,
    /// Frequency ratio applied in [`PitchMode::Key`] (1.0 = unison with the note).
    pub ratio: f32,
    /// Frequency offset in Hz applied in [`PitchMode::Key`], after `ratio`.
    pub offset_hz: f32,
    /// Inverts the output sign.
    pub flip: bool,
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            mode: PitchMode::Free,
            base_frequency: 440.0,
            morph: 0.5,
            duty: 0.5,
            ratio: 1.0,
            offset_hz: 0.0,
            flip: false,
            sample_rate: 48_000.0,
        }
    }
}

/// Per-oscillator modulation inputs, produced by the modulation matrix and
/// applied once per sample by the owning [`Voice`](crate::voice::Voice).
#[derive(Debug, Clone, Copy, Default)]
pub struct OscillatorModInputs {
    /// Pitch modulation in octaves (applied as `2^pitch_mod`).
    pub pitch_mod_octaves: f32,
    /// Additive offset applied to `morph`, clamped back into `[0,1]`.
    pub morph_mod: f32,
    /// Additive offset applied to `duty`, clamped back into `[0,1]`.
    pub duty_mod: f32,
    /// Additive offset applied to `ratio` ([`PitchMode::Key`] only).
    pub ratio_mod: f32,
    /// Additive offset applied to `offset_hz` ([`PitchMode::Key`] only).
    pub offset_mod: f32,
}

/// Audio-rate oscillator with a morph-swept phase-distortion/tanh waveshape
/// and a through-zero frequency-modulation input.
#[derive(Debug, Clone)]
pub struct Oscillator {
    mode: PitchMode,
    base_frequency: f32,
    morph: f32,
    duty: f32,
    ratio: f32,
    offset_hz: f32,
    flip: bool,
    sample_rate: f32,

    /// Fractional-cycle phase accumulator; wraps on overflow.
    phase: u32,
    /// Output of the most recent `tick`, consumed one sample later by the
    /// FM mixer per the one-sample-delay contract.
    previous_output: f32,
}

impl Oscillator {
    /// Creates an oscillator from the given configuration.
    pub fn new(config: OscillatorConfig) -> Self {
        Self {
            mode: config.mode,
            base_frequency: config.base_frequency,
            morph: config.morph.clamp(0.0, 1.0),
            duty: config.duty.clamp(0.0, 1.0),
            ratio: config.ratio,
            offset_hz: config.offset_hz,
            flip: config.flip,
            sample_rate: config.sample_rate.max(1.0),
            phase: 0,
            previous_output: 0.0,
        }
    }

    /// Resets phase and FM history to zero. Called on note-on and on voice
    /// steal, per the voice lifecycle invariant that a freshly allocated
    /// voice never inherits stale energy.
    pub fn reset(&mut self) {
        self.phase = 0;
        self.previous_output = 0.0;
    }

    pub fn set_mode(&mut self, mode: PitchMode) {
        self.mode = mode;
    }

    pub fn set_base_frequency(&mut self, hz: f32) {
        self.base_frequency = hz;
    }

    pub fn set_morph(&mut self, morph: f32) {
        self.morph = morph.clamp(0.0, 1.0);
    }

    pub fn set_duty(&mut self, duty: f32) {
        self.duty = duty.clamp(0.0, 1.0);
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
    }

    pub fn set_offset_hz(&mut self, offset_hz: f32) {
        self.offset_hz = offset_hz;
    }

    pub fn set_flip(&mut self, flip: bool) {
        self.flip = flip;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
    }

    /// The value this oscillator produced on its previous `tick`, consumed
    /// by the FM mixer one sample later to break the algebraic FM loop.
    pub fn previous_output(&self) -> f32 {
        self.previous_output
    }

    /// Effective frequency in Hz before frequency modulation is applied,
    /// given the owning voice's MIDI note (only consulted in `Key` mode).
    fn base_effective_frequency(&self, midi_note: u8, pitch_mod_octaves: f32) -> f32 {
        let unmodulated = match self.mode {
            PitchMode::Free => self.base_frequency,
            PitchMode::Key => {
                let semitones = midi_note as f32 - 60.0;
                C4_FREQUENCY_HZ * 2f32.powf(semitones / 12.0) * self.ratio + self.offset_hz
            }
        };
        unmodulated * 2f32.powf(pitch_mod_octaves)
    }

    /// Advances the oscillator by one sample and returns its output in
    /// `[-1,+1]`.
    ///
    /// `fm_input_hz` is the already-scaled Hz-equivalent frequency-modulation
    /// contribution for this oscillator this sample (see
    /// [`crate::fm_matrix::FmMatrix`]); `midi_note` is the owning voice's
    /// note (ignored outside [`PitchMode::Key`]).
    pub fn tick(&mut self, midi_note: u8, fm_input_hz: f32, mods: &OscillatorModInputs) -> f32 {
        let ratio = self.ratio + mods.ratio_mod;
        let offset_hz = self.offset_hz + mods.offset_mod;
        let base = match self.mode {
            PitchMode::Free => self.base_frequency,
            PitchMode::Key => {
                let semitones = midi_note as f32 - 60.0;
                C4_FREQUENCY_HZ * 2f32.powf(semitones / 12.0) * ratio + offset_hz
            }
        };
        let effective_frequency = base * 2f32.powf(mods.pitch_mod_octaves) + fm_input_hz;

        // Phase increment is computed in f64 and truncated to u32 last, so
        // very small frequency/sample_rate ratios do not lose precision.
        let cycles_per_sample = effective_frequency as f64 / self.sample_rate as f64;
        let increment = (cycles_per_sample * (u32::MAX as f64 + 1.0)) as i64;
        self.phase = self.phase.wrapping_add(increment as u32);

        let morph = (self.morph + mods.morph_mod).clamp(0.0, 1.0);
        let duty = (self.duty + mods.duty_mod).clamp(0.0, 1.0);
        let normalized_phase = self.phase as f64 / (u32::MAX as f64 + 1.0);

        let mut output = shape(normalized_phase as f32, morph, duty);
        if self.flip {
            output = -output;
        }
        self.previous_output = output;
        output
    }
}

/// Computes the morph-swept waveshape for a normalized phase `p ∈ [0,1)`.
///
/// `m <= 0.5` takes the phase-distortion branch: phase is warped around an
/// inflection point before being mapped through a cosine, producing a sine
/// at `m = 0.5` that sharpens toward an impulse-like shape as `m -> 0`.
/// `m > 0.5` takes the tanh-shaping branch: an increasingly hot gain drives
/// a sine into soft saturation, approaching a square wave at `m = 1`.
pub fn shape(p: f32, m: f32, duty: f32) -> f32 {
    if m <= 0.5 {
        let d = (1.0 - 2.0 * m).clamp(1e-4, 1.0 - 1e-4);
        let warped = if p < d { p / d * 0.5 } else { 0.5 + (p - d) / (1.0 - d) * 0.5 };
        -(2.0 * PI * warped).cos()
    } else {
        let t = (m - 0.5) * 2.0; // 0..1 across the tanh branch
        let gain = 1.0 + t * 9.0; // sweeps 1 -> ~10
        let shifted_phase = p + (duty - 0.5) * 0.5;
        let sine = (2.0 * PI * shifted_phase).sin();
        (sine * gain).tanh() / gain.tanh()
    }
}

/// Converts a MIDI note number to frequency using equal temperament with
/// A4 (MIDI 69) = 440 Hz.
pub fn midi_to_frequency(midi_note: u8) -> f32 {
    440.0 * 2.0f32.powf((midi_note as f32 - 69.0) / 12.0)
}
