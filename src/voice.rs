//! Voice Module
//!
//! Owns four oscillators, one envelope, and the one-sample-delayed FM
//! history those oscillators cross-patch through. Produces one monaural
//! sample per tick.

#![allow(dead_code)]

use crate::envelope::{AdsrEnvelope, EnvelopeConfig};
use crate::fm_matrix::{FmMatrix, OSCILLATORS_PER_VOICE};
use crate::oscillator::{Oscillator, OscillatorConfig, OscillatorModInputs};

/// Per-oscillator mix weight and modulation inputs, supplied by the synth
/// each block from the modulation matrix evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OscillatorMix {
    /// Base level, combined with `level_mod` to form the mix weight.
    pub level: f32,
    pub level_mod: f32,
    pub mods: OscillatorModInputs,
}

/// A single polyphonic voice: four oscillators, one envelope, and the FM
/// history connecting them.
#[derive(Debug, Clone)]
pub struct Voice {
    active: bool,
    midi_note: u8,
    oscillators: [Oscillator; OSCILLATORS_PER_VOICE],
    envelope: AdsrEnvelope,
    /// Previous sample's output per oscillator, consumed by the FM mixer
    /// this sample per the one-sample-delay contract.
    fm_history: [f32; OSCILLATORS_PER_VOICE],
    /// Timestamp (audio thread's running sample counter) of the most recent
    /// note-on, used by the oldest-voice voice-stealing fallback.
    allocated_at: u64,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        let osc_config = OscillatorConfig {
            sample_rate,
            ..Default::default()
        };
        Self {
            active: false,
            midi_note: 0,
            oscillators: [
                Oscillator::new(osc_config),
                Oscillator::new(osc_config),
                Oscillator::new(osc_config),
                Oscillator::new(osc_config),
            ],
            envelope: AdsrEnvelope::with_config(EnvelopeConfig {
                sample_rate,
                ..Default::default()
            }),
            fm_history: [0.0; OSCILLATORS_PER_VOICE],
            allocated_at: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn midi_note(&self) -> u8 {
        self.midi_note
    }

    pub fn allocated_at(&self) -> u64 {
        self.allocated_at
    }

    pub fn envelope(&self) -> &AdsrEnvelope {
        &self.envelope
    }

    pub fn oscillator_mut(&mut self, index: usize) -> &mut Oscillator {
        &mut self.oscillators[index]
    }

    pub fn envelope_mut(&mut self) -> &mut AdsrEnvelope {
        &mut self.envelope
    }

    /// Allocates this voice to a new note: resets oscillator phases and FM
    /// history (never a soft-steal — stale energy from the previous note
    /// must not bleed into the new one) and triggers the envelope.
    pub fn note_on(&mut self, midi_note: u8, at_sample: u64) {
        self.midi_note = midi_note;
        self.active = true;
        self.allocated_at = at_sample;
        for osc in &mut self.oscillators {
            osc.reset();
        }
        self.fm_history = [0.0; OSCILLATORS_PER_VOICE];
        self.envelope.note_on();
    }

    /// Releases this voice's envelope if it currently holds `midi_note`.
    pub fn note_off(&mut self, midi_note: u8) {
        if self.active && self.midi_note == midi_note {
            self.envelope.note_off();
        }
    }

    /// Immediately deactivates the voice, clearing FM history. Used by
    /// voice-stealing, which resets rather than soft-steals.
    pub fn force_deactivate(&mut self) {
        self.active = false;
        self.envelope.hard_reset();
        self.fm_history = [0.0; OSCILLATORS_PER_VOICE];
    }

    /// Produces one monaural sample, advancing the envelope and all four
    /// oscillators. `mix` supplies the per-oscillator modulation inputs and
    /// mix weights computed by the synth from this block's mod-matrix
    /// evaluation; `fm_matrix` supplies the cross-patch depths.
    pub fn tick(&mut self, fm_matrix: &FmMatrix, mix: &[OscillatorMix; OSCILLATORS_PER_VOICE]) -> f32 {
        if !self.active {
            return 0.0;
        }

        let level = self.envelope.process();
        if self.envelope.stage() == crate::envelope::EnvelopeStage::Off {
            self.active = false;
            self.fm_history = [0.0; OSCILLATORS_PER_VOICE];
            return 0.0;
        }

        let fm_inputs = fm_matrix.fm_inputs(&self.fm_history);

        let mut outputs = [0.0f32; OSCILLATORS_PER_VOICE];
        let mut weighted_sum = 0.0f32;
        let mut total_weight = 0.0f32;
        for i in 0..OSCILLATORS_PER_VOICE {
            let output = self.oscillators[i].tick(self.midi_note, fm_inputs[i], &mix[i].mods);
            outputs[i] = output;
            let weight = (mix[i].level + mix[i].level_mod).max(0.0);
            weighted_sum += output * weight;
            total_weight += weight;
        }

        // Publish this sample's outputs as next sample's FM history only
        // after every oscillator has been computed, so none of them
        // observes a same-sample update from another (the two-phase
        // compute-then-publish discipline that avoids an evaluation-order
        // dependent FM loop).
        self.fm_history = outputs;

        let mix_out = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };

        mix_out * level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_mix() -> [OscillatorMix; OSCILLATORS_PER_VOICE] {
        [
            OscillatorMix {
                level: 1.0,
                ..Default::default()
            },
            OscillatorMix::default(),
            OscillatorMix::default(),
            OscillatorMix::default(),
        ]
    }

    #[test]
    fn inactive_voice_outputs_silence() {
        let mut v = Voice::new(48_000.0);
        let fm = FmMatrix::new();
        assert_eq!(v.tick(&fm, &unit_mix()), 0.0);
    }

    #[test]
    fn note_on_activates_voice_and_envelope() {
        let mut v = Voice::new(48_000.0);
        v.note_on(60, 0);
        assert!(v.is_active());
        assert_eq!(v.envelope().stage(), crate::envelope::EnvelopeStage::Attack);
    }

    #[test]
    fn all_zero_weight_oscillators_produce_zero_not_nan() {
        let mut v = Voice::new(48_000.0);
        v.note_on(60, 0);
        let fm = FmMatrix::new();
        let zero_mix = [OscillatorMix::default(); OSCILLATORS_PER_VOICE];
        for _ in 0..100 {
            let s = v.tick(&fm, &zero_mix);
            assert!(s.is_finite());
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn voice_deactivates_after_release_completes_and_clears_fm_history() {
        let mut v = Voice::new(48_000.0);
        v.note_on(60, 0);
        v.envelope_mut().set_attack_secs(0.001);
        v.envelope_mut().set_decay_secs(0.001);
        v.envelope_mut().set_release_secs(0.001);
        let fm = FmMatrix::new();
        let mix = unit_mix();
        for _ in 0..200 {
            v.tick(&fm, &mix);
        }
        v.note_off(60);
        for _ in 0..10_000 {
            v.tick(&fm, &mix);
            if !v.is_active() {
                break;
            }
        }
        assert!(!v.is_active());
        assert_eq!(v.fm_history, [0.0; OSCILLATORS_PER_VOICE]);
    }

    #[test]
    fn force_deactivate_clears_state_for_stealing() {
        let mut v = Voice::new(48_000.0);
        v.note_on(60, 0);
        let fm = FmMatrix::new();
        let mix = unit_mix();
        v.tick(&fm, &mix);
        v.force_deactivate();
        assert!(!v.is_active());
        assert_eq!(v.envelope().stage(), crate::envelope::EnvelopeStage::Off);
    }

    #[test]
    fn note_off_only_affects_matching_note() {
        let mut v = Voice::new(48_000.0);
        v.note_on(60, 0);
        v.note_off(61);
        assert_eq!(v.envelope().stage(), crate::envelope::EnvelopeStage::Attack);
        v.note_off(60);
        assert_eq!(v.envelope().stage(), crate::envelope::EnvelopeStage::Release);
    }
}
