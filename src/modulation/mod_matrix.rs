//! Modulation Matrix
//!
//! A fixed-size table of 16 slots connecting modulation sources (LFOs,
//! envelopes, performance controls, the clock) to synthesis destinations
//! (oscillator parameters, filter, reverb, per-track phase drivers, LFO
//! parameters). Evaluated once per audio block; the audio thread reads the
//! resulting destination values until the next evaluation.

#![allow(dead_code)]

use std::f32::consts::PI;

pub const NUM_SLOTS: usize = 16;
pub const NUM_OSCILLATORS: usize = 4;
pub const NUM_LFOS: usize = 4;
pub const NUM_ENVELOPES: usize = 4;
pub const NUM_TRACKS: usize = 4;

/// A modulation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModSource {
    Lfo(usize),
    Envelope(usize),
    Velocity,
    Aftertouch,
    ModWheel,
    PitchBend,
    ClockPhase,
}

/// Per-oscillator destination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscParam {
    Pitch,
    Morph,
    Duty,
    Ratio,
    Offset,
    Level,
    Amp,
}

/// Per-LFO destination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoParam {
    Rate,
    Morph,
    Duty,
}

/// A modulation destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModDestination {
    Oscillator { index: usize, param: OscParam },
    FilterCutoff,
    FilterResonance,
    ReverbMix,
    ReverbSize,
    TrackPhase(usize),
    Lfo { index: usize, param: LfoParam },
}

/// Shaping curve applied to the (polarity-remapped) source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Exponential,
    Logarithmic,
    SCurve,
}

impl Curve {
    fn apply(&self, x: f32) -> f32 {
        match self {
            Curve::Linear => x,
            Curve::Exponential => x.signum() * x * x,
            Curve::Logarithmic => x.signum() * x.abs().sqrt(),
            Curve::SCurve => 0.5 * (1.0 - (PI * (x * 0.5 + 0.5)).cos()) * 2.0 - 1.0,
        }
    }
}

impl Default for Curve {
    fn default() -> Self {
        Curve::Linear
    }
}

/// Whether a slot's source is remapped into `[0,1]` before curving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Unidirectional,
    Bidirectional,
}

impl Default for Polarity {
    fn default() -> Self {
        Polarity::Bidirectional
    }
}

/// One slot's configuration. A slot is "complete" (contributes to the
/// evaluation) only when both `source` and `destination` are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModSlot {
    pub source: Option<ModSource>,
    pub destination: Option<ModDestination>,
    pub curve: Curve,
    pub polarity: Polarity,
    /// Depth in `[-99,99]`; the evaluated contribution is scaled by
    /// `amount/99`.
    pub amount: i8,
}

impl ModSlot {
    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.destination.is_some()
    }
}

/// Raw values for every modulation source, sampled once per block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModSourceValues {
    pub lfos: [f32; NUM_LFOS],
    pub envelopes: [f32; NUM_ENVELOPES],
    pub velocity: f32,
    pub aftertouch: f32,
    pub mod_wheel: f32,
    pub pitch_bend: f32,
    pub clock_phase: f32,
}

/// Accumulated per-destination values, read by the audio thread until the
/// next evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModDestinationValues {
    pub osc_pitch: [f32; NUM_OSCILLATORS],
    pub osc_morph: [f32; NUM_OSCILLATORS],
    pub osc_duty: [f32; NUM_OSCILLATORS],
    pub osc_ratio: [f32; NUM_OSCILLATORS],
    pub osc_offset: [f32; NUM_OSCILLATORS],
    pub osc_level: [f32; NUM_OSCILLATORS],
    pub osc_amp: [f32; NUM_OSCILLATORS],
    pub filter_cutoff: f32,
    pub filter_resonance: f32,
    pub reverb_mix: f32,
    pub reverb_size: f32,
    pub track_phase: [f32; NUM_TRACKS],
    pub lfo_rate: [f32; NUM_LFOS],
    pub lfo_morph: [f32; NUM_LFOS],
    pub lfo_duty: [f32; NUM_LFOS],
}

/// Fixed-size 16-slot modulation matrix.
#[derive(Debug, Clone)]
pub struct ModMatrix {
    slots: [ModSlot; NUM_SLOTS],
}

impl Default for ModMatrix {
    fn default() -> Self {
        Self {
            slots: [ModSlot::default(); NUM_SLOTS],
        }
    }
}

impl ModMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matrix with slots 9-12 (1-indexed) wired `Clock -> TrackPhase[i]`
    /// for i in 0..4. This is an explicit opt-in, not the engine's default:
    /// `Synth` starts every track unwired, so `Sequencer::process_block`'s
    /// clock-driven `new_step mod pattern_length` path (one step per
    /// subdivision) is what runs unless a caller wires a `TrackPhase` slot
    /// itself. Note that `ClockPhase` ramps 0->1 *within* one subdivision
    /// step, so wiring it here makes a track scan its whole pattern on every
    /// single subdivision rather than advancing one step at a time -- useful
    /// for a deliberate scanning effect, not a drop-in replacement for the
    /// clock-driven default.
    pub fn with_default_track_wiring() -> Self {
        let mut matrix = Self::default();
        for i in 0..NUM_TRACKS {
            matrix.slots[8 + i] = ModSlot {
                source: Some(ModSource::ClockPhase),
                destination: Some(ModDestination::TrackPhase(i)),
                curve: Curve::Linear,
                polarity: Polarity::Unidirectional,
                amount: 99,
            };
        }
        matrix
    }

    pub fn slot(&self, index: usize) -> &ModSlot {
        &self.slots[index]
    }

    pub fn set_slot(&mut self, index: usize, slot: ModSlot) {
        if index < NUM_SLOTS {
            self.slots[index] = slot;
        }
    }

    pub fn clear_slot(&mut self, index: usize) {
        if index < NUM_SLOTS {
            self.slots[index] = ModSlot::default();
        }
    }

    /// True if any complete slot targets `TrackPhase(index)`, i.e. that
    /// track's step resolution is modulation-driven this block rather than
    /// clock-driven.
    pub fn drives_track_phase(&self, index: usize) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.is_complete() && slot.destination == Some(ModDestination::TrackPhase(index)))
    }

    fn source_value(source: ModSource, values: &ModSourceValues) -> f32 {
        match source {
            ModSource::Lfo(i) => values.lfos.get(i).copied().unwrap_or(0.0),
            ModSource::Envelope(i) => values.envelopes.get(i).copied().unwrap_or(0.0),
            ModSource::Velocity => values.velocity,
            ModSource::Aftertouch => values.aftertouch,
            ModSource::ModWheel => values.mod_wheel,
            ModSource::PitchBend => values.pitch_bend,
            ModSource::ClockPhase => values.clock_phase,
        }
    }

    fn accumulate(dest: &mut ModDestinationValues, destination: ModDestination, value: f32) {
        match destination {
            ModDestination::Oscillator { index, param } => {
                if index >= NUM_OSCILLATORS {
                    return;
                }
                let field = match param {
                    OscParam::Pitch => &mut dest.osc_pitch[index],
                    OscParam::Morph => &mut dest.osc_morph[index],
                    OscParam::Duty => &mut dest.osc_duty[index],
                    OscParam::Ratio => &mut dest.osc_ratio[index],
                    OscParam::Offset => &mut dest.osc_offset[index],
                    OscParam::Level => &mut dest.osc_level[index],
                    OscParam::Amp => &mut dest.osc_amp[index],
                };
                *field += value;
            }
            ModDestination::FilterCutoff => dest.filter_cutoff += value,
            ModDestination::FilterResonance => dest.filter_resonance += value,
            ModDestination::ReverbMix => dest.reverb_mix += value,
            ModDestination::ReverbSize => dest.reverb_size += value,
            ModDestination::TrackPhase(i) => {
                if i < NUM_TRACKS {
                    dest.track_phase[i] += value;
                }
            }
            ModDestination::Lfo { index, param } => {
                if index >= NUM_LFOS {
                    return;
                }
                let field = match param {
                    LfoParam::Rate => &mut dest.lfo_rate[index],
                    LfoParam::Morph => &mut dest.lfo_morph[index],
                    LfoParam::Duty => &mut dest.lfo_duty[index],
                };
                *field += value;
            }
        }
    }

    /// Evaluates every complete slot once, returning the accumulated
    /// per-destination values for this block.
    pub fn evaluate(&self, source_values: &ModSourceValues) -> ModDestinationValues {
        let mut dest = ModDestinationValues::default();
        for slot in &self.slots {
            if !slot.is_complete() {
                continue;
            }
            let raw = Self::source_value(slot.source.unwrap(), source_values);
            let polarized = match slot.polarity {
                Polarity::Unidirectional => (raw + 1.0) * 0.5,
                Polarity::Bidirectional => raw,
            };
            let curved = slot.curve.apply(polarized);
            let scaled = curved * (slot.amount as f32 / 99.0);
            Self::accumulate(&mut dest, slot.destination.unwrap(), scaled);
        }
        dest
    }
}
