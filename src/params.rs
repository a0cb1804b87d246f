//! Atomic parameter store shared between the UI/control thread and the
//! audio thread.
//!
//! Continuous parameters are stored as relaxed-ordering atomics (readers and
//! writers never synchronize beyond that) and smoothed on the audio thread
//! through a one-pole low-pass with a ~10 ms time constant, so a UI knob
//! twist never zippers. Discrete parameters (filter type, waveform shape,
//! reverb enable) are switched atomically at block boundaries and are not
//! smoothed — there is nothing to smooth between two enum values.
//!
//! This is the "atomic parameter store" referenced by the persistence
//! section of the spec: preset file I/O is an external collaborator that
//! reads and writes through this store, never through its own state.

use std::sync::atomic::{AtomicU32, Ordering};

/// A single smoothed continuous parameter.
///
/// Stores the raw (target) value as an atomic `f32` bit pattern so the UI
/// thread can write it without locking, and keeps a one-pole smoother
/// private to the audio thread that chases the target once per block.
#[derive(Debug)]
pub struct SmoothedParam {
    target: AtomicU32,
    current: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// Creates a parameter smoothed with the given time constant (seconds)
    /// at the given block rate (blocks per second = sample_rate / block_size).
    pub fn new(initial: f32, time_constant_secs: f32, blocks_per_second: f32) -> Self {
        let coeff = if blocks_per_second <= 0.0 {
            0.0
        } else {
            (-1.0 / (time_constant_secs.max(1e-6) * blocks_per_second)).exp()
        };
        Self {
            target: AtomicU32::new(initial.to_bits()),
            current: initial,
            coeff,
        }
    }

    /// Writes a new target value from any thread.
    pub fn set(&self, value: f32) {
        self.target.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Reads the raw (unsmoothed) target value.
    pub fn target(&self) -> f32 {
        f32::from_bits(self.target.load(Ordering::Relaxed))
    }

    /// Advances the smoother by one block and returns the smoothed value.
    /// Call exactly once per block from the audio thread.
    pub fn advance_block(&mut self) -> f32 {
        let target = self.target();
        self.current = target + (self.current - target) * self.coeff;
        self.current
    }

    /// Returns the last smoothed value without advancing.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Snaps the smoother directly to its target, bypassing the ramp.
    /// Used at construction and after a hard reset.
    pub fn snap(&mut self) {
        self.current = self.target();
    }
}

/// A discrete parameter switched atomically at block boundaries: no
/// smoothing, just a relaxed-ordering load/store of a small integer code.
#[derive(Debug)]
pub struct DiscreteParam {
    code: AtomicU32,
}

impl DiscreteParam {
    pub fn new(initial: u32) -> Self {
        Self {
            code: AtomicU32::new(initial),
        }
    }

    pub fn set(&self, code: u32) {
        self.code.store(code, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.code.load(Ordering::Relaxed)
    }
}

/// Named continuous parameters carried by the store.
///
/// Not every parameter the engine exposes needs to live here — only those
/// that are written from the control thread and read on the audio thread,
/// which is where zipper noise and torn reads are a real risk.
#[derive(Debug)]
pub struct ParamStore {
    pub master_volume: SmoothedParam,
    pub filter_cutoff: SmoothedParam,
    pub filter_resonance: SmoothedParam,
    pub filter_gain_db: SmoothedParam,
    pub reverb_mix: SmoothedParam,
    pub reverb_size: SmoothedParam,
    pub filter_type: DiscreteParam,
    pub reverb_enabled: DiscreteParam,
}

const SMOOTH_TIME_CONSTANT_SECS: f32 = 0.010;

impl ParamStore {
    pub fn new(blocks_per_second: f32) -> Self {
        let smoothed = |v: f32| SmoothedParam::new(v, SMOOTH_TIME_CONSTANT_SECS, blocks_per_second);
        Self {
            master_volume: smoothed(0.8),
            filter_cutoff: smoothed(8_000.0),
            filter_resonance: smoothed(0.0),
            filter_gain_db: smoothed(0.0),
            reverb_mix: smoothed(0.3),
            reverb_size: smoothed(1.0),
            filter_type: DiscreteParam::new(0),
            reverb_enabled: DiscreteParam::new(0),
        }
    }

    /// Advances every smoothed parameter by one block. Call once per block,
    /// before consulting any of their `current()` values for this block.
    pub fn advance_block(&mut self) {
        self.master_volume.advance_block();
        self.filter_cutoff.advance_block();
        self.filter_resonance.advance_block();
        self.filter_gain_db.advance_block();
        self.reverb_mix.advance_block();
        self.reverb_size.advance_block();
    }
}

/// Maps a MIDI CC value (0..127) onto a parameter's declared range.
///
/// Linear parameters interpolate directly; parameters declared logarithmic
/// map 0 to `min` and 127 to `max` geometrically (equal ratios per step),
/// which matches how frequency- and time-like parameters are perceived.
pub fn map_cc_value(cc_value: u8, min: f32, max: f32, logarithmic: bool) -> f32 {
    let t = (cc_value.min(127) as f32) / 127.0;
    if logarithmic && min > 0.0 && max > 0.0 {
        min * (max / min).powf(t)
    } else {
        min + (max - min) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_param_converges_to_target() {
        let mut p = SmoothedParam::new(0.0, 0.010, 100.0);
        p.set(1.0);
        for _ in 0..500 {
            p.advance_block();
        }
        assert!((p.current() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn smoothed_param_does_not_jump_instantly() {
        let mut p = SmoothedParam::new(0.0, 0.010, 100.0);
        p.set(1.0);
        let first = p.advance_block();
        assert!(first < 1.0);
        assert!(first > 0.0);
    }

    #[test]
    fn snap_bypasses_ramp() {
        let mut p = SmoothedParam::new(0.0, 0.010, 100.0);
        p.set(1.0);
        p.snap();
        assert_eq!(p.current(), 1.0);
    }

    #[test]
    fn discrete_param_round_trips() {
        let p = DiscreteParam::new(0);
        p.set(3);
        assert_eq!(p.get(), 3);
    }

    #[test]
    fn cc_linear_mapping_spans_range() {
        assert_eq!(map_cc_value(0, 20.0, 20_000.0, false), 20.0);
        assert!((map_cc_value(127, 20.0, 20_000.0, false) - 20_000.0).abs() < 0.01);
    }

    #[test]
    fn cc_logarithmic_mapping_spans_range() {
        let lo = map_cc_value(0, 20.0, 20_000.0, true);
        let hi = map_cc_value(127, 20.0, 20_000.0, true);
        assert!((lo - 20.0).abs() < 0.01);
        assert!((hi - 20_000.0).abs() < 1.0);
        let mid = map_cc_value(64, 20.0, 20_000.0, true);
        // geometric midpoint sits well below the arithmetic midpoint
        assert!(mid < 10_010.0);
    }
}
