//! Filter Module
//!
//! Type-selectable one-pole stereo filter: low-pass and high-pass share a
//! trapezoidally-integrated (TPT) one-pole section; low-shelf and
//! high-shelf share a one-pole bilinear-transform shelving section. These
//! are genuinely distinct processing structures, unified behind one
//! [`Filter`] facade that dispatches on the active [`FilterType`] and holds
//! independent per-channel state for whichever structure is active. When
//! disabled the filter is a unity pass-through. No allocations in
//! `process`.

#![allow(dead_code)]

use std::f32::consts::PI;

/// Selectable filter response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    LowShelf,
    HighShelf,
}

/// One-pole TPT low/high-pass section. A single coefficient derivation
/// (`g = tan(pi * fc / sr)`) produces both the low-pass and high-pass
/// outputs from the same integrator state; only one is read depending on
/// `FilterType`.
#[derive(Debug, Clone, Copy, Default)]
struct OnePoleTpt {
    state: f32,
}

impl OnePoleTpt {
    fn process(&mut self, input: f32, g: f32) -> (f32 /* lp */, f32 /* hp */) {
        let coeff = g / (1.0 + g);
        let v = (input - self.state) * coeff;
        let lp = v + self.state;
        self.state = lp + v;
        let hp = input - lp;
        (lp, hp)
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// One-pole bilinear-transform shelving section. Low-shelf and high-shelf
/// differ only in which two of their three coefficients invert sign.
#[derive(Debug, Clone, Copy, Default)]
struct OnePoleShelf {
    state: f32,
}

impl OnePoleShelf {
    fn process(&mut self, input: f32, g: f32, gain_linear: f32, high: bool) -> f32 {
        let a = if high { -1.0 } else { 1.0 };
        let coeff = g / (1.0 + g);
        let v = (input * a - self.state) * coeff;
        let lp = v + self.state;
        self.state = lp + v;
        let shelved = input + a * (gain_linear - 1.0) * lp;
        shelved
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// A single channel's per-type filter state.
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    tpt: OnePoleTpt,
    shelf: OnePoleShelf,
}

/// Stereo, type-selectable one-pole filter, treated as a black box in the
/// broader engine: coefficients are rederived whenever `cutoff`, `gain_db`,
/// or `sample_rate` change, and the filter is a unity pass-through when
/// disabled.
#[derive(Debug, Clone)]
pub struct Filter {
    filter_type: FilterType,
    cutoff_hz: f32,
    gain_db: f32,
    sample_rate: f32,
    enabled: bool,
    g: f32,
    gain_linear: f32,
    left: ChannelState,
    right: ChannelState,
}

impl Filter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, gain_db: f32, sample_rate: f32) -> Self {
        let mut f = Self {
            filter_type,
            cutoff_hz,
            gain_db,
            sample_rate: sample_rate.max(1.0),
            enabled: true,
            g: 0.0,
            gain_linear: 1.0,
            left: ChannelState::default(),
            right: ChannelState::default(),
        };
        f.recalculate();
        f
    }

    fn recalculate(&mut self) {
        let nyquist = self.sample_rate * 0.5 * 0.98;
        let fc = self.cutoff_hz.clamp(1.0, nyquist.max(2.0));
        self.g = (PI * fc / self.sample_rate).tan();
        self.gain_linear = 10f32.powf(self.gain_db / 20.0);
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz;
        self.recalculate();
    }

    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
        self.recalculate();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.recalculate();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&mut self) {
        self.left = ChannelState::default();
        self.right = ChannelState::default();
    }

    fn process_channel(&self, state: &mut ChannelState, input: f32) -> f32 {
        match self.filter_type {
            FilterType::LowPass => state.tpt.process(input, self.g).0,
            FilterType::HighPass => state.tpt.process(input, self.g).1,
            FilterType::LowShelf => state.shelf.process(input, self.g, self.gain_linear, false),
            FilterType::HighShelf => state.shelf.process(input, self.g, self.gain_linear, true),
        }
    }

    /// Processes one stereo sample in place. Unity pass-through when disabled.
    pub fn process_sample(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        if !self.enabled {
            return (in_l, in_r);
        }
        let mut left = self.left;
        let out_l = self.process_channel(&mut left, in_l);
        self.left = left;
        let mut right = self.right;
        let out_r = self.process_channel(&mut right, in_r);
        self.right = right;
        (out_l, out_r)
    }

    /// Processes a stereo buffer in place. No allocations.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process_sample(*l, *r);
            *l = out_l;
            *r = out_r;
        }
    }
}
