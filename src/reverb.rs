//! Reverb Module
//!
//! Stereo diffused-delay reverb, treated by the rest of the engine as a
//! black box: stereo in, stereo out, a handful of named parameters, and a
//! dry/wet crossfade applied internally. Every working buffer (comb delay
//! lines, allpass diffuser taps, the modulation LFO's phase) is
//! pre-allocated at construction from the declared parameter ranges; `tick`
//! never allocates.

#![allow(dead_code)]

use std::f32::consts::PI;

pub const DELAY_TIME_MIN: f32 = 0.001;
pub const DELAY_TIME_MAX: f32 = 1.45;
pub const SIZE_MIN: f32 = 0.5;
pub const SIZE_MAX: f32 = 3.0;

const NUM_COMBS: usize = 4;
const NUM_ALLPASS: usize = 2;
/// Base delay length (seconds) for each of the four comb lines at the
/// default `delay_time` (0.2s) before the `delay_time` and `size`
/// parameters scale them; spread apart to avoid metallic ringing.
const COMB_BASE_SECONDS: [f32; NUM_COMBS] = [0.0297, 0.0371, 0.0411, 0.0437];
const ALLPASS_BASE_SECONDS: [f32; NUM_ALLPASS] = [0.005, 0.0017];
/// `delay_time` value the base tunings above were chosen against; the
/// actual tap length is `base_seconds * (delay_time / DELAY_TIME_REFERENCE) * size`.
const DELAY_TIME_REFERENCE: f32 = 0.2;

/// Named reverb parameters. Every field has a declared range; out-of-range
/// writes are clamped rather than rejected, per the engine's error-handling
/// design.
#[derive(Debug, Clone, Copy)]
pub struct ReverbParams {
    /// Base delay time per tap, seconds.
    pub delay_time: f32,
    /// Room size multiplier applied to every delay line.
    pub size: f32,
    /// High-frequency damping applied in each comb's feedback path.
    pub damping: f32,
    /// Dry/wet mix, 0 = fully dry, 1 = fully wet.
    pub mix: f32,
    /// Comb feedback / decay amount.
    pub decay: f32,
    /// Allpass diffuser coefficient.
    pub diffusion: f32,
    /// Depth of the delay-line-length modulation LFO, as a fraction of one
    /// sample's worth of smear.
    pub mod_depth: f32,
    /// Frequency of the modulation LFO, Hz.
    pub mod_freq: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            delay_time: 0.2,
            size: 1.0,
            damping: 0.0,
            mix: 0.3,
            decay: 0.9,
            diffusion: 0.5,
            mod_depth: 0.1,
            mod_freq: 2.0,
        }
    }
}

impl ReverbParams {
    pub fn clamp(&mut self) {
        self.delay_time = self.delay_time.clamp(DELAY_TIME_MIN, DELAY_TIME_MAX);
        self.size = self.size.clamp(SIZE_MIN, SIZE_MAX);
        self.damping = self.damping.clamp(0.0, 0.99);
        self.mix = self.mix.clamp(0.0, 1.0);
        self.decay = self.decay.clamp(0.0, 1.0);
        self.diffusion = self.diffusion.clamp(0.0, 0.99);
        self.mod_depth = self.mod_depth.clamp(0.0, 1.0);
        self.mod_freq = self.mod_freq.clamp(0.0, 10.0);
    }
}

#[derive(Debug, Clone)]
struct Comb {
    buffer: Vec<f32>,
    write_pos: usize,
    damping_state: f32,
}

impl Comb {
    fn new(max_len: usize) -> Self {
        Self {
            buffer: vec![0.0; max_len.max(1)],
            write_pos: 0,
            damping_state: 0.0,
        }
    }

    fn process(&mut self, input: f32, len: usize, feedback: f32, damping: f32) -> f32 {
        let len = len.clamp(1, self.buffer.len());
        let read_pos = (self.write_pos + self.buffer.len() - len) % self.buffer.len();
        let delayed = self.buffer[read_pos];
        self.damping_state = delayed * (1.0 - damping) + self.damping_state * damping;
        self.buffer[self.write_pos] = input + self.damping_state * feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed
    }

    fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.damping_state = 0.0;
    }
}

#[derive(Debug, Clone)]
struct Allpass {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl Allpass {
    fn new(max_len: usize) -> Self {
        Self {
            buffer: vec![0.0; max_len.max(1)],
            write_pos: 0,
        }
    }

    fn process(&mut self, input: f32, len: usize, coeff: f32) -> f32 {
        let len = len.clamp(1, self.buffer.len());
        let read_pos = (self.write_pos + self.buffer.len() - len) % self.buffer.len();
        let delayed = self.buffer[read_pos];
        let output = -input * coeff + delayed;
        self.buffer[self.write_pos] = input + delayed * coeff;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
    }
}

/// One channel's comb bank + allpass diffuser chain.
#[derive(Debug, Clone)]
struct ReverbChannel {
    combs: [Comb; NUM_COMBS],
    allpasses: [Allpass; NUM_ALLPASS],
}

impl ReverbChannel {
    fn new(sample_rate: f32) -> Self {
        let max_delay_scale = DELAY_TIME_MAX / DELAY_TIME_REFERENCE;
        let max_comb_base = COMB_BASE_SECONDS.iter().cloned().fold(0.0f32, f32::max);
        let max_allpass_base = ALLPASS_BASE_SECONDS.iter().cloned().fold(0.0f32, f32::max);
        let comb_max = (sample_rate * max_comb_base * max_delay_scale * SIZE_MAX).ceil() as usize + 16;
        let ap_max = (sample_rate * max_allpass_base * max_delay_scale * SIZE_MAX).ceil() as usize + 16;
        Self {
            combs: std::array::from_fn(|_| Comb::new(comb_max)),
            allpasses: std::array::from_fn(|_| Allpass::new(ap_max)),
        }
    }

    fn process(&mut self, input: f32, sample_rate: f32, params: &ReverbParams, mod_lfo: f32) -> f32 {
        let delay_scale = params.delay_time / DELAY_TIME_REFERENCE;

        let mut sum = 0.0;
        for (i, comb) in self.combs.iter_mut().enumerate() {
            let base_len = (COMB_BASE_SECONDS[i] * delay_scale * params.size * sample_rate) as usize;
            let smear = (mod_lfo * params.mod_depth * sample_rate * 0.002) as isize;
            let len = (base_len as isize + smear).max(1) as usize;
            sum += comb.process(input, len, params.decay, params.damping);
        }
        sum /= NUM_COMBS as f32;

        for (i, ap) in self.allpasses.iter_mut().enumerate() {
            let len = (ALLPASS_BASE_SECONDS[i] * delay_scale * params.size * sample_rate) as usize;
            sum = ap.process(sum, len, params.diffusion);
        }
        sum
    }

    fn clear(&mut self) {
        for c in &mut self.combs {
            c.clear();
        }
        for a in &mut self.allpasses {
            a.clear();
        }
    }
}

/// Stereo reverb processor. Treated as a black box by the rest of the
/// engine: named parameters in, stereo samples in/out.
#[derive(Debug, Clone)]
pub struct Reverb {
    params: ReverbParams,
    sample_rate: f32,
    enabled: bool,
    left: ReverbChannel,
    right: ReverbChannel,
    mod_phase: f32,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, ReverbParams::default())
    }

    pub fn with_params(sample_rate: f32, mut params: ReverbParams) -> Self {
        params.clamp();
        let sample_rate = sample_rate.max(1.0);
        Self {
            params,
            sample_rate,
            enabled: true,
            left: ReverbChannel::new(sample_rate),
            right: ReverbChannel::new(sample_rate),
            mod_phase: 0.0,
        }
    }

    pub fn set_params(&mut self, mut params: ReverbParams) {
        params.clamp();
        self.params = params;
    }

    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.mod_phase = 0.0;
    }

    /// Processes one stereo sample. Unity pass-through when disabled.
    pub fn process_sample(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        if !self.enabled {
            return (in_l, in_r);
        }

        let lfo = (2.0 * PI * self.mod_phase).sin();
        self.mod_phase += self.params.mod_freq / self.sample_rate;
        if self.mod_phase >= 1.0 {
            self.mod_phase -= 1.0;
        }

        let wet_l = self.left.process(in_l, self.sample_rate, &self.params, lfo);
        let wet_r = self.right.process(in_r, self.sample_rate, &self.params, lfo);

        let mix = self.params.mix;
        (
            in_l * (1.0 - mix) + wet_l * mix,
            in_r * (1.0 - mix) + wet_r * mix,
        )
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_reverb_is_unity_passthrough() {
        let mut r = Reverb::new(48_000.0);
        r.set_enabled(false);
        assert_eq!(r.process_sample(0.5, -0.25), (0.5, -0.25));
    }

    #[test]
    fn zero_mix_leaves_signal_mostly_dry() {
        let mut params = ReverbParams::default();
        params.mix = 0.0;
        let mut r = Reverb::with_params(48_000.0, params);
        let (out_l, _) = r.process_sample(1.0, 1.0);
        assert_eq!(out_l, 1.0);
    }

    #[test]
    fn impulse_produces_finite_tail() {
        let mut r = Reverb::new(48_000.0);
        let (mut l, mut rr) = r.process_sample(1.0, 1.0);
        assert!(l.is_finite() && rr.is_finite());
        for _ in 0..10_000 {
            let (a, b) = r.process_sample(0.0, 0.0);
            assert!(a.is_finite() && b.is_finite());
            l = a;
            rr = b;
        }
        let _ = (l, rr);
    }

    #[test]
    fn decay_near_one_stays_bounded() {
        let mut params = ReverbParams::default();
        params.decay = 1.0;
        params.mix = 1.0;
        let mut r = Reverb::with_params(48_000.0, params);
        let mut peak = 0.0f32;
        for i in 0..48_000 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let (l, _) = r.process_sample(input, input);
            peak = peak.max(l.abs());
        }
        assert!(peak.is_finite());
        assert!(peak < 10.0);
    }

    #[test]
    fn delay_time_changes_reverb_tap_positions() {
        let mut short = ReverbParams::default();
        short.delay_time = 0.05;
        short.mix = 1.0;
        let mut long = ReverbParams::default();
        long.delay_time = 1.0;
        long.mix = 1.0;

        let mut r_short = Reverb::with_params(48_000.0, short);
        let mut r_long = Reverb::with_params(48_000.0, long);

        let mut short_out = Vec::with_capacity(4_096);
        let mut long_out = Vec::with_capacity(4_096);
        for i in 0..4_096 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            short_out.push(r_short.process_sample(input, input).0);
            long_out.push(r_long.process_sample(input, input).0);
        }
        assert_ne!(short_out, long_out, "delay_time must change the reverb's tap timing");
    }

    #[test]
    fn params_are_clamped() {
        let mut params = ReverbParams::default();
        params.mix = 5.0;
        params.delay_time = -1.0;
        params.clamp();
        assert_eq!(params.mix, 1.0);
        assert_eq!(params.delay_time, DELAY_TIME_MIN);
    }
}
