//! Loop Manager Module
//!
//! Owns every looper's sample storage (one allocation per looper, sized from
//! `max_loop_seconds * sample_rate` at construction) and sums their outputs
//! through a soft limiter before handing the result back to the synth.

#![allow(dead_code)]

use crate::looper::{Looper, LooperRequest, LooperState};

/// Above this threshold the soft limiter compresses the signal with a 1:5
/// ratio instead of passing it straight through; keeps a summed bank of
/// loopers from clipping hard when several play back at once.
const LIMITER_THRESHOLD: f32 = 0.8;
const LIMITER_RATIO: f32 = 0.2;

fn soft_limit(x: f32) -> f32 {
    let sign = x.signum();
    let mag = x.abs();
    if mag > LIMITER_THRESHOLD {
        sign * (LIMITER_THRESHOLD + (mag - LIMITER_THRESHOLD) * LIMITER_RATIO)
    } else {
        x
    }
}

/// Fixed sample storage and state machine for one looper slot.
struct LooperSlot {
    looper: Looper,
    buffer_l: Vec<f32>,
    buffer_r: Vec<f32>,
}

/// Owns `num_loopers` independent stereo loopers and mixes their output
/// through a soft limiter. The engine's only looper-facing entry point.
pub struct LoopManager {
    slots: Vec<LooperSlot>,
}

impl LoopManager {
    pub fn new(num_loopers: usize, sample_rate: f32, max_loop_seconds: f32, crossfade_seconds: f32) -> Self {
        let max_frames = (sample_rate.max(1.0) * max_loop_seconds.max(0.0)) as usize;
        let crossfade_len = (sample_rate.max(1.0) * crossfade_seconds.max(0.0)) as usize;
        let slots = (0..num_loopers)
            .map(|_| LooperSlot {
                looper: Looper::new(max_frames, crossfade_len),
                buffer_l: vec![0.0; max_frames.max(1)],
                buffer_r: vec![0.0; max_frames.max(1)],
            })
            .collect();
        Self { slots }
    }

    pub fn num_loopers(&self) -> usize {
        self.slots.len()
    }

    pub fn state(&self, index: usize) -> Option<LooperState> {
        self.slots.get(index).map(|s| s.looper.state())
    }

    pub fn request(&mut self, index: usize, request: LooperRequest) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.looper.request(request);
        }
    }

    pub fn set_overdub_wet(&mut self, index: usize, wet: f32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.looper.set_overdub_wet(wet);
        }
    }

    /// Applies every slot's pending request. Call once per block, before
    /// any `process_sample` calls for that block.
    pub fn apply_pending_requests(&mut self) {
        for slot in &mut self.slots {
            slot.looper.apply_pending_request();
        }
    }

    /// Feeds one stereo sample through every looper slot in series (each
    /// slot both records the input it is handed and adds its own playback
    /// into the running signal, so a later slot can record over an earlier
    /// slot's loop) and returns the soft-limited stereo sum.
    pub fn process_sample(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        let mut sig_l = in_l;
        let mut sig_r = in_r;
        for slot in &mut self.slots {
            let (out_l, out_r) =
                slot.looper
                    .process_sample(&mut slot.buffer_l, &mut slot.buffer_r, sig_l, sig_r);
            sig_l = out_l;
            sig_r = out_r;
        }
        (soft_limit(sig_l), soft_limit(sig_r))
    }

    /// Processes a stereo buffer in place. No allocations.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        self.apply_pending_requests();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process_sample(*l, *r);
            *l = out_l;
            *r = out_r;
        }
    }
}
