//! Engine construction-time configuration.

use crate::error::{EngineError, EngineResult};

/// Every value needed to construct a fully-wired [`crate::synth::Synth`].
///
/// Mirrors the `*Config` / `with_config` convention used by the other
/// components in this crate (oscillator, envelope, LFO, modulation
/// connections): fill in only the fields you care about and fall back to
/// [`Default`] for the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,

    /// Number of voices in the fixed-size polyphonic pool.
    pub voice_count: usize,

    /// Number of sequencer tracks.
    pub track_count: usize,

    /// Number of loopers in the [`crate::loop_manager::LoopManager`].
    pub max_loops: usize,

    /// Maximum recordable loop length, in seconds, per looper.
    pub max_loop_seconds: f32,

    /// Master output volume, linear gain.
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            voice_count: 8,
            track_count: 4,
            max_loops: 4,
            max_loop_seconds: 120.0,
            master_volume: 0.8,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration, returning the first violated constraint.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        if self.voice_count == 0 || self.voice_count > 32 {
            return Err(EngineError::InvalidVoiceCount(self.voice_count));
        }
        if self.track_count == 0 || self.track_count > 16 {
            return Err(EngineError::InvalidTrackCount(self.track_count));
        }
        if !self.max_loop_seconds.is_finite() || self.max_loop_seconds <= 0.0 {
            return Err(EngineError::InvalidMaxLoopSeconds(self.max_loop_seconds));
        }
        Ok(())
    }
}
