//! Error types for the synthesis core.
//!
//! Per the error handling design, the audio thread itself never returns a
//! `Result` — every condition reachable from the per-block/per-sample path
//! degrades in place (dropped note, clamped parameter, inactive mod slot).
//! `EngineError` only covers the fallible, non-audio-thread-facing
//! operations: construction and the handful of UI/control-thread mutators
//! that can be asked for something structurally invalid.

use thiserror::Error;

/// Errors produced by the control-thread-facing API of the engine.
///
/// Nothing on the audio callback's hot path returns this type; see the
/// module documentation for the reasoning.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The requested sample rate is not usable (must be finite and positive).
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    /// The requested voice pool size is outside the supported range.
    #[error("invalid voice count: {0} (must be 1..=32)")]
    InvalidVoiceCount(usize),

    /// The requested track count is outside the supported range.
    #[error("invalid track count: {0} (must be 1..=16)")]
    InvalidTrackCount(usize),

    /// A pattern length request fell outside the supported range.
    #[error("invalid pattern length: {0} (must be 1..=256)")]
    InvalidPatternLength(usize),

    /// A track index was out of bounds for the current sequencer.
    #[error("track index {0} out of bounds (have {1} tracks)")]
    TrackIndexOutOfBounds(usize, usize),

    /// A loop index was out of bounds for the current loop manager.
    #[error("loop index {0} out of bounds (have {1} loops)")]
    LoopIndexOutOfBounds(usize, usize),

    /// A modulation slot index was out of bounds for the fixed-size table.
    #[error("modulation slot index {0} out of bounds (have {1} slots)")]
    ModSlotIndexOutOfBounds(usize, usize),

    /// A requested maximum loop duration could not be represented.
    #[error("invalid max loop seconds: {0}")]
    InvalidMaxLoopSeconds(f32),
}

pub type EngineResult<T> = Result<T, EngineError>;
