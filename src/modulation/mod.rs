//! Modulation Module
//!
//! This module provides modulation routing capabilities for the synthesizer.
//! It includes the fixed-slot modulation matrix and MIDI CC mapping.
//!
//! # Architecture
//!
//! - `ModMatrix` - 16 fixed slots, each routing one source to one
//!   destination through a curve, polarity, and amount.
//! - `ModSource` / `ModDestination` - the closed sets of routable
//!   modulators and modulation targets.
//! - `MidiCCManager` - unified parameter-ID to CC-number routing table with
//!   CC-learn support and a timeout that clears an abandoned learn.
//!
//! # Usage
//!
//! ```rust
//! use brainwave_core::modulation::{ModMatrix, ModSource, ModDestination};
//!
//! let matrix = ModMatrix::with_default_track_wiring();
//! ```

pub mod mod_matrix;

pub use mod_matrix::{
    Curve, LfoParam, ModDestination, ModDestinationValues, ModMatrix, ModSlot, ModSource,
    ModSourceValues, OscParam, Polarity, NUM_ENVELOPES, NUM_LFOS, NUM_OSCILLATORS, NUM_SLOTS,
    NUM_TRACKS,
};

pub mod midi_cc;

pub use midi_cc::{MidiCCManager, ParamId, CC_LEARN_TIMEOUT_MS, MAX_CC_COUNT};
