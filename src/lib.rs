//! BRAINWAVE-CORE - Polyphonic Virtual-Analog Synthesis Core
//!
//! The real-time audio engine for a polyphonic virtual-analog synthesizer:
//! four cross-patchable oscillators and one bendable ADSR envelope per
//! voice, a 16-slot modulation matrix, a generative sequencer (Euclidean
//! rhythms driving a Markov-chosen melody over four tracks), a one-pole
//! filter and Schroeder-style reverb on the master bus, and a bank of
//! overdubbing stereo loopers. [`Synth`] is the single entry point that
//! owns and drives every other module.
//!
//! # Architecture
//!
//! - **Voice** (`voice`, `oscillator`, `envelope`, `fm_matrix`): one voice
//!   is four oscillators cross-patched through a shared FM depth matrix and
//!   gated by one envelope. The engine owns a fixed pool of voices and
//!   steals the least-committed one when the pool is exhausted.
//! - **Modulation** (`modulation`): a fixed 16-slot matrix routes LFOs,
//!   envelopes, and performance controls onto oscillator, filter, reverb,
//!   and sequencer-phase destinations, plus MIDI CC learn/routing.
//! - **Sequencer** (`sequencer`, `track`, `pattern`, `euclidean`, `markov`,
//!   `clock`): a shared musical clock drives per-track Euclidean rhythms
//!   whose notes are chosen by weighted Markov chains over a scale.
//! - **Bus effects** (`filter`, `reverb`): a shared one-pole filter and a
//!   diffuse stereo reverb process the summed voice output.
//! - **Looper bank** (`looper`, `loop_manager`): independent overdubbing
//!   stereo loopers chained in series after the bus effects.
//! - **Ambient** (`params`, `config`, `error`, `midi`): atomic smoothed
//!   parameters shared with a control thread, engine configuration and
//!   validation, and a lock-free MIDI event queue.
//!
//! # Example
//!
//! ```rust
//! use brainwave_core::Synth;
//!
//! let mut synth = Synth::new(48_000.0).unwrap();
//! synth.note_on(60, 127); // MIDI note 60 (C4) with velocity 127
//! let mut rng = rand::thread_rng();
//! let mut left = vec![0.0f32; 128];
//! let mut right = vec![0.0f32; 128];
//! synth.process_block(&mut left, &mut right, &mut rng);
//! ```

pub mod clock;
pub mod config;
pub mod envelope;
pub mod error;
pub mod euclidean;
pub mod filter;
pub mod fm_matrix;
pub mod lfo;
pub mod loop_manager;
pub mod looper;
pub mod markov;
pub mod midi;
pub mod modulation;
pub mod oscillator;
pub mod params;
pub mod pattern;
pub mod reverb;
pub mod sequencer;
pub mod synth;
pub mod track;
pub mod voice;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use synth::Synth;
