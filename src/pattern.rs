//! Pattern & Musical Constraints
//!
//! A `Pattern` is a fixed-length array of per-step parameters (trigger,
//! note, velocity, gate length, probability, lock). `MusicalConstraints`
//! narrows a track's note choices down to a closed scale over an octave
//! range and quantizes arbitrary MIDI notes onto it.

#![allow(dead_code)]

use crate::error::{EngineError, EngineResult};

/// Closed set of supported scales. `Custom` carries its own semitone
/// interval set for scales outside the built-in list.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Chromatic,
    NaturalMinor,
    HarmonicMinor,
    Phrygian,
    Locrian,
    Dorian,
    WholeTone,
    Diminished,
    PentatonicMinor,
    Custom(Vec<u8>),
}

impl Scale {
    /// Semitone offsets from the root, within one octave.
    pub fn intervals(&self) -> Vec<u8> {
        match self {
            Scale::Chromatic => vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::NaturalMinor => vec![0, 2, 3, 5, 7, 8, 10],
            Scale::HarmonicMinor => vec![0, 2, 3, 5, 7, 8, 11],
            Scale::Phrygian => vec![0, 1, 3, 5, 7, 8, 10],
            Scale::Locrian => vec![0, 1, 3, 5, 6, 8, 10],
            Scale::Dorian => vec![0, 2, 3, 5, 7, 9, 10],
            Scale::WholeTone => vec![0, 2, 4, 6, 8, 10],
            Scale::Diminished => vec![0, 2, 3, 5, 6, 8, 9, 11],
            Scale::PentatonicMinor => vec![0, 3, 5, 7, 10],
            Scale::Custom(intervals) => intervals.clone(),
        }
    }
}

/// Restricts note choices to a scale, root, and octave range.
#[derive(Debug, Clone)]
pub struct MusicalConstraints {
    pub root: u8,
    pub scale: Scale,
    pub octave_min: i32,
    pub octave_max: i32,
    legal_notes: Vec<u8>,
}

impl MusicalConstraints {
    pub fn new(root: u8, scale: Scale, octave_min: i32, octave_max: i32) -> Self {
        let mut c = Self {
            root,
            scale,
            octave_min,
            octave_max,
            legal_notes: Vec::new(),
        };
        c.rebuild_legal_notes();
        c
    }

    /// Recomputes the legal-note table. Call after changing `root`, `scale`,
    /// or the octave range.
    pub fn rebuild_legal_notes(&mut self) {
        self.legal_notes = self.get_legal_notes();
    }

    /// All MIDI notes in `[octave_min, octave_max] x 12` whose pitch class
    /// is in the active scale.
    pub fn get_legal_notes(&self) -> Vec<u8> {
        let intervals = self.scale.intervals();
        let mut notes = Vec::new();
        for octave in self.octave_min..=self.octave_max {
            let octave_root = self.root as i32 + octave * 12;
            for &interval in &intervals {
                let note = octave_root + interval as i32;
                if (0..=127).contains(&note) {
                    notes.push(note as u8);
                }
            }
        }
        notes.sort_unstable();
        notes
    }

    pub fn legal_notes(&self) -> &[u8] {
        &self.legal_notes
    }

    /// Returns the legal note with smallest `|n - legal|`, ties broken
    /// toward the lower note.
    pub fn quantize_to_scale(&self, n: u8) -> u8 {
        if self.legal_notes.is_empty() {
            return n;
        }
        *self
            .legal_notes
            .iter()
            .min_by_key(|&&legal| (legal as i32 - n as i32).abs())
            .unwrap()
    }

    /// Index of `note` within `legal_notes`, or the index of its quantized
    /// equivalent if `note` is not itself legal.
    pub fn index_of(&self, note: u8) -> usize {
        self.legal_notes
            .iter()
            .position(|&legal| legal == note)
            .unwrap_or_else(|| {
                let quantized = self.quantize_to_scale(note);
                self.legal_notes.iter().position(|&legal| legal == quantized).unwrap_or(0)
            })
    }

    pub fn note_at_index(&self, index: usize) -> u8 {
        if self.legal_notes.is_empty() {
            self.root
        } else {
            self.legal_notes[index % self.legal_notes.len()]
        }
    }
}

/// One step's parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub active: bool,
    pub locked: bool,
    pub midi_note: u8,
    pub velocity: u8,
    pub gate_length: f32,
    pub probability: f32,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            active: false,
            locked: false,
            midi_note: 60,
            velocity: 100,
            gate_length: 0.8,
            probability: 1.0,
        }
    }
}

/// A fixed-length array of steps, a rotation offset, and a subdivision.
/// Indexing is `(i + rotation) mod length`; the rotation offset is always
/// kept reduced modulo the length rather than mutating step storage, so the
/// underlying step order (and any index held across a rotation change)
/// stays stable.
#[derive(Debug, Clone)]
pub struct Pattern {
    steps: Vec<Step>,
    rotation: usize,
    pub subdivision: u32,
}

/// Inclusive bounds on a pattern's step count.
pub const MIN_PATTERN_LENGTH: usize = 1;
pub const MAX_PATTERN_LENGTH: usize = 256;

impl Pattern {
    pub fn new(length: usize) -> Self {
        Self {
            steps: vec![Step::default(); length.max(1)],
            rotation: 0,
            subdivision: 16,
        }
    }

    /// Validating constructor for control-thread callers: rejects a
    /// zero-length (or oversized) pattern instead of silently clamping it,
    /// per the data model's length invariant.
    pub fn try_new(length: usize) -> EngineResult<Self> {
        if !(MIN_PATTERN_LENGTH..=MAX_PATTERN_LENGTH).contains(&length) {
            return Err(EngineError::InvalidPatternLength(length));
        }
        Ok(Self {
            steps: vec![Step::default(); length],
            rotation: 0,
            subdivision: 16,
        })
    }

    /// Validating resize: rejects a zero-length (or oversized) request,
    /// leaving the pattern unchanged. The rotation offset is re-reduced
    /// against the new length.
    pub fn try_set_length(&mut self, length: usize) -> EngineResult<()> {
        if !(MIN_PATTERN_LENGTH..=MAX_PATTERN_LENGTH).contains(&length) {
            return Err(EngineError::InvalidPatternLength(length));
        }
        self.steps.resize(length, Step::default());
        self.rotation %= length;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// Bijective indexing: `step(i) == step((i + length) mod length)`,
    /// further offset by the pattern's rotation.
    pub fn step(&self, i: usize) -> &Step {
        let len = self.steps.len();
        &self.steps[(i + self.rotation) % len]
    }

    pub fn step_mut(&mut self, i: usize) -> &mut Step {
        let len = self.steps.len();
        let index = (i + self.rotation) % len;
        &mut self.steps[index]
    }

    pub fn set_length(&mut self, length: usize) {
        let length = length.max(1);
        self.steps.resize(length, Step::default());
        self.rotation %= length;
    }

    /// Raw step storage in construction order, unaffected by rotation. Used
    /// by callers (generation, mutation, tests) that want every step
    /// exactly once regardless of the current rotation offset.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Offsets the pattern's rotation by `amount` steps, reduced modulo the
    /// length; does not move any step storage.
    pub fn rotate(&mut self, amount: i32) {
        let len = self.steps.len() as i32;
        if len == 0 {
            return;
        }
        let new_rotation = (self.rotation as i32 + amount).rem_euclid(len);
        self.rotation = new_rotation as usize;
    }
}
