//! Sequencer Track
//!
//! One track's full generative stack: a `Pattern` of fixed-length steps, the
//! `MusicalConstraints` that keep generated notes on-scale, the
//! `MarkovChain` that picks the next scale-degree, and the
//! `EuclideanPattern` that decides which steps trigger at all. A `Track`
//! mirrors the relationship between a musician's pattern and the generative
//! rules behind it: the pattern is what plays, the rest is what produced it
//! and what regenerates it on request.

#![allow(dead_code)]

use rand::Rng;

use crate::error::EngineResult;
use crate::euclidean::EuclideanPattern;
use crate::markov::MarkovChain;
use crate::pattern::{MusicalConstraints, Pattern};

#[derive(Debug, Clone)]
pub struct Track {
    pub id: usize,
    pub name: String,
    pub pattern: Pattern,
    pub constraints: MusicalConstraints,
    pub markov: MarkovChain,
    pub euclidean: EuclideanPattern,
    pub muted: bool,
    pub solo: bool,
}

impl Track {
    pub fn new(
        length: usize,
        constraints: MusicalConstraints,
        markov: MarkovChain,
        euclidean: EuclideanPattern,
        subdivision: u32,
    ) -> Self {
        Self::with_id(0, String::new(), length, constraints, markov, euclidean, subdivision)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        id: usize,
        name: String,
        length: usize,
        constraints: MusicalConstraints,
        markov: MarkovChain,
        euclidean: EuclideanPattern,
        subdivision: u32,
    ) -> Self {
        let mut pattern = Pattern::new(length);
        pattern.subdivision = subdivision;
        Self {
            id,
            name,
            pattern,
            constraints,
            markov,
            euclidean,
            muted: false,
            solo: false,
        }
    }

    /// The track's step subdivision, stored on its `Pattern`.
    pub fn subdivision(&self) -> u32 {
        self.pattern.subdivision
    }

    /// Full regeneration: re-rolls the Euclidean trigger pattern from its
    /// current parameters, then assigns notes to every unlocked triggering
    /// step via the Markov chain.
    pub fn generate_pattern(&mut self, rng: &mut impl Rng) {
        self.euclidean.regenerate();
        self.fill_steps(rng, true);
    }

    /// Keeps the current trigger pattern but re-rolls notes for unlocked,
    /// currently active steps.
    pub fn regenerate_unlocked(&mut self, rng: &mut impl Rng) {
        self.fill_steps(rng, false);
    }

    fn fill_steps(&mut self, rng: &mut impl Rng, resolve_trigger: bool) {
        let length = self.pattern.len();
        for i in 0..length {
            let locked = self.pattern.step(i).locked;
            if locked {
                continue;
            }
            let trigger = if resolve_trigger {
                self.euclidean.triggers_at(i)
            } else {
                self.pattern.step(i).active
            };
            let step = self.pattern.step_mut(i);
            step.active = trigger;
            if trigger {
                let state = self.markov.next_state(rng);
                let note = self.constraints.note_at_index(state);
                step.midi_note = self.constraints.quantize_to_scale(note);
                step.velocity = rng.gen_range(70..=100);
                step.gate_length = rng.gen_range(0.7..=1.0);
                step.probability = rng.gen_range(0.9..=1.0);
            }
        }
    }

    /// Resizes this track's pattern, rejecting a zero-length or
    /// over-256-step request instead of silently clamping it. Intended for
    /// the control thread; the audio thread never calls this.
    pub fn try_set_pattern_length(&mut self, length: usize) -> EngineResult<()> {
        self.pattern.try_set_length(length)
    }

    /// Mutates unlocked active steps with probability `amount` (note, up to
    /// half as often velocity, and up to 0.3x as often probability).
    pub fn mutate(&mut self, amount: f32, rng: &mut impl Rng) {
        let amount = amount.clamp(0.0, 1.0);
        let length = self.pattern.len();
        for i in 0..length {
            let (locked, active) = {
                let step = self.pattern.step(i);
                (step.locked, step.active)
            };
            if locked || !active {
                continue;
            }
            if rng.gen::<f32>() < amount {
                let shift: i32 = rng.gen_range(-2..=2);
                let current = self.pattern.step(i).midi_note;
                let shifted = (current as i32 + shift).clamp(0, 127) as u8;
                let quantized = self.constraints.quantize_to_scale(shifted);
                self.pattern.step_mut(i).midi_note = quantized;
            }
            if rng.gen::<f32>() < amount * 0.5 {
                let shift: i32 = rng.gen_range(-10..=10);
                let step = self.pattern.step_mut(i);
                step.velocity = (step.velocity as i32 + shift).clamp(1, 127) as u8;
            }
            if rng.gen::<f32>() < amount * 0.3 {
                let shift: f32 = rng.gen_range(-0.1..=0.1);
                let step = self.pattern.step_mut(i);
                step.probability = (step.probability + shift).clamp(0.0, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markov::Contour;
    use crate::pattern::Scale;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_track() -> Track {
        let constraints = MusicalConstraints::new(60, Scale::NaturalMinor, -1, 1);
        let legal_count = constraints.legal_notes().len();
        let markov = MarkovChain::new(legal_count, Contour::RandomWalk { max_interval: 3 });
        let euclidean = EuclideanPattern::new(8, 3, 0);
        Track::new(8, constraints, markov, euclidean, 16)
    }

    #[test]
    fn generated_active_steps_match_euclidean_hit_count() {
        let mut track = test_track();
        let mut rng = StdRng::seed_from_u64(1);
        track.generate_pattern(&mut rng);
        let active = track.pattern.steps().iter().filter(|s| s.active).count();
        assert_eq!(active, 3);
    }

    #[test]
    fn generated_notes_are_always_on_scale() {
        let mut track = test_track();
        let mut rng = StdRng::seed_from_u64(2);
        track.generate_pattern(&mut rng);
        for step in track.pattern.steps() {
            if step.active {
                assert!(track.constraints.legal_notes().contains(&step.midi_note));
            }
        }
    }

    #[test]
    fn locked_steps_survive_regeneration() {
        let mut track = test_track();
        let mut rng = StdRng::seed_from_u64(3);
        track.generate_pattern(&mut rng);
        track.pattern.step_mut(0).locked = true;
        let locked_before = *track.pattern.step(0);
        track.generate_pattern(&mut rng);
        assert_eq!(*track.pattern.step(0), locked_before);
    }

    #[test]
    fn mutation_never_drifts_notes_off_scale() {
        let mut track = test_track();
        let mut rng = StdRng::seed_from_u64(4);
        track.generate_pattern(&mut rng);
        for _ in 0..50 {
            track.mutate(1.0, &mut rng);
        }
        for step in track.pattern.steps() {
            if step.active {
                assert!(track.constraints.legal_notes().contains(&step.midi_note));
            }
        }
    }

    #[test]
    fn zero_mutation_amount_leaves_pattern_unchanged() {
        let mut track = test_track();
        let mut rng = StdRng::seed_from_u64(5);
        track.generate_pattern(&mut rng);
        let before = track.pattern.steps().to_vec();
        track.mutate(0.0, &mut rng);
        assert_eq!(track.pattern.steps().to_vec(), before);
    }

    #[test]
    fn try_set_pattern_length_rejects_zero() {
        let mut track = test_track();
        assert!(track.try_set_pattern_length(0).is_err());
        assert_eq!(track.pattern.len(), 8);
    }

    #[test]
    fn regenerate_unlocked_preserves_trigger_positions() {
        let mut track = test_track();
        let mut rng = StdRng::seed_from_u64(6);
        track.generate_pattern(&mut rng);
        let triggers_before: Vec<bool> = track.pattern.steps().iter().map(|s| s.active).collect();
        track.regenerate_unlocked(&mut rng);
        let triggers_after: Vec<bool> = track.pattern.steps().iter().map(|s| s.active).collect();
        assert_eq!(triggers_before, triggers_after);
    }
}
