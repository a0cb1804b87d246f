//! Markov Chain Pitch Generator
//!
//! A first-order Markov chain over a fixed set of states (legal scale-degree
//! indices, supplied by the caller). The transition matrix is not hand
//! authored; it is built from one of a handful of melodic contour presets,
//! then sampled one step at a time. Reinforcement and decay let a running
//! performance nudge the matrix toward whatever the player keeps choosing,
//! without ever needing to renormalize by hand at the call site.

#![allow(dead_code)]

use rand::Rng;

/// Melodic contour presets used to seed the transition matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contour {
    /// Mostly holds the current state.
    Drone,
    /// Wanders freely within `max_interval` states.
    RandomWalk { max_interval: usize },
    Ascending,
    Descending,
    /// Drifts locally near `gravity`, pulled back toward it from afar.
    Orbiting { gravity: usize },
}

/// A weighted first-order Markov chain over `num_states` integer states.
#[derive(Debug, Clone)]
pub struct MarkovChain {
    num_states: usize,
    matrix: Vec<Vec<f32>>,
    current_state: usize,
    last_transition: Option<(usize, usize)>,
}

impl MarkovChain {
    /// Builds a chain with `num_states` states, matrix seeded from `contour`.
    pub fn new(num_states: usize, contour: Contour) -> Self {
        let mut chain = Self {
            num_states: num_states.max(1),
            matrix: vec![vec![0.0; num_states.max(1)]; num_states.max(1)],
            current_state: 0,
            last_transition: None,
        };
        chain.apply_contour(contour);
        chain
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn current_state(&self) -> usize {
        self.current_state
    }

    pub fn set_current_state(&mut self, state: usize) {
        self.current_state = state.min(self.num_states - 1);
    }

    /// Rebuilds every row's weights from the given contour preset.
    pub fn apply_contour(&mut self, contour: Contour) {
        for i in 0..self.num_states {
            self.matrix[i] = Self::contour_row(i, self.num_states, contour);
        }
    }

    fn contour_row(i: usize, n: usize, contour: Contour) -> Vec<f32> {
        let mut row = vec![0.0; n];
        let clamp_index = |idx: isize| -> usize { idx.clamp(0, n as isize - 1) as usize };

        match contour {
            Contour::Drone => {
                row[i] += 0.8;
                for step in 1..=3isize {
                    let up = clamp_index(i as isize + step);
                    let down = clamp_index(i as isize - step);
                    row[up] += 0.2 / 6.0;
                    row[down] += 0.2 / 6.0;
                }
            }
            Contour::RandomWalk { max_interval } => {
                let max_interval = max_interval.min(3).max(1) as isize;
                for step in -max_interval..=max_interval {
                    let idx = clamp_index(i as isize + step);
                    row[idx] += 1.0;
                }
            }
            Contour::Ascending => {
                row[i] += 0.3;
                for step in 1..=3isize {
                    let up = clamp_index(i as isize + step);
                    row[up] += 0.7 / 3.0;
                }
            }
            Contour::Descending => {
                row[i] += 0.3;
                for step in 1..=3isize {
                    let down = clamp_index(i as isize - step);
                    row[down] += 0.7 / 3.0;
                }
            }
            Contour::Orbiting { gravity } => {
                let distance = (i as isize - gravity as isize).abs();
                if distance <= 2 {
                    let up = clamp_index(i as isize + 1);
                    let down = clamp_index(i as isize - 1);
                    row[up] += 0.5;
                    row[down] += 0.5;
                } else {
                    let toward = if (i as isize) < gravity as isize {
                        clamp_index(i as isize + 1)
                    } else {
                        clamp_index(i as isize - 1)
                    };
                    row[toward] += 0.6;
                    row[i] += 0.4;
                }
            }
        }

        Self::normalize(&mut row);
        row
    }

    fn normalize(row: &mut [f32]) {
        let sum: f32 = row.iter().sum();
        if sum > 1e-9 {
            for w in row.iter_mut() {
                *w /= sum;
            }
        } else {
            let uniform = 1.0 / row.len() as f32;
            for w in row.iter_mut() {
                *w = uniform;
            }
        }
    }

    /// Samples the next state from the current state's row, advances
    /// `current_state` to it, and returns it.
    pub fn next_state(&mut self, rng: &mut impl Rng) -> usize {
        let row = &self.matrix[self.current_state];
        let mut target = rng.gen::<f32>();
        let mut chosen = row.len() - 1;
        for (idx, weight) in row.iter().enumerate() {
            if target < *weight {
                chosen = idx;
                break;
            }
            target -= weight;
        }
        self.last_transition = Some((self.current_state, chosen));
        self.current_state = chosen;
        chosen
    }

    /// Increases the weight of the most recently sampled transition by
    /// `amount`, then renormalizes that row.
    pub fn reinforce_last_transition(&mut self, amount: f32) {
        if let Some((from, to)) = self.last_transition {
            self.matrix[from][to] += amount.max(0.0);
            Self::normalize(&mut self.matrix[from]);
        }
    }

    /// Decays every transition weight except the most recently sampled one
    /// by `rate`, then renormalizes every affected row.
    pub fn decay_unused_transitions(&mut self, rate: f32) {
        let rate = rate.clamp(0.0, 1.0);
        for (r, row) in self.matrix.iter_mut().enumerate() {
            let mut touched = false;
            for (c, weight) in row.iter_mut().enumerate() {
                if self.last_transition == Some((r, c)) {
                    continue;
                }
                *weight *= 1.0 - rate;
                touched = true;
            }
            if touched {
                Self::normalize(row);
            }
        }
    }

    /// Row sums, for the "rows sum to 1 +/- epsilon" invariant.
    pub fn row_sums(&self) -> Vec<f32> {
        self.matrix.iter().map(|row| row.iter().sum()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rows_sum_to_one_for_every_contour() {
        let contours = [
            Contour::Drone,
            Contour::RandomWalk { max_interval: 3 },
            Contour::Ascending,
            Contour::Descending,
            Contour::Orbiting { gravity: 4 },
        ];
        for contour in contours {
            let chain = MarkovChain::new(12, contour);
            for sum in chain.row_sums() {
                assert!((sum - 1.0).abs() < 1e-6, "{:?} row sum {}", contour, sum);
            }
        }
    }

    #[test]
    fn drone_mostly_stays_on_current_state() {
        let mut chain = MarkovChain::new(12, Contour::Drone);
        chain.set_current_state(5);
        let mut rng = StdRng::seed_from_u64(42);
        let mut stayed = 0;
        for _ in 0..1000 {
            chain.set_current_state(5);
            if chain.next_state(&mut rng) == 5 {
                stayed += 1;
            }
        }
        assert!(stayed as f32 / 1000.0 > 0.6);
    }

    #[test]
    fn ascending_drifts_upward_over_many_steps() {
        let mut chain = MarkovChain::new(20, Contour::Ascending);
        chain.set_current_state(0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            chain.next_state(&mut rng);
        }
        assert!(chain.current_state() > 10);
    }

    #[test]
    fn orbiting_stays_near_gravity() {
        let mut chain = MarkovChain::new(20, Contour::Orbiting { gravity: 10 });
        chain.set_current_state(0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            chain.next_state(&mut rng);
        }
        assert!((chain.current_state() as isize - 10).abs() <= 4);
    }

    #[test]
    fn reinforce_increases_weight_of_last_transition() {
        let mut chain = MarkovChain::new(8, Contour::RandomWalk { max_interval: 3 });
        chain.set_current_state(2);
        let mut rng = StdRng::seed_from_u64(1);
        let next = chain.next_state(&mut rng);
        let before = chain.matrix[2][next];
        chain.reinforce_last_transition(0.5);
        let after = chain.matrix[2][next];
        assert!(after > before);
        assert!((chain.row_sums()[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn decay_preserves_row_normalization() {
        let mut chain = MarkovChain::new(8, Contour::RandomWalk { max_interval: 3 });
        chain.set_current_state(2);
        let mut rng = StdRng::seed_from_u64(9);
        chain.next_state(&mut rng);
        chain.decay_unused_transitions(0.2);
        for sum in chain.row_sums() {
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }
}
