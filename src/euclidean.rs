//! Euclidean Rhythm Generator
//!
//! Bjorklund's algorithm: distributes `hits` pulses as evenly as possible
//! among `steps` slots by repeatedly concatenating groups until the
//! remainder group can no longer be split. Produces the canonical
//! "as-even-as-possible" rhythms (E(3,8) = Tresillo = `10010010`) that show
//! up throughout world rhythm traditions.

#![allow(dead_code)]

/// Distributes `hits` true values among `steps` slots via Bjorklund's
/// algorithm. `hits` is clamped to `[0, steps]`.
pub fn bjorklund(steps: usize, hits: usize) -> Vec<bool> {
    let hits = hits.min(steps);
    if steps == 0 {
        return Vec::new();
    }
    if hits == 0 {
        return vec![false; steps];
    }
    if hits >= steps {
        return vec![true; steps];
    }

    let mut a: Vec<Vec<bool>> = vec![vec![true]; hits];
    let mut b: Vec<Vec<bool>> = vec![vec![false]; steps - hits];

    while b.len() > 1 {
        let m = a.len().min(b.len());
        let mut new_a = Vec::with_capacity(m);
        for i in 0..m {
            let mut combined = a[i].clone();
            combined.extend(b[i].clone());
            new_a.push(combined);
        }
        let remainder_a = if a.len() > m { a[m..].to_vec() } else { Vec::new() };
        let remainder_b = if b.len() > m { b[m..].to_vec() } else { Vec::new() };
        a = new_a;
        b = if !remainder_a.is_empty() { remainder_a } else { remainder_b };
        if a.len() <= 1 {
            break;
        }
    }

    let mut result = Vec::with_capacity(steps);
    for group in a {
        result.extend(group);
    }
    for group in b {
        result.extend(group);
    }
    result
}

/// Rotates `pattern` left by `rotation` steps: the output's index `i` holds
/// `pattern[(i + rotation) mod len]`.
pub fn rotate(pattern: &[bool], rotation: i32) -> Vec<bool> {
    let len = pattern.len();
    if len == 0 {
        return Vec::new();
    }
    let rotation = rotation.rem_euclid(len as i32) as usize;
    (0..len).map(|i| pattern[(i + rotation) % len]).collect()
}

/// Owns the Euclidean generation parameters and the resulting trigger
/// pattern, regenerated whenever `steps`, `hits`, or `rotation` change.
#[derive(Debug, Clone)]
pub struct EuclideanPattern {
    steps: usize,
    hits: usize,
    rotation: i32,
    pattern: Vec<bool>,
}

impl EuclideanPattern {
    pub fn new(steps: usize, hits: usize, rotation: i32) -> Self {
        let mut p = Self {
            steps,
            hits,
            rotation,
            pattern: Vec::new(),
        };
        p.regenerate();
        p
    }

    pub fn regenerate(&mut self) {
        let base = bjorklund(self.steps, self.hits);
        self.pattern = rotate(&base, self.rotation);
    }

    pub fn set_steps(&mut self, steps: usize) {
        self.steps = steps;
        self.regenerate();
    }

    pub fn set_hits(&mut self, hits: usize) {
        self.hits = hits;
        self.regenerate();
    }

    pub fn set_rotation(&mut self, rotation: i32) {
        self.rotation = rotation;
        self.regenerate();
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Whether step `index` (taken modulo pattern length) triggers.
    pub fn triggers_at(&self, index: usize) -> bool {
        if self.pattern.is_empty() {
            false
        } else {
            self.pattern[index % self.pattern.len()]
        }
    }

    pub fn pattern(&self) -> &[bool] {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tresillo_matches_canonical_pattern() {
        let p = bjorklund(8, 3);
        let expected = vec![true, false, false, true, false, false, true, false];
        assert_eq!(p, expected);
    }

    #[test]
    fn hit_count_matches_requested_hits() {
        for steps in 1..=16 {
            for hits in 0..=steps {
                let p = bjorklund(steps, hits);
                assert_eq!(p.len(), steps);
                assert_eq!(p.iter().filter(|&&t| t).count(), hits);
            }
        }
    }

    #[test]
    fn hits_clamped_to_steps() {
        let p = bjorklund(4, 10);
        assert_eq!(p, vec![true; 4]);
    }

    #[test]
    fn zero_steps_is_empty() {
        assert_eq!(bjorklund(0, 0), Vec::<bool>::new());
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let p = bjorklund(8, 3);
        assert_eq!(rotate(&p, 0), p);
    }

    #[test]
    fn rotate_then_negative_rotate_is_identity() {
        let p = bjorklund(8, 5);
        let rotated = rotate(&p, 3);
        let back = rotate(&rotated, -3);
        assert_eq!(back, p);
    }

    #[test]
    fn euclidean_pattern_regenerates_on_parameter_change() {
        let mut ep = EuclideanPattern::new(8, 3, 0);
        assert!(ep.triggers_at(0));
        ep.set_rotation(1);
        assert!(!ep.triggers_at(0));
    }

    #[test]
    fn triggers_at_wraps_by_pattern_length() {
        let ep = EuclideanPattern::new(8, 3, 0);
        assert_eq!(ep.triggers_at(0), ep.triggers_at(8));
    }
}
