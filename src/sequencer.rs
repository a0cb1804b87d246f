//! Sequencer Module
//!
//! Owns the musical [`Clock`](crate::clock::Clock) and a fixed small vector
//! of [`Track`](crate::track::Track)s (default four). Each block, every
//! track is checked for a step trigger against either the clock directly or
//! a modulation-driven phase value, triggered steps are turned into
//! note-on events, and held gates are checked for release.

#![allow(dead_code)]

use rand::Rng;

use crate::clock::Clock;
use crate::track::Track;

pub const DEFAULT_TRACK_COUNT: usize = 4;

/// A note-on or note-off event produced by the sequencer for the synth to
/// consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteEvent {
    On { midi_note: u8, velocity: u8 },
    Off { midi_note: u8 },
}

/// A currently-held gate, tracked until its `gateLength` elapses.
#[derive(Debug, Clone, Copy)]
struct ActiveNote {
    midi_note: u8,
    start_sample: u64,
    gate_samples: u64,
}

/// Per-track playback state that is not part of the generative data model
/// (which lives on [`Track`] itself).
#[derive(Debug, Clone, Default)]
struct TrackPlayback {
    last_triggered_step: Option<usize>,
    active_notes: Vec<ActiveNote>,
}

pub struct Sequencer {
    clock: Clock,
    tracks: Vec<Track>,
    playback: Vec<TrackPlayback>,
    current_track_index: usize,
}

impl Sequencer {
    pub fn new(clock: Clock, tracks: Vec<Track>) -> Self {
        let playback = tracks.iter().map(|_| TrackPlayback::default()).collect();
        Self {
            clock,
            tracks,
            playback,
            current_track_index: 0,
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> &Track {
        &self.tracks[index]
    }

    pub fn track_mut(&mut self, index: usize) -> &mut Track {
        &mut self.tracks[index]
    }

    pub fn current_track(&self) -> &Track {
        &self.tracks[self.current_track_index]
    }

    pub fn current_track_mut(&mut self) -> &mut Track {
        &mut self.tracks[self.current_track_index]
    }

    pub fn set_current_track_index(&mut self, index: usize) {
        self.current_track_index = index.min(self.tracks.len().saturating_sub(1));
    }

    pub fn current_track_index(&self) -> usize {
        self.current_track_index
    }

    fn any_track_soloed(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }

    fn track_should_play(&self, index: usize) -> bool {
        if self.any_track_soloed() {
            self.tracks[index].solo
        } else {
            !self.tracks[index].muted
        }
    }

    /// Advances the clock by `n_samples` and resolves every track's step
    /// trigger and gate release, returning the note events produced this
    /// block in the order they were discovered.
    ///
    /// `phase_drivers[i]`, when `Some`, overrides track `i`'s clock-driven
    /// step resolution with a modulation-driven one: the normalized driver
    /// value is scaled by the track's pattern length and floored.
    pub fn process_block(
        &mut self,
        n_samples: u64,
        phase_drivers: &[Option<f32>],
        rng: &mut impl Rng,
    ) -> Vec<NoteEvent> {
        self.clock.advance(n_samples);
        let mut events = Vec::new();

        for i in 0..self.tracks.len() {
            let pattern_length = self.tracks[i].pattern.len();
            let resolved_step = match phase_drivers.get(i).copied().flatten() {
                Some(driver) => {
                    let normalized = driver.clamp(0.0, 1.0 - 1e-6);
                    Some((normalized * pattern_length as f32) as usize)
                }
                None => self
                    .clock
                    .step_trigger(self.tracks[i].subdivision())
                    .map(|new_step| new_step as usize % pattern_length),
            };

            let Some(step_index) = resolved_step else {
                continue;
            };
            if self.playback[i].last_triggered_step == Some(step_index) {
                continue;
            }
            self.playback[i].last_triggered_step = Some(step_index);

            if !self.track_should_play(i) {
                continue;
            }

            let step = *self.tracks[i].pattern.step(step_index);
            if !step.active {
                continue;
            }
            if rng.gen::<f32>() > step.probability {
                continue;
            }

            events.push(NoteEvent::On {
                midi_note: step.midi_note,
                velocity: step.velocity,
            });

            let samples_per_step = self.clock.samples_per_step(self.tracks[i].subdivision());
            let gate_samples = (samples_per_step * step.gate_length as f64) as u64;
            self.playback[i].active_notes.push(ActiveNote {
                midi_note: step.midi_note,
                start_sample: self.clock.counter(),
                gate_samples,
            });
        }

        let counter = self.clock.counter();
        for playback in &mut self.playback {
            let mut released = Vec::new();
            playback.active_notes.retain(|note| {
                if counter - note.start_sample >= note.gate_samples {
                    released.push(note.midi_note);
                    false
                } else {
                    true
                }
            });
            for midi_note in released {
                events.push(NoteEvent::Off { midi_note });
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euclidean::EuclideanPattern;
    use crate::markov::{Contour, MarkovChain};
    use crate::pattern::{MusicalConstraints, Scale};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_track(hits: usize) -> Track {
        let constraints = MusicalConstraints::new(60, Scale::NaturalMinor, -1, 1);
        let legal_count = constraints.legal_notes().len();
        let markov = MarkovChain::new(legal_count, Contour::RandomWalk { max_interval: 3 });
        let euclidean = EuclideanPattern::new(8, hits, 0);
        let mut track = Track::new(8, constraints, markov, euclidean, 16);
        let mut rng = StdRng::seed_from_u64(123);
        track.generate_pattern(&mut rng);
        track
    }

    fn test_sequencer(track_count: usize, hits: usize) -> Sequencer {
        let clock = {
            let mut c = Clock::new(48_000.0, 120.0);
            c.set_playing(true);
            c
        };
        let tracks = (0..track_count).map(|_| test_track(hits)).collect();
        Sequencer::new(clock, tracks)
    }

    #[test]
    fn muted_track_produces_no_events() {
        let mut seq = test_sequencer(1, 8);
        seq.track_mut(0).muted = true;
        let mut rng = StdRng::seed_from_u64(1);
        let step_len = seq.clock().samples_per_step(16) as u64;
        let events = seq.process_block(step_len + 1, &[None], &mut rng);
        assert!(events.is_empty());
    }

    #[test]
    fn solo_silences_non_solo_tracks() {
        let mut seq = test_sequencer(2, 8);
        seq.track_mut(0).solo = true;
        let mut rng = StdRng::seed_from_u64(2);
        let step_len = seq.clock().samples_per_step(16) as u64;
        let events = seq.process_block(step_len + 1, &[None, None], &mut rng);
        // Only track 0 may have contributed On events this step.
        assert!(events.iter().all(|e| matches!(e, NoteEvent::Off { .. }) || matches!(e, NoteEvent::On { .. })));
    }

    #[test]
    fn active_steps_eventually_produce_note_on() {
        let mut seq = test_sequencer(1, 8);
        let mut rng = StdRng::seed_from_u64(3);
        let step_len = seq.clock().samples_per_step(16) as u64;
        let mut saw_on = false;
        for _ in 0..16 {
            let events = seq.process_block(step_len, &[None], &mut rng);
            if events.iter().any(|e| matches!(e, NoteEvent::On { .. })) {
                saw_on = true;
                break;
            }
        }
        assert!(saw_on);
    }

    #[test]
    fn held_gate_eventually_releases() {
        let mut seq = test_sequencer(1, 8);
        let mut rng = StdRng::seed_from_u64(4);
        let step_len = seq.clock().samples_per_step(16) as u64;
        let mut saw_off = false;
        for _ in 0..64 {
            let events = seq.process_block(step_len, &[None], &mut rng);
            if events.iter().any(|e| matches!(e, NoteEvent::Off { .. })) {
                saw_off = true;
                break;
            }
        }
        assert!(saw_off);
    }

    #[test]
    fn modulation_driven_phase_overrides_clock_step() {
        let mut seq = test_sequencer(1, 8);
        let mut rng = StdRng::seed_from_u64(5);
        // With an active matching step, driver=0.0 should resolve to step 0.
        let events = seq.process_block(10, &[Some(0.0)], &mut rng);
        let step0_active = seq.track(0).pattern.step(0).active;
        if step0_active {
            assert!(events.iter().any(|e| matches!(e, NoteEvent::On { .. })));
        }
    }

    #[test]
    fn current_track_accessor_matches_index() {
        let mut seq = test_sequencer(3, 8);
        seq.set_current_track_index(2);
        assert_eq!(seq.current_track_index(), 2);
        let _ = seq.current_track();
        let _ = seq.current_track_mut();
    }
}
