//! Envelope integration tests
//!
//! Runs the ADSR envelope across longer sequences and interleaved
//! note-on/note-off traffic than the in-module unit tests, since the latter
//! focus on single-stage transitions rather than realistic voice lifetimes.

mod common;

use brainwave_core::envelope::{AdsrEnvelope, EnvelopeConfig, EnvelopeStage};

const SR: f32 = 48_000.0;

fn env(attack: f32, decay: f32, sustain: f32, release: f32) -> AdsrEnvelope {
    AdsrEnvelope::with_config(EnvelopeConfig {
        attack_secs: attack,
        decay_secs: decay,
        sustain_level: sustain,
        release_secs: release,
        attack_bend: 0.5,
        release_bend: 0.5,
        sample_rate: SR,
    })
}

fn run_for(e: &mut AdsrEnvelope, seconds: f32) {
    let n = (seconds * SR) as usize;
    for _ in 0..n {
        e.process();
    }
}

#[test]
fn full_adsr_cycle_visits_every_stage_in_order() {
    let mut e = env(0.005, 0.005, 0.6, 0.02);
    let mut seen = Vec::new();
    e.note_on();
    seen.push(e.stage());
    run_for(&mut e, 0.01);
    seen.push(e.stage());
    run_for(&mut e, 0.2);
    seen.push(e.stage());
    e.note_off();
    run_for(&mut e, 0.05);
    seen.push(e.stage());

    assert_eq!(
        seen,
        vec![
            EnvelopeStage::Attack,
            EnvelopeStage::Decay,
            EnvelopeStage::Sustain,
            EnvelopeStage::Off,
        ]
    );
}

#[test]
fn retriggering_during_release_restarts_from_zero() {
    let mut e = env(0.01, 0.01, 0.5, 0.3);
    e.note_on();
    run_for(&mut e, 0.3);
    e.note_off();
    run_for(&mut e, 0.05);
    assert_eq!(e.stage(), EnvelopeStage::Release);

    e.note_on();
    assert_eq!(e.stage(), EnvelopeStage::Attack);
    assert_eq!(e.level(), 0.0);
}

#[test]
fn sustain_level_zero_means_silence_after_decay() {
    let mut e = env(0.005, 0.02, 0.0, 0.1);
    e.note_on();
    run_for(&mut e, 0.05);
    assert_eq!(e.stage(), EnvelopeStage::Sustain);
    assert_eq!(e.level(), 0.0);
}

#[test]
fn release_duration_scales_with_starting_level_not_with_a_fixed_sample_count() {
    let mut low = env(0.005, 0.005, 0.1, 0.2);
    let mut high = env(0.005, 0.005, 0.9, 0.2);

    low.note_on();
    high.note_on();
    run_for(&mut low, 0.03);
    run_for(&mut high, 0.03);
    assert_eq!(low.stage(), EnvelopeStage::Sustain);
    assert_eq!(high.stage(), EnvelopeStage::Sustain);
    low.note_off();
    high.note_off();

    let mut samples_to_silence_low = 0;
    while low.stage() != EnvelopeStage::Off && samples_to_silence_low < 50_000 {
        low.process();
        samples_to_silence_low += 1;
    }
    let mut samples_to_silence_high = 0;
    while high.stage() != EnvelopeStage::Off && samples_to_silence_high < 50_000 {
        high.process();
        samples_to_silence_high += 1;
    }
    // Both started release from a low attack-phase level but release moves
    // proportionally to the level it started from, so they finish close to
    // one another rather than the high one taking far longer.
    let ratio = samples_to_silence_high as f32 / samples_to_silence_low.max(1) as f32;
    assert!(ratio < 3.0, "ratio was {}", ratio);
}

#[test]
fn repeated_note_on_note_off_never_produces_non_finite_levels() {
    let mut e = env(0.001, 0.001, 0.5, 0.001);
    for cycle in 0..50 {
        e.note_on();
        run_for(&mut e, 0.0005);
        if cycle % 2 == 0 {
            e.note_off();
        }
        run_for(&mut e, 0.0005);
        assert!(e.level().is_finite());
    }
}

#[test]
fn concurrent_envelopes_do_not_share_release_state() {
    // Each AdsrEnvelope instance must capture its own release_start_level;
    // this is the behavior that resolved the ambiguity over whether that
    // capture could be shared process-wide state.
    let mut a = env(0.001, 0.001, 0.9, 0.1);
    let mut b = env(0.001, 0.001, 0.2, 0.1);
    a.note_on();
    b.note_on();
    run_for(&mut a, 0.01);
    run_for(&mut b, 0.01);
    a.note_off();
    b.note_off();
    let a_level_at_release = a.level();
    let b_level_at_release = b.level();
    assert_ne!(a_level_at_release, b_level_at_release);
    run_for(&mut a, 0.001);
    run_for(&mut b, 0.001);
    assert_ne!(a.level(), b.level());
}
