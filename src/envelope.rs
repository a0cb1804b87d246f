//! Envelope Module
//!
//! Per-voice ADSR envelope generator with independently bendable
//! attack and decay/release curves, gated by note-on/note-off.

#![allow(dead_code)]

/// Envelope stage. `Off` is the only stage in which the owning voice is
/// considered inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Minimum segment duration, in seconds. Values below this are clamped to
/// prevent division by zero and to keep a perceptible transient even at
/// the shortest settings.
pub const MIN_SEGMENT_SECONDS: f32 = 0.001;

/// Configuration for constructing an [`AdsrEnvelope`].
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeConfig {
    pub attack_secs: f32,
    pub decay_secs: f32,
    pub sustain_level: f32,
    pub release_secs: f32,
    /// Bend applied to the attack segment. `0.5` = linear, `<0.5` = concave
    /// (slow start), `>0.5` = convex (fast start).
    pub attack_bend: f32,
    /// Bend applied to both the decay and the release segments.
    pub release_bend: f32,
    pub sample_rate: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack_secs: 0.01,
            decay_secs: 0.1,
            sustain_level: 0.7,
            release_secs: 0.2,
            attack_bend: 0.5,
            release_bend: 0.5,
            sample_rate: 48_000.0,
        }
    }
}

/// ADSR envelope with bendable attack and decay/release curves.
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    stage: EnvelopeStage,
    level: f32,
    /// Normalized progress through the current stage, in `[0,1]`.
    progress: f32,
    /// Level captured at the instant release begins, so release duration
    /// is independent of the level release started from. Held as ordinary
    /// per-instance state rather than a function-local static so that
    /// concurrent voices each get their own capture.
    release_start_level: f32,

    attack_secs: f32,
    decay_secs: f32,
    sustain_level: f32,
    release_secs: f32,
    attack_bend: f32,
    release_bend: f32,
    sample_rate: f32,
}

impl AdsrEnvelope {
    pub fn new() -> Self {
        Self::with_config(EnvelopeConfig::default())
    }

    pub fn with_config(config: EnvelopeConfig) -> Self {
        Self {
            stage: EnvelopeStage::Off,
            level: 0.0,
            progress: 0.0,
            release_start_level: 0.0,
            attack_secs: config.attack_secs.max(MIN_SEGMENT_SECONDS),
            decay_secs: config.decay_secs.max(MIN_SEGMENT_SECONDS),
            sustain_level: config.sustain_level.clamp(0.0, 1.0),
            release_secs: config.release_secs.max(MIN_SEGMENT_SECONDS),
            attack_bend: config.attack_bend.clamp(0.0, 1.0),
            release_bend: config.release_bend.clamp(0.0, 1.0),
            sample_rate: config.sample_rate.max(1.0),
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Off
    }

    pub fn set_attack_secs(&mut self, secs: f32) {
        self.attack_secs = secs.max(MIN_SEGMENT_SECONDS);
    }

    pub fn set_decay_secs(&mut self, secs: f32) {
        self.decay_secs = secs.max(MIN_SEGMENT_SECONDS);
    }

    pub fn set_sustain_level(&mut self, level: f32) {
        self.sustain_level = level.clamp(0.0, 1.0);
    }

    pub fn set_release_secs(&mut self, secs: f32) {
        self.release_secs = secs.max(MIN_SEGMENT_SECONDS);
    }

    pub fn set_attack_bend(&mut self, bend: f32) {
        self.attack_bend = bend.clamp(0.0, 1.0);
    }

    pub fn set_release_bend(&mut self, bend: f32) {
        self.release_bend = bend.clamp(0.0, 1.0);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
    }

    /// Triggers the envelope. OFF -> ATTACK, level and progress reset to zero.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.level = 0.0;
        self.progress = 0.0;
    }

    /// Releases the envelope. Any stage but OFF/RELEASE -> RELEASE, capturing
    /// the current level as the release's starting point.
    pub fn note_off(&mut self) {
        if self.stage != EnvelopeStage::Off && self.stage != EnvelopeStage::Release {
            self.release_start_level = self.level;
            self.stage = EnvelopeStage::Release;
            self.progress = 0.0;
        }
    }

    /// Forces the envelope back to OFF immediately, clearing state. Used by
    /// voice stealing, which resets rather than soft-steals.
    pub fn hard_reset(&mut self) {
        self.stage = EnvelopeStage::Off;
        self.level = 0.0;
        self.progress = 0.0;
        self.release_start_level = 0.0;
    }

    /// Advances the envelope by one sample and returns the new level.
    pub fn process(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Off => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.progress += 1.0 / (self.attack_secs * self.sample_rate);
                if self.progress >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                    self.progress = 0.0;
                } else {
                    self.level = apply_bend(self.progress, self.attack_bend);
                }
            }
            EnvelopeStage::Decay => {
                self.progress += 1.0 / (self.decay_secs * self.sample_rate);
                if self.progress >= 1.0 {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                    self.progress = 0.0;
                } else {
                    let bent = apply_bend(self.progress, self.release_bend);
                    self.level = 1.0 + (self.sustain_level - 1.0) * bent;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }
            EnvelopeStage::Release => {
                // Release duration is independent of the level release began
                // at: progress is driven by the *current* level each sample,
                // captured via release_start_level at the OFF transition.
                if self.release_start_level > 0.0 {
                    self.progress += self.level / (self.release_secs * self.sample_rate);
                } else {
                    self.progress = 1.0;
                }
                if self.progress >= 1.0 || self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Off;
                } else {
                    let bent = apply_bend(self.progress, self.release_bend);
                    self.level = self.release_start_level * (1.0 - bent);
                }
            }
        }
        self.level
    }
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps linear progress `t ∈ [0,1]` to `t^e` where `e = 10^((bend-0.5)*2)`.
/// `bend = 0.5` is the identity (linear); `bend < 0.5` is concave (slow
/// start); `bend > 0.5` is convex (fast start).
pub fn apply_bend(t: f32, bend: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let exponent = 10f32.powf((bend - 0.5) * 2.0);
    t.powf(exponent)
}
