//! MIDI CC Routing
//!
//! A unified parameter-ID to CC-number map: when a CC arrives whose number
//! is registered, the bound parameter is set by mapping the MIDI value
//! 0..127 onto the parameter's declared range (linear, or geometric for
//! parameters declared logarithmic). CC learn binds the next incoming CC to
//! a chosen parameter and clears itself after a timeout if nothing arrives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::params::map_cc_value;

/// Maximum number of simultaneously bound CC routes.
pub const MAX_CC_COUNT: usize = 32;

/// CC learn clears itself if no CC message arrives within this long.
pub const CC_LEARN_TIMEOUT_MS: u64 = 10_000;

/// The closed set of continuous parameters a CC can be routed to. Each
/// carries its own declared range and curve, used to map an incoming CC's
/// 0..127 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    MasterVolume,
    FilterCutoff,
    FilterResonance,
    FilterGainDb,
    ReverbMix,
    ReverbSize,
}

impl ParamId {
    /// Declared `(min, max, logarithmic)` range for CC mapping.
    pub fn range(&self) -> (f32, f32, bool) {
        match self {
            ParamId::MasterVolume => (0.0, 1.0, false),
            ParamId::FilterCutoff => (20.0, 20_000.0, true),
            ParamId::FilterResonance => (0.0, 1.0, false),
            ParamId::FilterGainDb => (-24.0, 24.0, false),
            ParamId::ReverbMix => (0.0, 1.0, false),
            ParamId::ReverbSize => (0.1, 1.0, false),
        }
    }

    /// Maps a raw 0..127 CC value onto this parameter's declared range.
    pub fn map(&self, cc_value: u8) -> f32 {
        let (min, max, log) = self.range();
        map_cc_value(cc_value, min, max, log)
    }
}

/// CC numbers reserved by the MIDI spec for mod wheel, pitch bend range
/// substitutes, and transport-like switches; not bindable through `learn`
/// since they already feed fixed engine inputs via [`ModSourceValues`].
///
/// [`ModSourceValues`]: crate::modulation::ModSourceValues
pub const RESERVED_CC_NUMBERS: [u8; 2] = [1, 64];

/// Pending CC-learn state: a target parameter waiting for its next CC.
#[derive(Debug, Clone, Copy)]
struct PendingLearn {
    target: ParamId,
    started_at: Instant,
}

/// Routes incoming MIDI CC numbers to engine parameters.
///
/// The unified map (`cc_number -> ParamId`) is consulted first; a smaller
/// legacy map is retained only for parameters the unified map does not
/// cover, and is never consulted for a CC number the unified map already
/// claims.
#[derive(Debug, Default)]
pub struct MidiCCManager {
    unified: HashMap<u8, ParamId>,
    legacy: HashMap<u8, ParamId>,
    pending_learn: Option<PendingLearn>,
}

impl MidiCCManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `cc_number` to `target` in the unified map, overwriting any
    /// prior binding for that CC number.
    pub fn bind(&mut self, cc_number: u8, target: ParamId) {
        self.unified.insert(cc_number, target);
    }

    pub fn unbind(&mut self, cc_number: u8) {
        self.unified.remove(&cc_number);
    }

    /// Registers a legacy binding, consulted only when the unified map has
    /// no entry for `cc_number`.
    pub fn bind_legacy(&mut self, cc_number: u8, target: ParamId) {
        self.legacy.insert(cc_number, target);
    }

    /// Resolves a CC number to a parameter and its mapped value, unified
    /// map taking precedence over the legacy map.
    pub fn resolve(&self, cc_number: u8, cc_value: u8) -> Option<(ParamId, f32)> {
        let target = self
            .unified
            .get(&cc_number)
            .or_else(|| self.legacy.get(&cc_number))?;
        Some((*target, target.map(cc_value)))
    }

    /// Enables learn mode: the next CC received by [`Self::process_cc`]
    /// binds to `target` instead of being resolved normally.
    pub fn start_learn(&mut self, target: ParamId) {
        self.pending_learn = Some(PendingLearn {
            target,
            started_at: Instant::now(),
        });
    }

    pub fn cancel_learn(&mut self) {
        self.pending_learn = None;
    }

    pub fn is_learning(&self) -> bool {
        self.pending_learn.is_some()
    }

    /// Clears a pending learn once [`CC_LEARN_TIMEOUT_MS`] has elapsed with
    /// no CC received. Returns true if a pending learn was cleared.
    pub fn check_learn_timeout(&mut self) -> bool {
        let timed_out = self
            .pending_learn
            .is_some_and(|p| p.started_at.elapsed() >= Duration::from_millis(CC_LEARN_TIMEOUT_MS));
        if timed_out {
            self.pending_learn = None;
        }
        timed_out
    }

    /// Processes one incoming CC message. While learn mode is active, the
    /// first CC received binds to the pending target and learn mode exits;
    /// the bound CC's value is not itself applied this call. Otherwise
    /// resolves and returns the mapped parameter update, if any.
    pub fn process_cc(&mut self, cc_number: u8, cc_value: u8) -> Option<(ParamId, f32)> {
        if let Some(pending) = self.pending_learn.take() {
            if pending.started_at.elapsed() >= Duration::from_millis(CC_LEARN_TIMEOUT_MS) {
                return self.resolve(cc_number, cc_value);
            }
            self.bind(cc_number, pending.target);
            return None;
        }
        self.resolve(cc_number, cc_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_cc_resolves_to_none() {
        let manager = MidiCCManager::new();
        assert!(manager.resolve(74, 100).is_none());
    }

    #[test]
    fn bound_cc_resolves_to_mapped_value() {
        let mut manager = MidiCCManager::new();
        manager.bind(74, ParamId::FilterCutoff);
        let (target, value) = manager.resolve(74, 127).unwrap();
        assert_eq!(target, ParamId::FilterCutoff);
        assert!((value - 20_000.0).abs() < 1.0);
    }

    #[test]
    fn unified_map_overrides_legacy_for_same_cc() {
        let mut manager = MidiCCManager::new();
        manager.bind_legacy(7, ParamId::ReverbMix);
        manager.bind(7, ParamId::MasterVolume);
        let (target, _) = manager.resolve(7, 64).unwrap();
        assert_eq!(target, ParamId::MasterVolume);
    }

    #[test]
    fn legacy_map_used_when_unified_has_no_entry() {
        let mut manager = MidiCCManager::new();
        manager.bind_legacy(93, ParamId::ReverbSize);
        let (target, _) = manager.resolve(93, 64).unwrap();
        assert_eq!(target, ParamId::ReverbSize);
    }

    #[test]
    fn learn_binds_next_cc_and_exits_learn_mode() {
        let mut manager = MidiCCManager::new();
        manager.start_learn(ParamId::ReverbMix);
        assert!(manager.is_learning());
        let result = manager.process_cc(11, 50);
        assert!(result.is_none());
        assert!(!manager.is_learning());
        let (target, _) = manager.resolve(11, 50).unwrap();
        assert_eq!(target, ParamId::ReverbMix);
    }

    #[test]
    fn cancel_learn_leaves_no_pending_binding() {
        let mut manager = MidiCCManager::new();
        manager.start_learn(ParamId::FilterResonance);
        manager.cancel_learn();
        assert!(!manager.is_learning());
        manager.process_cc(20, 50);
        assert!(manager.resolve(20, 50).is_none());
    }

    #[test]
    fn rebinding_a_cc_number_overwrites_prior_target() {
        let mut manager = MidiCCManager::new();
        manager.bind(74, ParamId::FilterCutoff);
        manager.bind(74, ParamId::FilterResonance);
        let (target, _) = manager.resolve(74, 64).unwrap();
        assert_eq!(target, ParamId::FilterResonance);
    }
}
