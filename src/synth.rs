//! Synth Module
//!
//! The top-level orchestrator: owns the voice pool, the FM matrix, the
//! modulation matrix, the sequencer (clock + tracks), the filter, the
//! reverb, the loop manager, the atomic parameter store, and the MIDI
//! event queue and CC router. `process_block` drives every other module
//! through one audio block in a fixed order:
//!
//! 1. Drain queued MIDI events into voice note-on/off and CC handling.
//! 2. Advance the sequencer's clock and resolve step triggers into note
//!    events.
//! 3. Evaluate the modulation matrix once, from this block's LFO and
//!    envelope values.
//! 4. Mix the voice pool sample-by-sample into a mono signal, scaled by
//!    master volume and a polyphony headroom factor, duplicated to stereo.
//! 5. Run the stereo mix through the filter, then the reverb.
//! 6. Run the result through the loop manager.
//! 7. Write the result to the caller's output buffers.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::envelope::EnvelopeStage;
use crate::error::{EngineError, EngineResult};
use crate::euclidean::EuclideanPattern;
use crate::filter::{Filter, FilterType};
use crate::fm_matrix::{FmMatrix, OSCILLATORS_PER_VOICE};
use crate::lfo::Lfo;
use crate::loop_manager::LoopManager;
use crate::looper::{LooperRequest, LooperState};
use crate::markov::{Contour, MarkovChain};
use crate::midi::{self, create_midi_channel, MidiEvent, MidiEventConsumer, MidiEventProducer};
use crate::modulation::{
    MidiCCManager, ModDestinationValues, ModMatrix, ModSourceValues, ParamId, NUM_LFOS,
};
use crate::oscillator::OscillatorModInputs;
use crate::params::ParamStore;
use crate::pattern::{MusicalConstraints, Scale};
use crate::reverb::Reverb;
use crate::sequencer::{NoteEvent, Sequencer};
use crate::track::Track;
use crate::voice::{OscillatorMix, Voice};

/// MIDI queue capacity. Generous relative to any plausible per-block event
/// count; a full queue drops the newest event rather than blocking the
/// producer.
const MIDI_QUEUE_CAPACITY: usize = 256;

/// Subdivision used to sample the clock's normalized phase into the
/// modulation matrix's single `ClockPhase` source; an arbitrary but fixed
/// choice (sixteenth notes), documented rather than hidden.
const CLOCK_PHASE_SUBDIVISION: u32 = 16;

/// A nominal block size used only to pick the parameter smoother's
/// per-block decay coefficient; real block sizes vary, so this is a
/// reasonable fixed assumption rather than an exact one.
const NOMINAL_BLOCK_SIZE: f32 = 128.0;

/// Scales a modulation matrix contribution (roughly `[-1, 1]`) into Hz
/// before it's added to the base filter cutoff.
const FILTER_CUTOFF_MOD_SCALE_HZ: f32 = 8_000.0;

/// The top-level synthesis engine.
pub struct Synth {
    sample_rate: f32,
    voices: Vec<Voice>,
    fm_matrix: FmMatrix,
    lfos: [Lfo; NUM_LFOS],
    mod_matrix: ModMatrix,
    sequencer: Sequencer,
    filter: Filter,
    reverb: Reverb,
    loop_manager: LoopManager,
    params: ParamStore,
    midi_cc: MidiCCManager,
    midi_producer: Option<MidiEventProducer>,
    midi_consumer: MidiEventConsumer,
    midi_scratch: Vec<MidiEvent>,
    sample_counter: u64,

    osc_levels: [f32; OSCILLATORS_PER_VOICE],

    mod_wheel: f32,
    pitch_bend: f32,
    aftertouch: f32,
    last_velocity: f32,

    last_dest: ModDestinationValues,
}

impl Synth {
    /// Convenience constructor: every other setting at its default.
    pub fn new(sample_rate: f32) -> EngineResult<Self> {
        Self::with_config(EngineConfig {
            sample_rate,
            ..Default::default()
        })
    }

    /// General entry point: builds a fully-wired engine from `config`.
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let voices = (0..config.voice_count)
            .map(|_| Voice::new(config.sample_rate))
            .collect();

        let lfos: [Lfo; NUM_LFOS] = std::array::from_fn(|_| Lfo::new());

        let clock = Clock::new(config.sample_rate, 120.0);
        let tracks = (0..config.track_count).map(default_track).collect();
        let sequencer = Sequencer::new(clock, tracks);

        let blocks_per_second = (config.sample_rate / NOMINAL_BLOCK_SIZE).max(1.0);

        let (midi_producer, midi_consumer) = create_midi_channel(MIDI_QUEUE_CAPACITY);

        let mut midi_cc = MidiCCManager::new();
        midi_cc.bind(7, ParamId::MasterVolume);
        midi_cc.bind(74, ParamId::FilterCutoff);
        midi_cc.bind(71, ParamId::FilterResonance);
        midi_cc.bind(91, ParamId::ReverbMix);
        midi_cc.bind(93, ParamId::ReverbSize);

        let mut params = ParamStore::new(blocks_per_second);
        params.master_volume.set(config.master_volume);
        params.master_volume.snap();

        Ok(Self {
            sample_rate: config.sample_rate,
            voices,
            fm_matrix: FmMatrix::new(),
            lfos,
            // Clock-driven step resolution (`new_step mod pattern_length`) is
            // the default per-track behavior; track phase is left unwired so
            // `Sequencer::process_block`'s `None` branch is what runs unless
            // the caller explicitly patches a `TrackPhase` destination.
            mod_matrix: ModMatrix::new(),
            sequencer,
            filter: Filter::new(FilterType::LowPass, 8_000.0, 0.0, config.sample_rate),
            reverb: Reverb::new(config.sample_rate),
            loop_manager: LoopManager::new(
                config.max_loops,
                config.sample_rate,
                config.max_loop_seconds,
                0.02,
            ),
            params,
            midi_cc,
            midi_producer: Some(midi_producer),
            midi_consumer,
            midi_scratch: Vec::with_capacity(64),
            sample_counter: 0,
            osc_levels: [1.0, 0.0, 0.0, 0.0],
            mod_wheel: 0.0,
            pitch_bend: 0.0,
            aftertouch: 0.0,
            last_velocity: 0.8,
            last_dest: ModDestinationValues::default(),
        })
    }

    /// Takes the producer half of the MIDI queue, for a MIDI-receiver thread
    /// to push parsed events into. Returns `None` if already taken.
    pub fn take_midi_producer(&mut self) -> Option<MidiEventProducer> {
        self.midi_producer.take()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn fm_matrix_mut(&mut self) -> &mut FmMatrix {
        &mut self.fm_matrix
    }

    pub fn mod_matrix_mut(&mut self) -> &mut ModMatrix {
        &mut self.mod_matrix
    }

    pub fn mod_matrix(&self) -> &ModMatrix {
        &self.mod_matrix
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    pub fn lfo_mut(&mut self, index: usize) -> &mut Lfo {
        &mut self.lfos[index]
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn midi_cc_mut(&mut self) -> &mut MidiCCManager {
        &mut self.midi_cc
    }

    /// Sets the shared per-voice-slot oscillator level (applies to every
    /// voice equally; oscillator configuration is a patch, not per-voice).
    pub fn set_oscillator_level(&mut self, index: usize, level: f32) {
        if index < OSCILLATORS_PER_VOICE {
            self.osc_levels[index] = level.max(0.0);
        }
    }

    /// Applies `f` to oscillator `index` on every voice in the pool, since
    /// the patch (not the per-voice running state) is shared across the
    /// pool.
    pub fn configure_oscillator(&mut self, index: usize, f: impl Fn(&mut crate::oscillator::Oscillator)) {
        if index >= OSCILLATORS_PER_VOICE {
            return;
        }
        for voice in &mut self.voices {
            f(voice.oscillator_mut(index));
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        log::debug!("transport playing = {}", playing);
        self.sequencer.clock_mut().set_playing(playing);
    }

    pub fn set_tempo_bpm(&mut self, tempo_bpm: f32) {
        self.sequencer.clock_mut().set_tempo_bpm(tempo_bpm);
    }

    /// Resizes track `index`'s pattern, rejecting a zero-length or
    /// over-256-step request. Control-thread only.
    pub fn set_track_pattern_length(&mut self, index: usize, length: usize) -> EngineResult<()> {
        if index >= self.sequencer.tracks().len() {
            return Err(EngineError::TrackIndexOutOfBounds(index, self.sequencer.tracks().len()));
        }
        self.sequencer.track_mut(index).try_set_pattern_length(length)
    }

    /// Forwards a looper state-change request for loop `index`.
    pub fn loop_request(&mut self, index: usize, request: LooperRequest) {
        log::debug!("loop {} request {:?}", index, request);
        self.loop_manager.request(index, request);
    }

    pub fn loop_state(&self, index: usize) -> Option<LooperState> {
        self.loop_manager.state(index)
    }

    pub fn set_pitch_bend(&mut self, value: f32) {
        self.pitch_bend = value.clamp(-1.0, 1.0);
    }

    pub fn set_aftertouch(&mut self, value: f32) {
        self.aftertouch = value.clamp(0.0, 1.0);
    }

    /// Triggers a note-on directly (bypassing the MIDI queue), used by the
    /// sequencer's generated events and available to a direct API caller.
    pub fn note_on(&mut self, midi_note: u8, velocity: u8) {
        self.last_velocity = velocity as f32 / 127.0;
        let index = self.allocate_voice_index(midi_note);
        self.voices[index].note_on(midi_note, self.sample_counter);
        for lfo in &mut self.lfos {
            lfo.note_on();
        }
    }

    pub fn note_off(&mut self, midi_note: u8) {
        for voice in &mut self.voices {
            voice.note_off(midi_note);
        }
    }

    /// Picks a voice for a new note-on: the first inactive voice, or, if
    /// none is free, the voice whose envelope is furthest into release
    /// (lowest level among those in `Release`), or failing that the oldest
    /// active voice. The chosen voice's own `note_on` always resets it in
    /// full; this never soft-steals.
    fn allocate_voice_index(&self, incoming_note: u8) -> usize {
        if let Some(index) = self.voices.iter().position(|v| !v.is_active()) {
            return index;
        }

        let releasing = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.envelope().stage() == EnvelopeStage::Release)
            .min_by(|a, b| {
                a.1.envelope()
                    .level()
                    .partial_cmp(&b.1.envelope().level())
                    .unwrap()
            });

        let index = if let Some((index, _)) = releasing {
            index
        } else {
            self.voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.allocated_at())
                .map(|(index, _)| index)
                .unwrap_or(0)
        };

        log::warn!(
            "voice stealing: stole voice {} (playing note {}) for incoming note {}",
            index,
            self.voices[index].midi_note(),
            incoming_note
        );
        index
    }

    fn handle_cc(&mut self, cc: u8, value: u8) {
        if cc == 1 {
            self.mod_wheel = value as f32 / 127.0;
            return;
        }
        if let Some((target, mapped)) = self.midi_cc.process_cc(cc, value) {
            self.apply_param(target, mapped);
        }
    }

    fn apply_param(&mut self, target: ParamId, value: f32) {
        match target {
            ParamId::MasterVolume => self.params.master_volume.set(value),
            ParamId::FilterCutoff => self.params.filter_cutoff.set(value),
            ParamId::FilterResonance => self.params.filter_resonance.set(value),
            ParamId::FilterGainDb => self.params.filter_gain_db.set(value),
            ParamId::ReverbMix => self.params.reverb_mix.set(value),
            ParamId::ReverbSize => self.params.reverb_size.set(value),
        }
    }

    fn source_values(&self) -> ModSourceValues {
        let mut envelopes = [0.0f32; 4];
        for (i, slot) in envelopes.iter_mut().enumerate() {
            if let Some(voice) = self.voices.get(i) {
                *slot = voice.envelope().level();
            }
        }
        ModSourceValues {
            lfos: [
                self.lfos[0].last_output(),
                self.lfos[1].last_output(),
                self.lfos[2].last_output(),
                self.lfos[3].last_output(),
            ],
            envelopes,
            velocity: self.last_velocity,
            aftertouch: self.aftertouch,
            mod_wheel: self.mod_wheel,
            pitch_bend: self.pitch_bend,
            clock_phase: self.sequencer.clock().phase(CLOCK_PHASE_SUBDIVISION),
        }
    }

    fn oscillator_mix(&self, dest: &ModDestinationValues) -> [OscillatorMix; OSCILLATORS_PER_VOICE] {
        std::array::from_fn(|i| OscillatorMix {
            level: self.osc_levels[i],
            level_mod: dest.osc_level[i] + dest.osc_amp[i],
            mods: OscillatorModInputs {
                pitch_mod_octaves: dest.osc_pitch[i],
                morph_mod: dest.osc_morph[i],
                duty_mod: dest.osc_duty[i],
                ratio_mod: dest.osc_ratio[i],
                offset_mod: dest.osc_offset[i],
            },
        })
    }

    fn apply_block_modulation(&mut self, dest: &ModDestinationValues) {
        let cutoff =
            (self.params.filter_cutoff.current() + dest.filter_cutoff * FILTER_CUTOFF_MOD_SCALE_HZ).max(20.0);
        self.filter.set_cutoff(cutoff);
        self.filter.set_gain_db(self.params.filter_gain_db.current());
        self.filter
            .set_filter_type(filter_type_from_code(self.params.filter_type.get()));

        // FilterResonance has nowhere to land: `Filter` is a one-pole design
        // with no Q control. The parameter and its mod destination are kept
        // as UI-facing plumbing for a future filter revision.
        let _ = self.params.filter_resonance.current();
        let _ = dest.filter_resonance;

        let mut reverb_params = *self.reverb.params();
        reverb_params.mix = (self.params.reverb_mix.current() + dest.reverb_mix).clamp(0.0, 1.0);
        reverb_params.size = (self.params.reverb_size.current() + dest.reverb_size).clamp(0.1, 3.0);
        self.reverb.set_params(reverb_params);
        self.reverb.set_enabled(self.params.reverb_enabled.get() != 0);

        for i in 0..NUM_LFOS {
            self.lfos[i].set_rate(crate::lfo::LfoRate::Hertz(
                (2.0 + dest.lfo_rate[i] * 10.0).max(0.01),
            ));
            self.lfos[i].set_morph((0.5 + dest.lfo_morph[i]).clamp(0.0, 1.0));
            self.lfos[i].set_duty((0.5 + dest.lfo_duty[i]).clamp(0.0, 1.0));
        }
    }

    /// Advances the engine by one audio block, writing `out_l.len()`
    /// stereo samples. `out_l` and `out_r` must be the same length.
    pub fn process_block<R: Rng>(&mut self, out_l: &mut [f32], out_r: &mut [f32], rng: &mut R) {
        debug_assert_eq!(out_l.len(), out_r.len());
        let n_samples = out_l.len();

        self.params.advance_block();

        self.midi_scratch.clear();
        midi::drain_into(&mut self.midi_consumer, &mut self.midi_scratch);
        let events = std::mem::take(&mut self.midi_scratch);
        for event in &events {
            match *event {
                MidiEvent::NoteOn { note, velocity } => self.note_on(note, velocity),
                MidiEvent::NoteOff { note } => self.note_off(note),
                MidiEvent::ControlChange { cc, value } => self.handle_cc(cc, value),
            }
        }
        self.midi_scratch = events;

        self.midi_cc.check_learn_timeout();

        let beats_per_second = self.sequencer.clock().beats_per_second();
        for lfo in &mut self.lfos {
            lfo.process(beats_per_second);
        }

        let values = self.source_values();
        let dest = self.mod_matrix.evaluate(&values);
        self.apply_block_modulation(&dest);

        let track_count = self.sequencer.tracks().len();
        let phase_drivers: Vec<Option<f32>> = (0..track_count)
            .map(|i| {
                if i < dest.track_phase.len() && self.mod_matrix.drives_track_phase(i) {
                    Some(dest.track_phase[i])
                } else {
                    None
                }
            })
            .collect();

        let note_events = self
            .sequencer
            .process_block(n_samples as u64, &phase_drivers, rng);
        for event in note_events {
            match event {
                NoteEvent::On { midi_note, velocity } => self.note_on(midi_note, velocity),
                NoteEvent::Off { midi_note } => self.note_off(midi_note),
            }
        }

        self.last_dest = dest;
        let mix = self.oscillator_mix(&self.last_dest);

        let master_volume = self.params.master_volume.current();
        let headroom = 1.0 / (self.voices.len() as f32).sqrt().max(1.0);

        for sample in 0..n_samples {
            let mut sum = 0.0f32;
            for voice in &mut self.voices {
                sum += voice.tick(&self.fm_matrix, &mix);
            }
            let dry = sum * headroom * master_volume;
            out_l[sample] = dry;
            out_r[sample] = dry;
            self.sample_counter += 1;
        }

        self.filter.process_block(out_l, out_r);
        self.reverb.process_block(out_l, out_r);
        self.loop_manager.process_block(out_l, out_r);
    }
}

fn filter_type_from_code(code: u32) -> FilterType {
    match code {
        1 => FilterType::HighPass,
        2 => FilterType::LowShelf,
        3 => FilterType::HighShelf,
        _ => FilterType::LowPass,
    }
}

/// Builds a track with sensible generative defaults: C natural minor over
/// a three-octave span, a gentle random-walk contour, and an eight-hit
/// Euclidean pattern over sixteen steps, then generates its initial
/// Euclidean triggers and Markov-chosen notes from a fixed per-track seed
/// so a freshly constructed `Synth` already has something to play rather
/// than sixteen inactive steps waiting on a control-thread regeneration
/// call that may never come.
fn default_track(id: usize) -> Track {
    let constraints = MusicalConstraints::new(60, Scale::NaturalMinor, -1, 1);
    let legal_count = constraints.legal_notes().len();
    let markov = MarkovChain::new(legal_count, Contour::RandomWalk { max_interval: 3 });
    let euclidean = EuclideanPattern::new(16, 8, 0);
    let mut track = Track::with_id(
        id,
        format!("track {}", id + 1),
        16,
        constraints,
        markov,
        euclidean,
        16,
    );
    let mut rng = StdRng::seed_from_u64(0xB12A_5EED + id as u64);
    track.generate_pattern(&mut rng);
    track
}
