//! MIDI Input
//!
//! Parses three-byte standard MIDI channel messages into [`MidiEvent`]s and
//! carries them from the MIDI-receiver thread to the audio thread through a
//! lock-free single-producer/single-consumer queue. Device enumeration and
//! opening are a different collaborator's job; this module only knows how
//! to turn bytes already received into events, and how to get those events
//! from one thread to another without blocking either side.

#![allow(dead_code)]

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Status-byte upper nibble values this layer understands. Anything else is
/// an unknown status and the message is dropped.
const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CONTROL_CHANGE: u8 = 0xB0;

/// A parsed MIDI channel message, channel-agnostic (the channel nibble is
/// not tracked; every message is treated as addressed to this engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ControlChange { cc: u8, value: u8 },
}

/// Parses one three-byte standard MIDI message. Returns `None` for a short
/// message, an unrecognized status nibble, or a note-on with velocity 0
/// (reinterpreted as note-off rather than dropped). No running-status
/// support: every message must carry its own status byte.
pub fn parse_message(bytes: &[u8]) -> Option<MidiEvent> {
    if bytes.len() < 3 {
        return None;
    }
    let status = bytes[0] & 0xF0;
    let data1 = bytes[1] & 0x7F;
    let data2 = bytes[2] & 0x7F;

    match status {
        STATUS_NOTE_ON if data2 == 0 => Some(MidiEvent::NoteOff { note: data1 }),
        STATUS_NOTE_ON => Some(MidiEvent::NoteOn {
            note: data1,
            velocity: data2,
        }),
        STATUS_NOTE_OFF => Some(MidiEvent::NoteOff { note: data1 }),
        STATUS_CONTROL_CHANGE => Some(MidiEvent::ControlChange {
            cc: data1,
            value: data2,
        }),
        _ => None,
    }
}

/// Producer half of the MIDI event queue, held by the MIDI-receiver thread.
pub type MidiEventProducer = HeapProd<MidiEvent>;
/// Consumer half of the MIDI event queue, held by the audio thread.
pub type MidiEventConsumer = HeapCons<MidiEvent>;

/// Creates a lock-free MIDI event queue of the given capacity. `try_push`
/// on the producer and `try_pop`/iteration on the consumer never block and
/// never allocate once created, making the consumer side safe to drain from
/// inside a real-time audio callback.
pub fn create_midi_channel(capacity: usize) -> (MidiEventProducer, MidiEventConsumer) {
    let rb = HeapRb::<MidiEvent>::new(capacity.max(1));
    rb.split()
}

/// Drains every currently queued event from `consumer` into `out`, in the
/// order they were pushed. Called once at the start of each audio block.
pub fn drain_into(consumer: &mut MidiEventConsumer, out: &mut Vec<MidiEvent>) {
    while let Some(event) = consumer.try_pop() {
        out.push(event);
    }
}
