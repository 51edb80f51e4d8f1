//! Event model for the reduction pipeline.
//!
//! Everything downstream of the MIDI adapter works on these value types
//! instead of raw `midly` track events: note-ons and note-offs carry just the
//! fields the reducer cares about, and every other message rides along as an
//! opaque payload. Events are immutable; the `with_*` helpers return a new
//! event with one field overridden.

use midly::TrackEventKind;

/// The note payload shared by note-on and note-off events.
///
/// Also the element type of the reducer's held-note stack and of selection
/// policy candidate lists. `pitch` is a 7-bit MIDI key (0..=127).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
}

/// What an event is: a note boundary or an opaque passthrough message
/// (meta, control change, pitch bend, sysex...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind<'a> {
    NoteOn(Note),
    NoteOff(Note),
    Other(TrackEventKind<'a>),
}

/// A single timed event: a delta in ticks since the previous event in the
/// same stream, plus its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event<'a> {
    pub delta: u32,
    pub kind: EventKind<'a>,
}

impl<'a> Event<'a> {
    pub fn note_on(delta: u32, note: Note) -> Self {
        Event {
            delta,
            kind: EventKind::NoteOn(note),
        }
    }

    pub fn note_off(delta: u32, note: Note) -> Self {
        Event {
            delta,
            kind: EventKind::NoteOff(note),
        }
    }

    pub fn other(delta: u32, kind: TrackEventKind<'a>) -> Self {
        Event {
            delta,
            kind: EventKind::Other(kind),
        }
    }

    /// True only for note-on and note-off events.
    pub fn is_note(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn(_) | EventKind::NoteOff(_))
    }

    /// The channel this event is addressed to, if it has one.
    ///
    /// Note events always do; passthrough events only when they are channel
    /// voice messages (meta and sysex events return `None`).
    pub fn channel(&self) -> Option<u8> {
        match self.kind {
            EventKind::NoteOn(note) | EventKind::NoteOff(note) => Some(note.channel),
            EventKind::Other(TrackEventKind::Midi { channel, .. }) => Some(channel.as_int()),
            EventKind::Other(_) => None,
        }
    }

    /// A copy of this event with its delta replaced.
    pub fn with_delta(self, delta: u32) -> Self {
        Event { delta, ..self }
    }

    /// A copy of this event with its channel rewritten.
    ///
    /// Events without a channel are returned unchanged.
    pub fn with_channel(self, channel: u8) -> Self {
        let kind = match self.kind {
            EventKind::NoteOn(note) => EventKind::NoteOn(Note { channel, ..note }),
            EventKind::NoteOff(note) => EventKind::NoteOff(Note { channel, ..note }),
            EventKind::Other(TrackEventKind::Midi { message, .. }) => {
                EventKind::Other(TrackEventKind::Midi {
                    channel: channel.into(),
                    message,
                })
            }
            other => other,
        };
        Event { kind, ..self }
    }
}
