//! Standard MIDI File adapter.
//!
//! Everything that touches the container format lives here: decoding an SMF
//! into the crate's event model, merging a chosen set of tracks into one
//! time-ordered stream, filtering and remapping channels, and encoding the
//! reduced stream back into a single-track file. The reduction core never
//! sees `midly` types other than the opaque passthrough payload.

use midly::{MetaMessage, MidiMessage, Smf, Track, TrackEvent, TrackEventKind};

use crate::error::MonoError;
use crate::event::{Event, EventKind, Note};

/// Decode an SMF from an in-memory byte buffer.
///
/// The returned file borrows from `bytes`, which must outlive the whole
/// pipeline run.
pub fn parse(bytes: &[u8]) -> Result<Smf<'_>, MonoError> {
    Ok(Smf::parse(bytes)?)
}

/// Merge the tracks named by `include` into one time-ordered event stream.
///
/// Tracks are laid out on a shared absolute-time axis and stably sorted, so
/// events at the same instant keep the order of the `include` list. Per-track
/// end-of-track markers are dropped and a single one is re-issued at the
/// latest end time of any merged track, preserving trailing silence.
pub fn merge_tracks<'a>(smf: &Smf<'a>, include: &[usize]) -> Result<Vec<Event<'a>>, MonoError> {
    for &index in include {
        if index >= smf.tracks.len() {
            return Err(MonoError::TrackOutOfRange {
                index,
                tracks: smf.tracks.len(),
            });
        }
    }

    let mut timed: Vec<(u64, Event<'a>)> = Vec::new();
    let mut end_time = 0u64;
    for &index in include {
        let mut at = 0u64;
        for event in &smf.tracks[index] {
            at += u64::from(event.delta.as_int());
            if let TrackEventKind::Meta(MetaMessage::EndOfTrack) = event.kind {
                continue;
            }
            timed.push((at, Event { delta: 0, kind: from_kind(event.kind) }));
        }
        end_time = end_time.max(at);
    }

    // Stable, so simultaneous events resolve in `include` order.
    timed.sort_by_key(|&(at, _)| at);
    timed.push((
        end_time,
        Event::other(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ));

    tracing::debug!(tracks = include.len(), events = timed.len(), "merged tracks");

    let mut events = Vec::with_capacity(timed.len());
    let mut previous = 0u64;
    for (at, event) in timed {
        events.push(event.with_delta((at - previous) as u32));
        previous = at;
    }
    Ok(events)
}

/// Keep only events whose channel is in `allowed` (plus every channel-less
/// event), folding each dropped event's delta into the next survivor so the
/// total elapsed time never changes.
pub fn filter_channels<'a>(events: Vec<Event<'a>>, allowed: &[u8]) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut carry = 0u32;
    for event in events {
        match event.channel() {
            Some(channel) if !allowed.contains(&channel) => carry += event.delta,
            _ => {
                let delta = event.delta + carry;
                out.push(event.with_delta(delta));
                carry = 0;
            }
        }
    }
    out
}

/// Rewrite every channel-bearing event onto `target`; the rest pass through.
pub fn remap_channel<'a>(events: Vec<Event<'a>>, target: u8) -> Vec<Event<'a>> {
    events
        .into_iter()
        .map(|event| event.with_channel(target))
        .collect()
}

/// Encode an event stream as a single-track SMF, reusing the input file's
/// header so the timing division (and thus every delta) keeps its meaning.
///
/// End-of-track markers in the stream are normalised away: the reducer may
/// emit one ahead of same-instant note events (passthrough events lead their
/// group), so every marker's delta is folded into the next event and a single
/// marker closes the track, carrying whatever trailing silence remains.
pub fn encode(header: midly::Header, events: &[Event<'_>]) -> Result<Vec<u8>, MonoError> {
    let mut track: Track<'_> = Vec::with_capacity(events.len() + 1);
    let mut carry = 0u32;
    for event in events {
        if let EventKind::Other(TrackEventKind::Meta(MetaMessage::EndOfTrack)) = event.kind {
            carry += event.delta;
        } else {
            track.push(TrackEvent {
                delta: (event.delta + carry).into(),
                kind: to_kind(event.kind),
            });
            carry = 0;
        }
    }
    track.push(TrackEvent {
        delta: carry.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header,
        tracks: vec![track],
    };
    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| MonoError::Encode(e.to_string()))?;
    Ok(out)
}

fn from_kind(kind: TrackEventKind<'_>) -> EventKind<'_> {
    match kind {
        TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOn { key, vel },
        } => EventKind::NoteOn(Note {
            channel: channel.as_int(),
            pitch: key.as_int(),
            velocity: vel.as_int(),
        }),
        TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOff { key, vel },
        } => EventKind::NoteOff(Note {
            channel: channel.as_int(),
            pitch: key.as_int(),
            velocity: vel.as_int(),
        }),
        other => EventKind::Other(other),
    }
}

fn to_kind(kind: EventKind<'_>) -> TrackEventKind<'_> {
    match kind {
        EventKind::NoteOn(note) => TrackEventKind::Midi {
            channel: note.channel.into(),
            message: MidiMessage::NoteOn {
                key: note.pitch.into(),
                vel: note.velocity.into(),
            },
        },
        EventKind::NoteOff(note) => TrackEventKind::Midi {
            channel: note.channel.into(),
            message: MidiMessage::NoteOff {
                key: note.pitch.into(),
                vel: note.velocity.into(),
            },
        },
        EventKind::Other(other) => other,
    }
}
