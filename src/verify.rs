//! Post-hoc check that a reduced stream really is monophonic and that every
//! note it starts is eventually released.
//!
//! The check mirrors what the reducer promises rather than general MIDI
//! semantics: a note-off zeroes its pitch's active count outright (the
//! reducer never stacks multiple ons of one pitch in the output), and more
//! than one active pitch at any instant is a hard failure.

use crate::error::MonoError;
use crate::event::{Event, EventKind};

/// One slot per MIDI key.
const PITCH_SLOTS: usize = 128;

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Never more than one note sounding, everything released.
    Clean,
    /// Never more than one note sounding, but this pitch was still on at the
    /// end of the stream. Only reachable with `tolerate_trailing_hold`.
    TrailingNote(u8),
}

/// Walk an event stream and confirm the monophonic invariant.
///
/// Fails with [`MonoError::OverlappingNotes`] the moment two pitches are
/// active at once, naming the offending event. At end of stream, a single
/// still-active pitch is tolerated (with a warning) when
/// `tolerate_trailing_hold` is set; anything else still active fails with
/// [`MonoError::UnterminatedNotes`].
pub fn verify(events: &[Event<'_>], tolerate_trailing_hold: bool) -> Result<Verification, MonoError> {
    let mut active = [0u32; PITCH_SLOTS];

    for (position, event) in events.iter().enumerate() {
        let pitch = match event.kind {
            EventKind::NoteOn(note) => {
                active[note.pitch as usize] += 1;
                note.pitch
            }
            EventKind::NoteOff(note) => {
                active[note.pitch as usize] = 0;
                note.pitch
            }
            EventKind::Other(_) => continue,
        };
        if active.iter().sum::<u32>() > 1 {
            return Err(MonoError::OverlappingNotes { position, pitch });
        }
    }

    let held: Vec<u8> = active
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(pitch, _)| pitch as u8)
        .collect();

    match held.len() {
        0 => Ok(Verification::Clean),
        1 if tolerate_trailing_hold => {
            let pitch = held[0];
            tracing::warn!(pitch, "a single note was left sounding at end of track");
            Ok(Verification::TrailingNote(pitch))
        }
        _ => Err(MonoError::UnterminatedNotes { pitches: held }),
    }
}
