//! # Monophonic reducer
//!
//! Collapses a grouped event stream to at most one sounding note at a time
//! while passing every non-note event through untouched.
//!
//! ## How notes are tracked
//! Notes that have been turned on but not yet turned off live on a held-note
//! stack, ordered least-preferred (bottom) to most-preferred (top) by the
//! active selection policy. Only the top of the stack is sounding; everything
//! below it is held silently. When the sounding note is released and held
//! notes remain underneath, the newly exposed top is re-attacked so a note
//! that was covered by another keeps sustaining once its cover goes away.
//!
//! ## How time is kept
//! Each group owes the output its `advance` ticks. The first event emitted
//! for a group is stamped with that delta (plus any carry) and the rest of
//! the group's output is stamped zero. A group that emits nothing — say its
//! only event was a release for a note that was never sounding — defers its
//! delta through the carry accumulator so the next productive group makes the
//! time up. No input time is ever dropped.
//!
//! ## What is emitted
//! Synthesized note-offs always use the released note's channel and pitch
//! with velocity zero. A re-attacked note reuses the velocity it was
//! originally played with. Incoming note-off events themselves are consumed,
//! never forwarded: the reducer emits a release only for the note that was
//! actually sounding.

use crate::error::MonoError;
use crate::event::{Event, EventKind, Note};
use crate::group::Group;
use crate::select::NoteSelector;

/// Reduce a grouped event stream to a monophonic event stream.
///
/// The held-note stack and carry accumulator are local to this call. The
/// output is a fresh, flat delta-timed stream; run it through
/// [`crate::verify::verify`] to check the monophonic invariant end to end.
pub fn reduce<'a>(
    groups: Vec<Group<'a>>,
    selector: &dyn NoteSelector,
) -> Result<Vec<Event<'a>>, MonoError> {
    let mut reducer = Reducer {
        stack: Vec::new(),
        carry: 0,
        out: Vec::new(),
    };
    for group in groups {
        reducer.process_group(group, selector)?;
    }
    if let Some(held) = reducer.stack.last() {
        tracing::debug!(pitch = held.pitch, held = reducer.stack.len(), "input ended with held notes");
    }
    Ok(reducer.out)
}

struct Reducer<'a> {
    /// Held notes, least preferred at the bottom, sounding note on top.
    stack: Vec<Note>,
    /// Ticks owed by groups that produced no output.
    carry: u32,
    out: Vec<Event<'a>>,
}

impl<'a> Reducer<'a> {
    fn process_group(
        &mut self,
        group: Group<'a>,
        selector: &dyn NoteSelector,
    ) -> Result<(), MonoError> {
        let delta = group.advance + self.carry;
        let start = self.out.len();

        // Split the group, preserving relative order within each part.
        let mut offs = Vec::new();
        let mut ons = Vec::new();
        for event in group.events {
            match event.kind {
                EventKind::NoteOn(note) => ons.push(note),
                EventKind::NoteOff(note) => offs.push(note),
                // Non-note events pass straight through, ahead of any
                // synthesized note events for this instant.
                EventKind::Other(_) => self.out.push(event),
            }
        }

        // Releases. Only the sounding note (stack top) produces output; every
        // matching off pops the freshest held entry for its pitch.
        let mut restart_top = false;
        if let Some(&top) = self.stack.last() {
            if offs.iter().any(|off| off.pitch == top.pitch) {
                self.out.push(Event::note_off(0, Note { velocity: 0, ..top }));
                // The note underneath is still held; re-attack it below
                // unless a new note arrives in this same group.
                restart_top = true;
            }
            for off in &offs {
                match self.stack.iter().rposition(|held| held.pitch == off.pitch) {
                    Some(index) => {
                        self.stack.remove(index);
                    }
                    None => {
                        tracing::debug!(pitch = off.pitch, "ignoring release for a pitch that is not held");
                    }
                }
            }
        }

        // Attacks.
        if !ons.is_empty() {
            if let Some(&top) = self.stack.last() {
                // Close out whatever was sounding before the new note starts.
                self.out.push(Event::note_off(0, Note { velocity: 0, ..top }));
            }
            let candidates = ons.len();
            let selected = selector.select(ons);
            let winner = match selected.last() {
                Some(&note) => note,
                None => return Err(MonoError::InvalidPolicyResult { candidates }),
            };
            self.stack.extend(selected);
            self.out.push(Event::note_on(0, winner));
        } else if restart_top {
            if let Some(&top) = self.stack.last() {
                self.out.push(Event::note_on(0, top));
            }
        }

        // The group's first emitted event carries its elapsed time; a silent
        // group defers it instead.
        if self.out.len() > start {
            self.out[start] = self.out[start].with_delta(delta);
            self.carry = 0;
        } else {
            self.carry = delta;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group_by_time;
    use crate::select::Policy;
    use crate::verify::{verify, Verification};
    use midly::{MetaMessage, TrackEventKind};

    fn note(pitch: u8) -> Note {
        Note {
            channel: 0,
            pitch,
            velocity: 64,
        }
    }

    fn on(delta: u32, pitch: u8) -> Event<'static> {
        Event::note_on(delta, note(pitch))
    }

    fn off(delta: u32, pitch: u8) -> Event<'static> {
        Event::note_off(delta, note(pitch))
    }

    fn synth_off(delta: u32, pitch: u8) -> Event<'static> {
        Event::note_off(
            delta,
            Note {
                channel: 0,
                pitch,
                velocity: 0,
            },
        )
    }

    fn tempo(delta: u32) -> Event<'static> {
        Event::other(delta, TrackEventKind::Meta(MetaMessage::Tempo(500_000.into())))
    }

    fn run(events: Vec<Event<'static>>, policy: Policy) -> Vec<Event<'static>> {
        reduce(group_by_time(events), &policy).expect("reduction should succeed")
    }

    const C4: u8 = 60;
    const E4: u8 = 64;
    const G4: u8 = 67;

    #[test]
    fn test_single_note_passes_through() {
        let out = run(vec![on(0, C4), off(10, C4)], Policy::Latest);
        assert_eq!(out, vec![on(0, C4), synth_off(10, C4)]);
    }

    #[test]
    fn test_overlapping_notes_never_overlap_in_output() {
        // C4 starts, E4 starts 10 ticks later, then both are released.
        let input = vec![on(0, C4), on(10, E4), off(5, C4), off(5, E4)];
        let out = run(input, Policy::Latest);

        // E4 cuts C4 off; C4's release group is silent (C4 was only held, not
        // sounding), so its 5 ticks carry into E4's release.
        assert_eq!(
            out,
            vec![
                on(0, C4),
                synth_off(10, C4),
                on(0, E4),
                synth_off(10, E4),
            ]
        );

        // Total elapsed time is conserved: 0 + 10 + 5 + 5 on the way in.
        let total: u32 = out.iter().map(|e| e.delta).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_restart_after_occluding_note_releases() {
        // C4 sounds, E4 covers it, E4 releases: C4 should come back.
        let input = vec![on(0, C4), on(10, E4), off(10, E4), off(10, C4)];
        let out = run(input, Policy::Latest);
        assert_eq!(
            out,
            vec![
                on(0, C4),
                synth_off(10, C4),
                on(0, E4),
                synth_off(10, E4),
                on(0, C4), // re-attack, same group as E4's release
                synth_off(10, C4),
            ]
        );
    }

    #[test]
    fn test_restart_reuses_original_velocity() {
        let loud = Note {
            channel: 0,
            pitch: C4,
            velocity: 100,
        };
        let input = vec![
            Event::note_on(0, loud),
            on(10, E4),
            off(10, E4),
            off(10, C4),
        ];
        let out = run(input, Policy::Latest);
        // The re-attacked C4 keeps the velocity it was first played with.
        assert_eq!(out[4], Event::note_on(0, loud));
    }

    #[test]
    fn test_chord_collapses_to_policy_winner() {
        let input = vec![on(0, E4), on(0, C4), on(0, G4), off(8, C4), off(0, E4), off(0, G4)];

        let highest = run(input.clone(), Policy::Highest);
        assert_eq!(highest[0], on(0, G4));

        let lowest = run(input.clone(), Policy::Lowest);
        assert_eq!(lowest[0], on(0, C4));

        let latest = run(input.clone(), Policy::Latest);
        assert_eq!(latest[0], on(0, G4));

        let earliest = run(input, Policy::Earliest);
        assert_eq!(earliest[0], on(0, E4));
    }

    #[test]
    fn test_release_for_unheld_pitch_is_a_noop() {
        let input = vec![on(0, C4), off(4, G4), off(4, C4)];
        let out = run(input, Policy::Latest);
        // The stray G4 release emits nothing; its 4 ticks carry forward.
        assert_eq!(out, vec![on(0, C4), synth_off(8, C4)]);
    }

    #[test]
    fn test_duplicate_releases_in_one_group_remove_one_entry_each() {
        // C4 held twice (re-attacked while already held), both releases in
        // one group: the stack must end empty, with one sounding release.
        let input = vec![on(0, C4), on(4, C4), off(4, C4), off(0, C4)];
        let out = run(input, Policy::Latest);
        assert_eq!(
            out,
            vec![
                on(0, C4),
                synth_off(4, C4), // second attack closes the first
                on(0, C4),
                synth_off(4, C4),
            ]
        );
        assert_eq!(
            verify(&out, false).expect("stack should be empty"),
            Verification::Clean
        );
    }

    #[test]
    fn test_silent_groups_accumulate_carry() {
        // Two stray releases in a row, then a real note: all the quiet time
        // lands on the next productive event.
        let input = vec![off(3, G4), off(4, G4), on(5, C4), off(1, C4)];
        let out = run(input, Policy::Latest);
        assert_eq!(out, vec![on(12, C4), synth_off(1, C4)]);
    }

    #[test]
    fn test_non_note_events_pass_through_in_order() {
        let input = vec![tempo(0), on(0, C4), tempo(7), off(3, C4)];
        let out = run(input.clone(), Policy::Latest);
        assert_eq!(
            out,
            vec![tempo(0), on(0, C4), tempo(7), synth_off(3, C4)]
        );

        // Passthrough events survive with total time intact even when every
        // note around them is dropped from the stack silently.
        let others_in: Vec<_> = input.iter().filter(|e| !e.is_note()).collect();
        let others_out: Vec<_> = out.iter().filter(|e| !e.is_note()).collect();
        assert_eq!(others_in.len(), others_out.len());
    }

    #[test]
    fn test_non_note_events_carry_the_group_delta() {
        // The passthrough event opens its group, so it gets the delta and the
        // synthesized note events that follow in the same instant get zero.
        let input = vec![on(0, C4), tempo(5), on(0, E4), off(2, E4), off(0, C4)];
        let out = run(input, Policy::Latest);
        assert_eq!(
            out,
            vec![
                on(0, C4),
                tempo(5),
                synth_off(0, C4),
                on(0, E4),
                // Both C4 and E4 release together, so nothing is re-attacked.
                synth_off(2, E4),
            ]
        );
    }

    #[test]
    fn test_reduction_is_deterministic() {
        let input = vec![on(0, C4), on(0, E4), on(3, G4), off(2, E4), off(1, G4), off(0, C4)];
        let first = run(input.clone(), Policy::Highest);
        let second = run(input, Policy::Highest);
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_is_monophonic_under_every_policy() {
        // A dense weave of overlapping chords and staggered releases.
        let input = vec![
            on(0, C4),
            on(0, E4),
            on(2, G4),
            off(1, C4),
            on(0, 72),
            off(3, G4),
            off(0, 72),
            on(1, C4),
            off(2, E4),
            off(1, C4),
        ];
        for policy in [Policy::Highest, Policy::Lowest, Policy::Latest, Policy::Earliest] {
            let out = run(input.clone(), policy);
            verify(&out, false)
                .unwrap_or_else(|e| panic!("policy {:?} broke monophony: {}", policy, e));
        }
    }

    #[test]
    fn test_empty_selector_result_fails_fast() {
        struct Broken;
        impl NoteSelector for Broken {
            fn select(&self, _candidates: Vec<Note>) -> Vec<Note> {
                Vec::new()
            }
        }

        let result = reduce(group_by_time(vec![on(0, C4)]), &Broken);
        assert!(matches!(
            result,
            Err(MonoError::InvalidPolicyResult { candidates: 1 })
        ));
    }

    #[test]
    fn test_empty_input_produces_empty_output() {
        let out = run(Vec::new(), Policy::Highest);
        assert!(out.is_empty());
    }
}
