//! Selection policies: which of several simultaneous notes gets to sound.
//!
//! A policy reorders a non-empty set of simultaneous note-on candidates so
//! that the *last* element is the preferred one; the reducer pushes them onto
//! its stack in that order, so the last candidate lands on top and sounds.
//! Policies reorder only — they never drop or duplicate candidates, and ties
//! on pitch keep their original relative order.

use crate::event::Note;

/// Reorders simultaneous note-on candidates by priority, preferred note last.
///
/// Implementations must return a permutation of their input. The reducer
/// treats an empty result for a non-empty input as a contract violation and
/// fails fast rather than silently dropping a note.
pub trait NoteSelector {
    fn select(&self, candidates: Vec<Note>) -> Vec<Note>;
}

/// The built-in selection policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// The highest pitch wins.
    #[default]
    Highest,
    /// The lowest pitch wins.
    Lowest,
    /// The candidate that arrived last wins.
    Latest,
    /// The candidate that arrived first wins.
    Earliest,
}

impl NoteSelector for Policy {
    fn select(&self, mut candidates: Vec<Note>) -> Vec<Note> {
        match self {
            // Stable sorts, so equal pitches keep their arrival order.
            Policy::Highest => candidates.sort_by_key(|note| note.pitch),
            Policy::Lowest => candidates.sort_by_key(|note| std::cmp::Reverse(note.pitch)),
            Policy::Latest => {}
            Policy::Earliest => candidates.reverse(),
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, velocity: u8) -> Note {
        Note {
            channel: 0,
            pitch,
            velocity,
        }
    }

    // A3, C4, E3 in arrival order.
    fn candidates() -> Vec<Note> {
        vec![note(57, 1), note(60, 2), note(52, 3)]
    }

    #[test]
    fn test_highest_prefers_highest_pitch() {
        let out = Policy::Highest.select(candidates());
        assert_eq!(out.last().unwrap().pitch, 60);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_lowest_prefers_lowest_pitch() {
        let out = Policy::Lowest.select(candidates());
        assert_eq!(out.last().unwrap().pitch, 52);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_latest_returns_input_unchanged() {
        let out = Policy::Latest.select(candidates());
        assert_eq!(out, candidates());
    }

    #[test]
    fn test_earliest_reverses_arrival_order() {
        let out = Policy::Earliest.select(candidates());
        let mut expected = candidates();
        expected.reverse();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_pitch_ties_keep_arrival_order() {
        // Same pitch, distinguishable by velocity.
        let tied = vec![note(60, 1), note(60, 2), note(52, 3)];
        let out = Policy::Highest.select(tied);
        assert_eq!(out[1].velocity, 1);
        assert_eq!(out[2].velocity, 2);
    }
}
