//! Groups a flat delta-timed event stream into simultaneity groups.
//!
//! A group is an ordered run of events that all happen at the same instant:
//! the group's `advance` is the real delta since the previous group, and every
//! event inside the group carries a delta of zero by construction. The reducer
//! consumes the stream one group at a time so that it can see a whole chord
//! (or a release and a re-attack on the same tick) at once.

use crate::event::Event;

/// An ordered, non-empty run of events occurring at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    /// Ticks elapsed since the previous group.
    pub advance: u32,
    /// The simultaneous events, deltas all zero.
    pub events: Vec<Event<'a>>,
}

/// Partition a flat event stream into simultaneity groups.
///
/// An event with a non-zero delta closes the current group and starts the
/// next one, donating its delta as the new group's `advance`. The whole input
/// is realised eagerly; an empty input yields no groups.
pub fn group_by_time(events: Vec<Event<'_>>) -> Vec<Group<'_>> {
    let mut groups = Vec::new();
    let mut iter = events.into_iter();

    let first = match iter.next() {
        Some(event) => event,
        None => return groups,
    };
    let mut current = Group {
        advance: first.delta,
        events: vec![first.with_delta(0)],
    };

    for event in iter {
        if event.delta == 0 {
            current.events.push(event);
        } else {
            groups.push(current);
            current = Group {
                advance: event.delta,
                events: vec![event.with_delta(0)],
            };
        }
    }
    groups.push(current);

    groups
}
