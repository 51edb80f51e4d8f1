pub mod error;
pub mod event;
pub mod group;
pub mod midi;
pub mod reduce;
pub mod select;
pub mod verify;

pub use error::MonoError;
pub use event::{Event, EventKind, Note};
pub use group::{group_by_time, Group};
pub use reduce::reduce;
pub use select::{NoteSelector, Policy};
pub use verify::{verify, Verification};

use midly::Smf;

/// Settings for one processing run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Tracks to include; `None` means every track in the file.
    pub include_tracks: Option<Vec<usize>>,
    /// Tracks removed from the included set.
    pub exclude_tracks: Vec<usize>,
    /// Channels to include; `None` means all 16.
    pub include_channels: Option<Vec<u8>>,
    /// Channels removed from the included set.
    pub exclude_channels: Vec<u8>,
    /// Channel every surviving channel-bearing event is rewritten to.
    pub target_channel: u8,
    /// Which simultaneous note wins when a chord collapses to one voice.
    pub policy: Policy,
    /// Whether a single note left sounding at the end is a warning rather
    /// than an error.
    pub tolerate_trailing_hold: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            include_tracks: None,
            exclude_tracks: Vec::new(),
            include_channels: None,
            exclude_channels: Vec::new(),
            target_channel: 0,
            policy: Policy::default(),
            tolerate_trailing_hold: true,
        }
    }
}

/// The result of a successful processing run.
#[derive(Debug, Clone)]
pub struct Processed {
    /// The encoded single-track output file.
    pub bytes: Vec<u8>,
    /// The track indices that were actually merged.
    pub included_tracks: Vec<usize>,
    /// The channels that were actually kept.
    pub included_channels: Vec<u8>,
    /// Outcome of the final verification pass.
    pub verification: Verification,
}

/// Run the whole pipeline over an SMF byte buffer.
///
/// Decodes the file, merges the selected tracks, keeps the selected
/// channels, remaps everything onto one channel, reduces the stream to one
/// note at a time, verifies the result and encodes it back out. This is the
/// main entry point for the library.
pub fn process(bytes: &[u8], options: &Options) -> Result<Processed, MonoError> {
    let smf = midi::parse(bytes)?;
    process_smf(&smf, options)
}

/// Like [`process`], but for an already-decoded file.
pub fn process_smf(smf: &Smf<'_>, options: &Options) -> Result<Processed, MonoError> {
    let included_tracks = included_tracks(
        smf.tracks.len(),
        options.include_tracks.as_deref(),
        &options.exclude_tracks,
    );
    let included_channels =
        included_channels(options.include_channels.as_deref(), &options.exclude_channels);

    let merged = midi::merge_tracks(smf, &included_tracks)?;
    let filtered = midi::filter_channels(merged, &included_channels);
    let remapped = midi::remap_channel(filtered, options.target_channel);

    let reduced = reduce(group_by_time(remapped), &options.policy)?;
    let verification = verify(&reduced, options.tolerate_trailing_hold)?;

    let bytes = midi::encode(smf.header, &reduced)?;
    Ok(Processed {
        bytes,
        included_tracks,
        included_channels,
        verification,
    })
}

/// The final set of track indices: the inclusion list (default: every track)
/// minus the exclusion list.
pub fn included_tracks(total: usize, include: Option<&[usize]>, exclude: &[usize]) -> Vec<usize> {
    let base: Vec<usize> = match include {
        Some(list) => list.to_vec(),
        None => (0..total).collect(),
    };
    base.into_iter()
        .filter(|index| !exclude.contains(index))
        .collect()
}

/// The final set of channels: the inclusion list (default: all 16) minus the
/// exclusion list.
pub fn included_channels(include: Option<&[u8]>, exclude: &[u8]) -> Vec<u8> {
    let base: Vec<u8> = match include {
        Some(list) => list.to_vec(),
        None => (0..16).collect(),
    };
    base.into_iter()
        .filter(|channel| !exclude.contains(channel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_included_tracks_defaults_to_all() {
        assert_eq!(included_tracks(3, None, &[]), vec![0, 1, 2]);
    }

    #[test]
    fn test_included_tracks_exclusion_applies_after_default() {
        assert_eq!(included_tracks(4, None, &[1, 3]), vec![0, 2]);
    }

    #[test]
    fn test_included_tracks_keeps_inclusion_order() {
        assert_eq!(included_tracks(4, Some(&[2, 0]), &[]), vec![2, 0]);
    }

    #[test]
    fn test_excluding_an_absent_track_is_harmless() {
        assert_eq!(included_tracks(2, Some(&[0]), &[5]), vec![0]);
    }

    #[test]
    fn test_included_channels_defaults_to_sixteen() {
        assert_eq!(included_channels(None, &[]).len(), 16);
    }

    #[test]
    fn test_included_channels_exclusion() {
        let channels = included_channels(None, &[9]);
        assert_eq!(channels.len(), 15);
        assert!(!channels.contains(&9));
    }
}
