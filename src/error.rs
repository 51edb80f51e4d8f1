use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonoError {
    #[error("selection policy returned no notes for {candidates} simultaneous candidates")]
    InvalidPolicyResult { candidates: usize },

    #[error("more than one note sounding at event {position} (pitch {pitch})")]
    OverlappingNotes { position: usize, pitch: u8 },

    #[error("notes still sounding at end of track: {pitches:?}")]
    UnterminatedNotes { pitches: Vec<u8> },

    #[error("track {index} does not exist (file has {tracks} tracks)")]
    TrackOutOfRange { index: usize, tracks: usize },

    #[error("malformed MIDI file: {0}")]
    MalformedFile(#[from] midly::Error),

    #[error("failed to encode MIDI file: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
