use thiserror::Error;

/// Errors raised while turning notation and songbook data into playable events.
///
/// Every variant is detected before any audio node is created, so a failing
/// call never leaves partially built playback state behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuneError {
    /// The part does not start with a three-letter uppercase instrument id
    #[error("malformed notation {notation:?}: expected a three-letter uppercase instrument header")]
    MalformedNotation { notation: String },

    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("unknown track '{0}'")]
    UnknownTrack(String),

    /// Tempo must be a finite, strictly positive number of beats per minute
    #[error("invalid tempo {0} bpm")]
    InvalidTempo(f64),

    /// A zero-length event sequence was asked to loop
    #[error("cannot loop a sequence with zero total duration")]
    DegenerateLoop,

    #[error("invalid instrument '{id}': {reason}")]
    InvalidInstrument { id: String, reason: String },

    #[error("invalid songbook: {0}")]
    InvalidSongbook(String),
}

pub type Result<T> = std::result::Result<T, TuneError>;
