//! # Nanotune Core
//!
//! WASM-compatible core library for nanotune, a compact textual music
//! notation rendered as timed tone events. Provides the notation parser,
//! pitch and duration conversion, and the songbook types without any
//! audio-graph dependency.
//!
//! ## Features
//!
//! - **serde**: Enable JSON songbook loading and saving
//!
//! ## Example
//!
//! ```
//! use nanotune_core::parser::parse;
//!
//! let part = parse("GTRA44B44").unwrap();
//! assert_eq!(part.instrument_id, "GTR");
//! assert_eq!(part.tokens.len(), 2);
//! ```

pub mod error;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TuneError};
pub use parser::{parse, ParsedPart};
pub use types::{
    ConvertedEvent, Effect, EffectKind, Instrument, InstrumentRegistry, NoteEvent, PitchClass,
    Songbook, Track, TrackRegistry, Waveform,
};
