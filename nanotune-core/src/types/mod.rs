// nanotune-core/src/types/mod.rs

pub mod audio_config;
pub mod note;
pub mod songbook;
pub mod time;
pub mod track;

pub use audio_config::{Effect, EffectKind, Instrument, Waveform};
pub use note::{to_hz, NoteEvent, PitchClass};
pub use songbook::{InstrumentRegistry, ResolvedPart, Songbook, TrackRegistry};
pub use time::{to_seconds, Beats};
pub use track::{convert_events, total_seconds, ConvertedEvent, Track};
