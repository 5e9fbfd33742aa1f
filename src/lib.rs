//! # nanotune
//!
//! Plays tracks written in a compact textual notation through an
//! oscillator audio graph. Each track part becomes one voice: an oscillator
//! with optional gain and pan, whose frequency is stepped through the part's
//! notes at exact times on the audio clock. Tracks may loop indefinitely.
//!
//! ## Modules
//!
//! - `audio`: the [`audio::AudioContext`] seam, signal chains, the voice
//!   scheduler and the playback [`audio::Engine`], plus an in-memory and a
//!   cpal-backed context.
//! - `commands` and `repl`: the interactive player.
//! - `config`: songbook loading.
//!
//! Parsing and pitch/duration conversion live in `nanotune-core`.

pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod repl;

pub use crate::audio::{AudioContext, Engine, NodeId, RecordingContext};
pub use crate::error::{GraphError, PlaybackError};
pub use nanotune_core::{Songbook, TuneError};
