pub mod audio;
pub mod context;
pub mod oscillator;
pub mod playback_engine;
pub mod recording;
pub mod scheduler;
pub mod signal_chain;

pub use audio::CpalContext;
pub use context::{AudioContext, NodeId};
pub use playback_engine::Engine;
pub use recording::{GraphCall, RecordingContext};
pub use scheduler::{NaturalEndCallback, Voice, VoiceHandle, VoiceScheduler};
pub use signal_chain::{SignalChain, SignalChainBuilder};
