use crate::audio::context::NodeId;
use nanotune_core::TuneError;
use thiserror::Error;

/// Failures reported by the host audio graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The host declined to create a node of this kind
    #[error("audio graph refused to create {0} node")]
    NodeRefused(&'static str),

    #[error("unknown audio node {0}")]
    UnknownNode(NodeId),

    #[error("audio device error: {0}")]
    Device(String),
}

/// Everything `Engine::play` and `VoiceScheduler::start` can fail with
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Tune(#[from] TuneError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
