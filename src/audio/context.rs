//! The host audio graph seen by the scheduler
//!
//! Everything nanotune does to make sound goes through [`AudioContext`]:
//! node creation, wiring, oscillator start/stop and frequency automation
//! against the context's own clock. `RecordingContext` implements it in
//! memory for tests; `CpalContext` renders it to the default output device.

use crate::error::GraphError;
use nanotune_core::{Effect, EffectKind, Waveform};
use std::fmt;

/// Opaque handle to a node in the host graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait AudioContext {
    /// Seconds on the audio clock. Monotonic; all scheduling is relative to it.
    fn current_time(&self) -> f64;

    /// The final output node
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, GraphError>;

    /// Whether the host can create effect nodes of this kind
    fn supports(&self, _kind: EffectKind) -> bool {
        true
    }

    fn create_effect(&mut self, effect: Effect) -> Result<NodeId, GraphError>;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError>;

    /// Detach a node from everything downstream of it
    fn disconnect(&mut self, node: NodeId);

    fn start(&mut self, oscillator: NodeId, at: f64);

    fn stop(&mut self, oscillator: NodeId, at: f64);

    /// Step the oscillator to `hz` at audio time `at`. 0 Hz is silence.
    fn set_frequency_at(&mut self, oscillator: NodeId, hz: f64, at: f64);
}

impl<C: AudioContext + ?Sized> AudioContext for Box<C> {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn destination(&self) -> NodeId {
        (**self).destination()
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, GraphError> {
        (**self).create_oscillator(waveform)
    }

    fn supports(&self, kind: EffectKind) -> bool {
        (**self).supports(kind)
    }

    fn create_effect(&mut self, effect: Effect) -> Result<NodeId, GraphError> {
        (**self).create_effect(effect)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        (**self).connect(from, to)
    }

    fn disconnect(&mut self, node: NodeId) {
        (**self).disconnect(node)
    }

    fn start(&mut self, oscillator: NodeId, at: f64) {
        (**self).start(oscillator, at)
    }

    fn stop(&mut self, oscillator: NodeId, at: f64) {
        (**self).stop(oscillator, at)
    }

    fn set_frequency_at(&mut self, oscillator: NodeId, hz: f64, at: f64) {
        (**self).set_frequency_at(oscillator, hz, at)
    }
}
