//! In-memory audio graph with a manual clock
//!
//! Records every call it receives so tests can assert on what was
//! scheduled, and lets the caller move time forward explicitly.

use super::context::{AudioContext, NodeId};
use crate::error::GraphError;
use nanotune_core::{Effect, EffectKind, Waveform};
use std::collections::HashSet;

/// One call made against a [`RecordingContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCall {
    CreateOscillator { node: NodeId, waveform: Waveform },
    CreateEffect { node: NodeId, effect: Effect },
    Connect { from: NodeId, to: NodeId },
    Disconnect { node: NodeId },
    Start { node: NodeId, at: f64 },
    Stop { node: NodeId, at: f64 },
    SetFrequency { node: NodeId, hz: f64, at: f64 },
}

pub struct RecordingContext {
    now: f64,
    next_id: u64,
    nodes: HashSet<NodeId>,
    calls: Vec<GraphCall>,
    unsupported: HashSet<EffectKind>,
    refuse_oscillators: bool,
}

const DESTINATION: NodeId = NodeId(0);

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            nodes: HashSet::from([DESTINATION]),
            calls: Vec::new(),
            unsupported: HashSet::new(),
            refuse_oscillators: false,
        }
    }

    /// Report `kind` as unsupported by this host
    pub fn without_effect(mut self, kind: EffectKind) -> Self {
        self.unsupported.insert(kind);
        self
    }

    /// Make every subsequent oscillator creation fail
    pub fn refuse_oscillators(&mut self, refuse: bool) {
        self.refuse_oscillators = refuse;
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.now = seconds;
    }

    pub fn calls(&self) -> &[GraphCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// `(node, hz, at)` for every frequency step, in call order
    pub fn frequency_steps(&self) -> Vec<(NodeId, f64, f64)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                GraphCall::SetFrequency { node, hz, at } => Some((node, hz, at)),
                _ => None,
            })
            .collect()
    }

    pub fn oscillators(&self) -> Vec<NodeId> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                GraphCall::CreateOscillator { node, .. } => Some(node),
                _ => None,
            })
            .collect()
    }

    /// How many times `node` has been disconnected
    pub fn disconnect_count(&self, node: NodeId) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == GraphCall::Disconnect { node })
            .count()
    }

    pub fn stop_count(&self, node: NodeId) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GraphCall::Stop { node: n, .. } if *n == node))
            .count()
    }

    fn allocate(&mut self) -> NodeId {
        let node = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(node);
        node
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioContext for RecordingContext {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, GraphError> {
        if self.refuse_oscillators {
            return Err(GraphError::NodeRefused("oscillator"));
        }
        let node = self.allocate();
        self.calls.push(GraphCall::CreateOscillator { node, waveform });
        Ok(node)
    }

    fn supports(&self, kind: EffectKind) -> bool {
        !self.unsupported.contains(&kind)
    }

    fn create_effect(&mut self, effect: Effect) -> Result<NodeId, GraphError> {
        if !self.supports(effect.kind()) {
            return Err(GraphError::NodeRefused(match effect.kind() {
                EffectKind::Gain => "gain",
                EffectKind::StereoPanner => "stereo panner",
            }));
        }
        let node = self.allocate();
        self.calls.push(GraphCall::CreateEffect { node, effect });
        Ok(node)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        for node in [from, to] {
            if !self.nodes.contains(&node) {
                return Err(GraphError::UnknownNode(node));
            }
        }
        self.calls.push(GraphCall::Connect { from, to });
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) {
        self.calls.push(GraphCall::Disconnect { node });
    }

    fn start(&mut self, node: NodeId, at: f64) {
        self.calls.push(GraphCall::Start { node, at });
    }

    fn stop(&mut self, node: NodeId, at: f64) {
        self.calls.push(GraphCall::Stop { node, at });
    }

    fn set_frequency_at(&mut self, node: NodeId, hz: f64, at: f64) {
        self.calls.push(GraphCall::SetFrequency { node, hz, at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let mut ctx = RecordingContext::new();
        let osc = ctx.create_oscillator(Waveform::Square).unwrap();
        ctx.connect(osc, ctx.destination()).unwrap();
        ctx.set_frequency_at(osc, 440.0, 0.0);

        assert_eq!(ctx.calls().len(), 3);
        assert_eq!(ctx.frequency_steps(), vec![(osc, 440.0, 0.0)]);
        assert_eq!(ctx.oscillators(), vec![osc]);
    }

    #[test]
    fn test_connect_unknown_node_fails() {
        let mut ctx = RecordingContext::new();
        assert_eq!(
            ctx.connect(NodeId(42), DESTINATION),
            Err(GraphError::UnknownNode(NodeId(42)))
        );
    }

    #[test]
    fn test_refused_oscillator() {
        let mut ctx = RecordingContext::new();
        ctx.refuse_oscillators(true);
        assert!(ctx.create_oscillator(Waveform::Sine).is_err());
        assert!(ctx.calls().is_empty());
    }

    #[test]
    fn test_manual_clock() {
        let mut ctx = RecordingContext::new();
        assert_eq!(ctx.current_time(), 0.0);
        ctx.set_time(3.0);
        assert_eq!(ctx.current_time(), 3.0);
    }
}
