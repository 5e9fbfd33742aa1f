//! Builds the per-voice node chain: oscillator -> [gain] -> [pan] -> output

use super::context::{AudioContext, NodeId};
use crate::error::GraphError;
use nanotune_core::Instrument;
use tracing::{debug, warn};

/// The nodes built for one voice, oscillator first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalChain {
    /// The oscillator; frequency automation targets this node
    pub entry: NodeId,
    /// Last node in the chain, connected to the output
    pub terminal: NodeId,
    pub nodes: Vec<NodeId>,
}

pub struct SignalChainBuilder;

impl SignalChainBuilder {
    /// Create an oscillator with the instrument's waveform, append its
    /// effects in order and connect the last node to `output`.
    ///
    /// Effects the host cannot create are skipped with a warning. On a graph
    /// failure every node created so far is disconnected before the error
    /// is returned.
    pub fn build<C: AudioContext + ?Sized>(
        ctx: &mut C,
        instrument: &Instrument,
        output: NodeId,
    ) -> Result<SignalChain, GraphError> {
        let entry = ctx.create_oscillator(instrument.waveform)?;
        let mut nodes = vec![entry];

        match Self::append_effects(ctx, instrument, output, &mut nodes) {
            Ok(terminal) => {
                debug!(
                    oscillator = %entry,
                    waveform = instrument.waveform.name(),
                    nodes = nodes.len(),
                    "signal chain built"
                );
                Ok(SignalChain {
                    entry,
                    terminal,
                    nodes,
                })
            }
            Err(err) => {
                for node in nodes {
                    ctx.disconnect(node);
                }
                Err(err)
            }
        }
    }

    fn append_effects<C: AudioContext + ?Sized>(
        ctx: &mut C,
        instrument: &Instrument,
        output: NodeId,
        nodes: &mut Vec<NodeId>,
    ) -> Result<NodeId, GraphError> {
        let mut tail = nodes[0];

        for effect in instrument.effects() {
            if !ctx.supports(effect.kind()) {
                warn!(effect = ?effect.kind(), "host cannot create effect node, skipping");
                continue;
            }
            let node = ctx.create_effect(effect)?;
            nodes.push(node);
            ctx.connect(tail, node)?;
            tail = node;
        }

        ctx.connect(tail, output)?;
        Ok(tail)
    }
}
