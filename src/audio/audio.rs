//! Real-time audio context on the default output device
//!
//! Graph calls are forwarded over a channel to a [`Renderer`] that runs
//! inside the cpal output callback. The renderer owns every node, applies
//! queued commands at the start of each block and mixes all sounding
//! oscillators through their gain and pan nodes. The audio clock is the
//! number of frames rendered so far.

use super::context::{AudioContext, NodeId};
use super::oscillator::ToneOscillator;
use crate::error::GraphError;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{unbounded, Receiver, Sender};
use nanotune_core::{Effect, Waveform};
use std::collections::{HashMap, HashSet};
use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, trace};

/// Mix headroom so a few full-scale voices don't clip
const MASTER_LEVEL: f32 = 0.25;

const DESTINATION: NodeId = NodeId(0);

/// Graph operations sent to the render thread
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCommand {
    AddOscillator { id: NodeId, waveform: Waveform },
    AddEffect { id: NodeId, effect: Effect },
    Connect { from: NodeId, to: NodeId },
    Disconnect(NodeId),
    Start { id: NodeId, at: f64 },
    Stop { id: NodeId, at: f64 },
    SetFrequency { id: NodeId, hz: f64, at: f64 },
}

enum RenderNode {
    Oscillator(ToneOscillator),
    Gain(f32),
    Pan(f32),
}

struct NodeState {
    node: RenderNode,
    output: Option<NodeId>,
}

/// The render-thread half of [`CpalContext`]
pub struct Renderer {
    nodes: HashMap<NodeId, NodeState>,
    commands: Receiver<GraphCommand>,
    frames: Arc<AtomicU64>,
    sample_rate: f64,
    /// Oscillator ids for the current block, reused across callbacks
    oscillators: Vec<NodeId>,
}

impl Renderer {
    pub fn new(commands: Receiver<GraphCommand>, frames: Arc<AtomicU64>, sample_rate: f64) -> Self {
        Self {
            nodes: HashMap::new(),
            commands,
            frames,
            sample_rate,
            oscillators: Vec::with_capacity(16),
        }
    }

    fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::AddOscillator { id, waveform } => {
                let osc = ToneOscillator::new(waveform, self.sample_rate as f32);
                self.nodes.insert(
                    id,
                    NodeState {
                        node: RenderNode::Oscillator(osc),
                        output: None,
                    },
                );
            }
            GraphCommand::AddEffect { id, effect } => {
                let node = match effect {
                    Effect::Gain(level) => RenderNode::Gain(level),
                    Effect::Pan(position) => RenderNode::Pan(position),
                };
                self.nodes.insert(id, NodeState { node, output: None });
            }
            GraphCommand::Connect { from, to } => {
                if let Some(state) = self.nodes.get_mut(&from) {
                    state.output = Some(to);
                }
            }
            // A disconnected node can never be reached again; drop it
            GraphCommand::Disconnect(id) => {
                self.nodes.remove(&id);
            }
            GraphCommand::Start { id, at } => {
                if let Some(RenderNode::Oscillator(osc)) = self.node_mut(id) {
                    osc.start(at);
                }
            }
            GraphCommand::Stop { id, at } => {
                if let Some(RenderNode::Oscillator(osc)) = self.node_mut(id) {
                    osc.stop(at);
                }
            }
            GraphCommand::SetFrequency { id, hz, at } => {
                if let Some(RenderNode::Oscillator(osc)) = self.node_mut(id) {
                    osc.set_frequency_at(hz as f32, at);
                }
            }
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(&id).map(|state| &mut state.node)
    }

    /// Fill an interleaved buffer with `channels` channels per frame
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }

        let channels = channels.max(1);
        let mut frame_index = self.frames.load(Ordering::Relaxed);
        let mut oscillators = std::mem::take(&mut self.oscillators);
        oscillators.clear();
        oscillators.extend(
            self.nodes
                .iter()
                .filter(|(_, state)| matches!(state.node, RenderNode::Oscillator(_)))
                .map(|(id, _)| *id),
        );

        for frame in out.chunks_mut(channels) {
            let time = frame_index as f64 / self.sample_rate;
            let (mut left, mut right) = (0.0f32, 0.0f32);

            for id in &oscillators {
                let sample = match self.node_mut(*id) {
                    Some(RenderNode::Oscillator(osc)) => osc.next_sample(time),
                    _ => continue,
                };
                if sample == 0.0 {
                    continue;
                }
                if let Some((l, r)) = self.route(*id, sample) {
                    left += l;
                    right += r;
                }
            }

            left = (left * MASTER_LEVEL).clamp(-1.0, 1.0);
            right = (right * MASTER_LEVEL).clamp(-1.0, 1.0);
            match frame {
                [mono] => *mono = 0.5 * (left + right),
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
            frame_index += 1;
        }

        self.frames.store(frame_index, Ordering::Relaxed);
        self.oscillators = oscillators;
    }

    /// Follow a signal from `source` to the destination, returning its
    /// stereo contribution, or `None` if the chain is not connected.
    fn route(&self, source: NodeId, sample: f32) -> Option<(f32, f32)> {
        let (mut left, mut right) = (sample, sample);
        let mut current = self.nodes.get(&source)?.output?;

        for _ in 0..=self.nodes.len() {
            if current == DESTINATION {
                return Some((left, right));
            }
            let state = self.nodes.get(&current)?;
            match state.node {
                RenderNode::Gain(level) => {
                    left *= level;
                    right *= level;
                }
                RenderNode::Pan(position) => {
                    // Equal-power pan of the downmixed signal
                    let mono = 0.5 * (left + right);
                    let x = (position.clamp(-1.0, 1.0) + 1.0) * 0.5;
                    left = mono * (x * FRAC_PI_2).cos();
                    right = mono * (x * FRAC_PI_2).sin();
                }
                RenderNode::Oscillator(_) => return None,
            }
            current = state.output?;
        }
        None
    }
}

/// [`AudioContext`] backed by the default cpal output device
pub struct CpalContext {
    _stream: Stream,
    commands: Sender<GraphCommand>,
    frames: Arc<AtomicU64>,
    sample_rate: f64,
    next_id: u64,
    live: HashSet<NodeId>,
}

impl CpalContext {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;
        let config = device.default_output_config()?;

        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let sample_rate = config.sample_rate.0 as f64;

        let (tx, rx) = unbounded();
        let frames = Arc::new(AtomicU64::new(0));
        let renderer = Renderer::new(rx, frames.clone(), sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, renderer)?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, renderer)?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, renderer)?,
            _ => return Err(anyhow!("Unsupported sample format: {:?}", sample_format)),
        };
        stream
            .play()
            .map_err(|e| anyhow!("Failed to play stream: {}", e))?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels = config.channels,
            "audio output ready"
        );

        Ok(Self {
            _stream: stream,
            commands: tx,
            frames,
            sample_rate,
            next_id: 1,
            live: HashSet::from([DESTINATION]),
        })
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        mut renderer: Renderer,
    ) -> Result<Stream>
    where
        T: Sample + SizedSample + Send + 'static + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let mut scratch: Vec<f32> = Vec::new();

        let err_fn = |err| error!("an error occurred on the output audio stream: {:?}", err);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    renderer.render(&mut scratch, channels);
                    for (out, value) in data.iter_mut().zip(scratch.iter()) {
                        *out = T::from_sample(*value);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| anyhow!("Failed to build output stream: {}", e))?;

        Ok(stream)
    }

    fn send(&self, command: GraphCommand) -> Result<(), GraphError> {
        self.commands
            .send(command)
            .map_err(|_| GraphError::Device("audio stream closed".to_string()))
    }

    fn send_quiet(&self, command: GraphCommand) {
        if self.send(command).is_err() {
            trace!("dropping graph command, audio stream closed");
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        id
    }
}

impl AudioContext for CpalContext {
    fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Relaxed) as f64 / self.sample_rate
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, GraphError> {
        let id = self.allocate();
        self.send(GraphCommand::AddOscillator { id, waveform })?;
        Ok(id)
    }

    fn create_effect(&mut self, effect: Effect) -> Result<NodeId, GraphError> {
        let id = self.allocate();
        self.send(GraphCommand::AddEffect { id, effect })?;
        Ok(id)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        for node in [from, to] {
            if !self.live.contains(&node) {
                return Err(GraphError::UnknownNode(node));
            }
        }
        self.send(GraphCommand::Connect { from, to })
    }

    fn disconnect(&mut self, node: NodeId) {
        if self.live.remove(&node) {
            self.send_quiet(GraphCommand::Disconnect(node));
        }
    }

    fn start(&mut self, oscillator: NodeId, at: f64) {
        self.send_quiet(GraphCommand::Start { id: oscillator, at });
    }

    fn stop(&mut self, oscillator: NodeId, at: f64) {
        self.send_quiet(GraphCommand::Stop { id: oscillator, at });
    }

    fn set_frequency_at(&mut self, oscillator: NodeId, hz: f64, at: f64) {
        self.send_quiet(GraphCommand::SetFrequency {
            id: oscillator,
            hz,
            at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 1000.0;

    fn renderer() -> (Sender<GraphCommand>, Renderer, Arc<AtomicU64>) {
        let (tx, rx) = unbounded();
        let frames = Arc::new(AtomicU64::new(0));
        (tx, Renderer::new(rx, frames.clone(), RATE), frames)
    }

    fn square_voice(tx: &Sender<GraphCommand>, effects: &[Effect]) {
        let osc = NodeId(1);
        tx.send(GraphCommand::AddOscillator {
            id: osc,
            waveform: Waveform::Square,
        })
        .unwrap();
        let mut tail = osc;
        for (i, effect) in effects.iter().enumerate() {
            let id = NodeId(10 + i as u64);
            tx.send(GraphCommand::AddEffect { id, effect: *effect }).unwrap();
            tx.send(GraphCommand::Connect { from: tail, to: id }).unwrap();
            tail = id;
        }
        tx.send(GraphCommand::Connect {
            from: tail,
            to: DESTINATION,
        })
        .unwrap();
        tx.send(GraphCommand::Start { id: osc, at: 0.0 }).unwrap();
        tx.send(GraphCommand::SetFrequency {
            id: osc,
            hz: 100.0,
            at: 0.0,
        })
        .unwrap();
    }

    #[test]
    fn test_render_advances_clock() {
        let (_tx, mut renderer, frames) = renderer();
        let mut buf = vec![0.0; 64];
        renderer.render(&mut buf, 2);
        assert_eq!(frames.load(Ordering::Relaxed), 32);
    }

    #[test]
    fn test_silence_without_voices() {
        let (_tx, mut renderer, _) = renderer();
        let mut buf = vec![1.0; 16];
        renderer.render(&mut buf, 2);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_gain_scales_output() {
        let (tx, mut renderer, _) = renderer();
        square_voice(&tx, &[Effect::Gain(0.5)]);
        let mut buf = vec![0.0; 2];
        renderer.render(&mut buf, 2);
        assert!((buf[0] - 0.5 * MASTER_LEVEL).abs() < 1e-6);
        assert_eq!(buf[0], buf[1]);
    }

    #[test]
    fn test_hard_left_pan() {
        let (tx, mut renderer, _) = renderer();
        square_voice(&tx, &[Effect::Pan(-1.0)]);
        let mut buf = vec![0.0; 2];
        renderer.render(&mut buf, 2);
        assert!((buf[0] - MASTER_LEVEL).abs() < 1e-6);
        assert!(buf[1].abs() < 1e-6);
    }

    #[test]
    fn test_disconnected_voice_is_silent() {
        let (tx, mut renderer, _) = renderer();
        square_voice(&tx, &[]);
        tx.send(GraphCommand::Disconnect(NodeId(1))).unwrap();
        let mut buf = vec![0.0; 8];
        renderer.render(&mut buf, 2);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_oscillator_list_is_rebuilt_in_place() {
        let (tx, mut renderer, _) = renderer();
        square_voice(&tx, &[]);
        let mut buf = vec![0.0; 8];
        renderer.render(&mut buf, 2);
        assert_eq!(renderer.oscillators, vec![NodeId(1)]);
        let capacity = renderer.oscillators.capacity();

        tx.send(GraphCommand::Disconnect(NodeId(1))).unwrap();
        renderer.render(&mut buf, 2);
        assert!(renderer.oscillators.is_empty());
        assert_eq!(renderer.oscillators.capacity(), capacity);
        assert!(buf.iter().all(|s| *s == 0.0));
    }
}
