//! Voice scheduling against the audio clock
//!
//! Each started voice has its whole event sequence programmed into the
//! audio graph up front, anchored at the audio time of the call. A single
//! completion timer per voice, due at `anchor + total`, then either ends the
//! voice or re-programs the sequence from a fresh anchor when looping.
//!
//! Timers live in a min-heap and fire from [`VoiceScheduler::poll`], which
//! the owner drives (the REPL calls it on a short tick). Timers are tagged
//! with the scheduler epoch and are discarded on fire when the epoch has
//! moved on or their voice was cancelled, so a late timer can never
//! program or revive a voice after a stop.

use super::context::{AudioContext, NodeId};
use super::signal_chain::SignalChain;
use crate::error::PlaybackError;
use nanotune_core::types::total_seconds;
use nanotune_core::{ConvertedEvent, TuneError};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use tracing::{debug, trace};

/// Identifies a started voice for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(u64);

impl fmt::Display for VoiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice-{}", self.0)
    }
}

/// Runs once when a non-looping voice reaches the end of its sequence
pub type NaturalEndCallback = Box<dyn FnOnce(VoiceHandle)>;

/// One running oscillator and the effect nodes behind it.
///
/// Owns its nodes; [`Voice::release`] consumes the voice so it can only be
/// stopped and disconnected once.
#[derive(Debug)]
pub struct Voice {
    chain: SignalChain,
}

impl Voice {
    pub fn new(chain: SignalChain) -> Self {
        Self { chain }
    }

    pub fn oscillator(&self) -> NodeId {
        self.chain.entry
    }

    /// Stop the oscillator now and disconnect every node of the chain
    pub fn release<C: AudioContext + ?Sized>(self, ctx: &mut C) {
        let now = ctx.current_time();
        ctx.stop(self.chain.entry, now);
        self.discard(ctx);
    }

    /// Disconnect every node of a voice whose oscillator never started
    pub fn discard<C: AudioContext + ?Sized>(self, ctx: &mut C) {
        for node in self.chain.nodes {
            ctx.disconnect(node);
        }
    }
}

/// A loop of `total` seconds restarted at `anchor` would never move its
/// deadline forward: either the sequence is empty or `total` is below the
/// clock's f64 resolution at `anchor`.
pub fn is_degenerate_loop(anchor: f64, total: f64) -> bool {
    total <= 0.0 || anchor + total <= anchor
}

struct VoiceTask {
    voice: Voice,
    events: Vec<ConvertedEvent>,
    looping: bool,
    total: f64,
    epoch: u64,
    passes: u64,
    on_natural_end: Option<NaturalEndCallback>,
}

struct CompletionTimer {
    due: f64,
    handle: VoiceHandle,
    epoch: u64,
}

impl PartialEq for CompletionTimer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompletionTimer {}

impl PartialOrd for CompletionTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompletionTimer {
    // Reversed so BinaryHeap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

#[derive(Default)]
pub struct VoiceScheduler {
    epoch: u64,
    next_handle: u64,
    tasks: HashMap<VoiceHandle, VoiceTask>,
    timers: BinaryHeap<CompletionTimer>,
    /// Voices that ended inside `start`, reported by the next `poll`
    ended_early: Vec<VoiceHandle>,
}

impl VoiceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `voice` now and program `events` back to back from the current
    /// audio time.
    ///
    /// A looping voice whose deadline could not advance past the anchor is
    /// rejected with `DegenerateLoop` and its unstarted nodes are
    /// disconnected. A non-looping voice with no events is released at once
    /// and its callback runs before this returns.
    pub fn start<C: AudioContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        voice: Voice,
        events: Vec<ConvertedEvent>,
        looping: bool,
        on_natural_end: Option<NaturalEndCallback>,
    ) -> Result<VoiceHandle, PlaybackError> {
        let total = total_seconds(&events);
        let anchor = ctx.current_time();
        if looping && is_degenerate_loop(anchor, total) {
            voice.discard(ctx);
            return Err(TuneError::DegenerateLoop.into());
        }

        let handle = VoiceHandle(self.next_handle);
        self.next_handle += 1;

        ctx.start(voice.oscillator(), anchor);
        program(ctx, voice.oscillator(), &events, anchor);

        if events.is_empty() {
            debug!(%handle, "empty sequence, voice ends immediately");
            voice.release(ctx);
            if let Some(callback) = on_natural_end {
                callback(handle);
            }
            self.ended_early.push(handle);
            return Ok(handle);
        }

        debug!(%handle, events = events.len(), total, looping, "voice started");
        self.timers.push(CompletionTimer {
            due: anchor + total,
            handle,
            epoch: self.epoch,
        });
        self.tasks.insert(
            handle,
            VoiceTask {
                voice,
                events,
                looping,
                total,
                epoch: self.epoch,
                passes: 1,
                on_natural_end,
            },
        );
        Ok(handle)
    }

    /// Stop and release a voice. Returns false if it had already ended or
    /// been cancelled.
    pub fn cancel<C: AudioContext + ?Sized>(&mut self, ctx: &mut C, handle: VoiceHandle) -> bool {
        match self.tasks.remove(&handle) {
            Some(task) => {
                debug!(%handle, "voice cancelled");
                task.voice.release(ctx);
                true
            }
            None => false,
        }
    }

    /// Cancel every voice and invalidate all outstanding timers
    pub fn cancel_all<C: AudioContext + ?Sized>(&mut self, ctx: &mut C) {
        for (_, task) in self.tasks.drain() {
            task.voice.release(ctx);
        }
        self.ended_early.clear();
        self.advance_epoch();
    }

    /// Timers armed before this call become no-ops
    fn advance_epoch(&mut self) {
        self.epoch += 1;
        trace!(epoch = self.epoch, "scheduler epoch advanced");
    }

    /// Fire every completion timer that is due on the audio clock.
    ///
    /// Returns the voices that ended naturally since the last poll. A looping
    /// voice restarts at most once per call; its next timer is armed after
    /// the due timers have drained.
    pub fn poll<C: AudioContext + ?Sized>(&mut self, ctx: &mut C) -> Vec<VoiceHandle> {
        let now = ctx.current_time();
        let mut ended = std::mem::take(&mut self.ended_early);
        let mut rearmed = Vec::new();

        while self.timers.peek().is_some_and(|timer| timer.due <= now) {
            let Some(timer) = self.timers.pop() else {
                break;
            };
            let live = timer.epoch == self.epoch
                && self
                    .tasks
                    .get(&timer.handle)
                    .is_some_and(|task| task.epoch == timer.epoch);
            if !live {
                trace!(handle = %timer.handle, "stale completion timer discarded");
                continue;
            }

            let looping = self
                .tasks
                .get(&timer.handle)
                .is_some_and(|task| task.looping);

            if looping {
                if let Some(task) = self.tasks.get_mut(&timer.handle) {
                    let anchor = ctx.current_time();
                    program(ctx, task.voice.oscillator(), &task.events, anchor);
                    task.passes += 1;
                    trace!(handle = %timer.handle, pass = task.passes, anchor, "loop restarted");
                    rearmed.push(CompletionTimer {
                        due: anchor + task.total,
                        handle: timer.handle,
                        epoch: self.epoch,
                    });
                }
            } else if let Some(task) = self.tasks.remove(&timer.handle) {
                debug!(handle = %timer.handle, "voice reached end of sequence");
                task.voice.release(ctx);
                if let Some(callback) = task.on_natural_end {
                    callback(timer.handle);
                }
                ended.push(timer.handle);
            }
        }

        self.timers.extend(rearmed);
        ended
    }

    pub fn is_active(&self, handle: VoiceHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// How many times a voice's sequence has been programmed
    pub fn passes(&self, handle: VoiceHandle) -> Option<u64> {
        self.tasks.get(&handle).map(|task| task.passes)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Earliest pending deadline, stale timers included
    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.peek().map(|timer| timer.due)
    }
}

/// Step the oscillator through `events` contiguously from `anchor`
fn program<C: AudioContext + ?Sized>(
    ctx: &mut C,
    oscillator: NodeId,
    events: &[ConvertedEvent],
    anchor: f64,
) {
    let mut cursor = 0.0;
    for event in events {
        ctx.set_frequency_at(oscillator, event.hz, anchor + cursor);
        cursor += event.seconds;
    }
}
