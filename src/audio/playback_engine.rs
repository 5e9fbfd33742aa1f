//! Track playback controller
//!
//! Owns the songbook, the host audio context and the voice scheduler, and
//! keeps at most one playback session (one voice per track part) alive at a
//! time. `play` validates the whole track before touching the current
//! session, so a bad request never interrupts what is already playing.

use super::context::AudioContext;
use super::scheduler::{is_degenerate_loop, Voice, VoiceHandle, VoiceScheduler};
use super::signal_chain::SignalChainBuilder;
use crate::error::PlaybackError;
use nanotune_core::types::total_seconds;
use nanotune_core::{InstrumentRegistry, Songbook, TrackRegistry, TuneError};
use tracing::{debug, info, warn};

/// Called once when every voice of a non-looping track has finished
pub type StopListener = Box<dyn FnMut(&str)>;

struct PlaybackSession {
    track: String,
    handles: Vec<VoiceHandle>,
}

pub struct Engine<C: AudioContext> {
    songbook: Songbook,
    context: C,
    scheduler: VoiceScheduler,
    session: Option<PlaybackSession>,
    on_stop: Option<StopListener>,
}

impl<C: AudioContext> Engine<C> {
    pub fn new(instruments: InstrumentRegistry, tracks: TrackRegistry, context: C) -> Self {
        Self::with_songbook(Songbook::new(instruments, tracks), context)
    }

    pub fn with_songbook(songbook: Songbook, context: C) -> Self {
        Self {
            songbook,
            context,
            scheduler: VoiceScheduler::new(),
            session: None,
            on_stop: None,
        }
    }

    /// Stop whatever is playing and start every part of `track_name`.
    ///
    /// Lookup, parsing, tempo and loop checks all run first; on any of those
    /// errors the current session keeps playing. A graph failure while
    /// building voices releases the voices already started and leaves no
    /// session.
    pub fn play(&mut self, track_name: &str) -> Result<(), PlaybackError> {
        let (track, parts) = self.songbook.resolve_track(track_name)?;
        let looping = track.looping;
        let now = self.context.current_time();
        if looping
            && parts
                .iter()
                .any(|part| is_degenerate_loop(now, total_seconds(&part.events)))
        {
            return Err(TuneError::DegenerateLoop.into());
        }

        self.stop();

        let output = self.context.destination();
        let mut handles = Vec::with_capacity(parts.len());
        for part in parts {
            let started =
                match SignalChainBuilder::build(&mut self.context, &part.instrument, output) {
                    Ok(chain) => self.scheduler.start(
                        &mut self.context,
                        Voice::new(chain),
                        part.events,
                        looping,
                        None,
                    ),
                    Err(err) => Err(err.into()),
                };

            match started {
                Ok(handle) => {
                    debug!(%handle, instrument = %part.instrument_id, "part started");
                    handles.push(handle);
                }
                Err(err) => {
                    warn!(track = track_name, error = %err, "failed to start track");
                    for handle in handles {
                        self.scheduler.cancel(&mut self.context, handle);
                    }
                    self.scheduler.cancel_all(&mut self.context);
                    return Err(err);
                }
            }
        }

        info!(track = track_name, voices = handles.len(), looping, "playing");
        self.session = Some(PlaybackSession {
            track: track_name.to_string(),
            handles,
        });
        Ok(())
    }

    /// Cancel every voice of the current session. Does nothing when idle.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        for handle in session.handles {
            self.scheduler.cancel(&mut self.context, handle);
        }
        self.scheduler.cancel_all(&mut self.context);
        info!(track = %session.track, "stopped");
    }

    /// Fire due completion timers. Call this regularly while playing.
    ///
    /// Returns how many voices ended naturally during this tick.
    pub fn tick(&mut self) -> usize {
        let ended = self.scheduler.poll(&mut self.context);
        if ended.is_empty() {
            return 0;
        }

        let finished = match self.session.as_mut() {
            Some(session) => {
                session.handles.retain(|handle| !ended.contains(handle));
                session.handles.is_empty()
            }
            None => false,
        };

        if finished {
            if let Some(session) = self.session.take() {
                info!(track = %session.track, "track finished");
                if let Some(listener) = self.on_stop.as_mut() {
                    listener(&session.track);
                }
            }
        }
        ended.len()
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_track(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.track.as_str())
    }

    /// Voices still sounding in the current session
    pub fn active_voices(&self) -> usize {
        self.session.as_ref().map_or(0, |session| {
            session
                .handles
                .iter()
                .filter(|handle| self.scheduler.is_active(**handle))
                .count()
        })
    }

    pub fn set_on_stop(&mut self, listener: impl FnMut(&str) + 'static) {
        self.on_stop = Some(Box::new(listener));
    }

    pub fn songbook(&self) -> &Songbook {
        &self.songbook
    }

    /// Swap in new registries. Stops the current session.
    pub fn replace_songbook(&mut self, songbook: Songbook) {
        self.stop();
        self.songbook = songbook;
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }
}
