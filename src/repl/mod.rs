//! Interactive player
//!
//! Line input runs on its own thread; the main loop selects over input,
//! a short tick that drives the engine's completion timers, natural-end
//! notifications and file-watcher events for songbook hot reload.

use crate::commands::general::reload_songbook;
use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult, PlayerEngine};
use crate::repl::watcher::FileWatcher;
use anyhow::{anyhow, Result};
use colored::*;
use crossbeam_channel::{tick, unbounded, Receiver, Sender};
use notify::{Event, EventKind};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub mod watcher;

/// Editors often emit several events per save
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

pub struct Repl {
    editor: Option<DefaultEditor>,
    ctx: CommandContext,
    tick_interval: Duration,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,
    rx_finished: Receiver<String>,

    // File watcher
    watcher: Option<FileWatcher>,
    watched: Vec<PathBuf>,
    last_reload: Option<Instant>,
}

impl Repl {
    pub fn new(
        mut engine: PlayerEngine,
        songbook_path: Option<PathBuf>,
        tick_interval: Duration,
    ) -> RustylineResult<Self> {
        let editor = DefaultEditor::new()?;

        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();
        let (tx_finished, rx_finished) = unbounded();

        engine.set_on_stop(move |track| {
            let _ = tx_finished.send(track.to_string());
        });

        Ok(Repl {
            editor: Some(editor),
            ctx: CommandContext::new(engine, songbook_path),
            tick_interval,
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            rx_finished,
            watcher: None,
            watched: Vec::new(),
            last_reload: None,
        })
    }

    /// Start a track before entering the loop
    pub fn play(&mut self, track: &str) -> Result<()> {
        self.ctx.engine.play(track)?;
        println!("{} Playing {}", "🔊".bright_green(), track.bright_cyan());
        Ok(())
    }

    /// Reload the songbook whenever `path` changes
    pub fn watch(&mut self, path: PathBuf) {
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{} Failed to create watcher: {}", "Error:".red(), e);
                    return;
                }
            }
        }

        if let Some(w) = &mut self.watcher {
            if let Err(e) = w.watch(&path) {
                println!(
                    "{} Failed to watch {}: {}",
                    "Error:".red(),
                    path.display(),
                    e
                );
            } else {
                println!(
                    "{} Watching {} for changes...",
                    "👀".bright_cyan(),
                    path.display().to_string().bright_green()
                );
                if self.ctx.songbook_path.is_none() {
                    self.ctx.songbook_path = Some(path.clone());
                }
                self.watched.push(path);
            }
        }
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "🎵".bright_yellow(),
            "nanotune".bright_cyan().bold()
        );
        println!(
            "Type '{}' to list tracks, '{}' to start one.",
            "tracks".bright_green(),
            "play <track>".bright_green()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "nanotune>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        let registry = create_registry();
        let ticker = tick(self.tick_interval);

        loop {
            crossbeam_channel::select! {
                recv(ticker) -> _ => {
                    self.ctx.engine.tick();
                },

                recv(self.rx_finished) -> msg => {
                    if let Ok(track) = msg {
                        println!("{} {} finished", "⏹".bright_yellow(), track.bright_cyan());
                    }
                },

                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if !self.handle_line(&registry, &line) {
                            break;
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{} 🎵", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break, // Channel closed
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => self.handle_file_event(event),
                    Ok(Err(e)) => println!("{} Watch error: {}", "Error:".red(), e),
                    Err(_) => break, // Channel closed
                }
            }
        }

        self.ctx.engine.stop();
        Ok(())
    }

    /// Returns false when the REPL should exit
    fn handle_line(&mut self, registry: &CommandRegistry, line: &str) -> bool {
        if line.is_empty() {
            return true;
        }

        match registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => {
                println!("{} 🎵", "Goodbye!".bright_cyan());
                return false;
            }
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red());
            }
            CommandResult::Watch(path) => self.watch(path),
            CommandResult::NotACommand => {
                println!(
                    "{} Unknown command '{}'. Type '{}' for a list of commands.",
                    "Error:".bright_red().bold(),
                    line,
                    "help".bright_green()
                );
            }
        }
        true
    }

    fn handle_file_event(&mut self, event: Event) {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        if self
            .last_reload
            .is_some_and(|at| at.elapsed() < RELOAD_DEBOUNCE)
        {
            debug!("file event within debounce window, ignored");
            return;
        }

        let Some(path) = event
            .paths
            .into_iter()
            .find(|p| self.watched.iter().any(|w| p.ends_with(w) || w.ends_with(p)))
        else {
            return;
        };

        self.last_reload = Some(Instant::now());
        println!(
            "{} File changed: {}",
            "⚡".bright_yellow(),
            path.display()
        );
        match reload_songbook(&mut self.ctx, &path) {
            Ok(msg) => println!("{}", msg),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "reload failed");
                println!("{} {:#}", "Error:".red(), e);
            }
        }
    }
}
