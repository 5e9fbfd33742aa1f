//! Command registry for REPL commands
//!
//! Provides a clean, extensible pattern for handling REPL commands.

pub mod general;
pub mod playback;

use crate::audio::{AudioContext, Engine};
use std::path::PathBuf;

/// The engine as driven from the REPL, over whichever host context is live
pub type PlayerEngine = Engine<Box<dyn AudioContext>>;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Input did not match any command
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a songbook file for changes
    Watch(PathBuf),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub engine: PlayerEngine,
    /// File the songbook was loaded from, if any
    pub songbook_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(engine: PlayerEngine, songbook_path: Option<PathBuf>) -> Self {
        Self {
            engine,
            songbook_path,
        }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Registered prefixes, longest first
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every built-in command
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("play", playback::cmd_play);
    registry.register("stop", playback::cmd_stop);
    registry.register("status", playback::cmd_status);

    registry.register("tracks", general::cmd_tracks);
    registry.register("instruments", general::cmd_instruments);
    registry.register("reload", general::cmd_reload);
    registry.register("watch", general::cmd_watch);
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::RecordingContext;
    use nanotune_core::{Instrument, Songbook, Track, Waveform};

    pub(crate) fn context() -> CommandContext {
        let songbook = Songbook::default()
            .with_instrument("LED", Instrument::new(Waveform::Square).with_gain(0.4))
            .with_track("theme", Track::from_parts(120.0, true, &["LEDC44E44"]))
            .with_track("blip", Track::from_parts(240.0, false, &["LEDA58"]));
        let engine = Engine::with_songbook(songbook, Box::new(RecordingContext::new()) as Box<dyn AudioContext>);
        CommandContext::new(engine, None)
    }

    #[test]
    fn test_unknown_input_is_not_a_command() {
        let registry = create_registry();
        let mut ctx = context();
        assert_eq!(registry.execute("dance", &mut ctx), CommandResult::NotACommand);
        // Prefix must be followed by a space or end of input
        assert_eq!(registry.execute("playful", &mut ctx), CommandResult::NotACommand);
    }

    #[test]
    fn test_quit_and_exit() {
        let registry = create_registry();
        let mut ctx = context();
        assert_eq!(registry.execute("quit", &mut ctx), CommandResult::Exit);
        assert_eq!(registry.execute("exit", &mut ctx), CommandResult::Exit);
    }

    #[test]
    fn test_longest_prefix_first() {
        let registry = create_registry();
        let commands = registry.list_commands();
        assert_eq!(commands.first(), Some(&"instruments"));
    }
}
