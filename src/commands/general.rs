//! General REPL commands (help, quit, listings, reload, watch)

use crate::commands::{CommandContext, CommandResult};
use crate::config::load_songbook;
use colored::*;
use std::path::PathBuf;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `tracks` command
pub fn cmd_tracks(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let songbook = ctx.engine.songbook();
    let names = songbook.track_names();
    if names.is_empty() {
        return CommandResult::Message("No tracks loaded".to_string());
    }

    let current = ctx.engine.current_track();
    let mut output = format!("🎼 Tracks ({}):", names.len());
    for name in names {
        let Ok(track) = songbook.track(name) else {
            continue;
        };
        let marker = if current == Some(name) { "▶" } else { " " };
        output.push_str(&format!(
            "\n  {} {} - {} BPM, {} part(s){}",
            marker,
            name.bright_cyan(),
            track.bpm,
            track.parts.len(),
            if track.looping { ", loop" } else { "" }
        ));
    }
    CommandResult::Message(output)
}

/// Handle `instruments` command
pub fn cmd_instruments(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let songbook = ctx.engine.songbook();
    let ids = songbook.instrument_ids();
    if ids.is_empty() {
        return CommandResult::Message("No instruments loaded".to_string());
    }

    let mut output = format!("🎹 Instruments ({}):", ids.len());
    for id in ids {
        let Ok(instrument) = songbook.instrument(id) else {
            continue;
        };
        output.push_str(&format!("\n  {} {}", id.bright_cyan(), instrument.waveform.name()));
        if let Some(gain) = instrument.gain {
            output.push_str(&format!(" gain={}", gain));
        }
        if let Some(pan) = instrument.pan {
            output.push_str(&format!(" pan={}", pan));
        }
    }
    CommandResult::Message(output)
}

/// Handle `reload` command: re-read the songbook file and restart the
/// current track if it still exists
pub fn cmd_reload(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(path) = ctx.songbook_path.clone() else {
        return CommandResult::Error("No songbook file to reload".to_string());
    };
    match reload_songbook(ctx, &path) {
        Ok(msg) => CommandResult::Message(msg),
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

/// Replace the engine's songbook from `path`, resuming the track that was
/// playing when possible
pub fn reload_songbook(ctx: &mut CommandContext, path: &std::path::Path) -> anyhow::Result<String> {
    let songbook = load_songbook(path)?;
    let resume = ctx.engine.current_track().map(str::to_string);
    ctx.engine.replace_songbook(songbook);

    let mut msg = format!("{} Reloaded {}", "✓".bright_green(), path.display());
    if let Some(track) = resume {
        match ctx.engine.play(&track) {
            Ok(()) => msg.push_str(&format!(", resumed {}", track)),
            Err(e) => msg.push_str(&format!(", could not resume {}: {}", track, e)),
        }
    }
    Ok(msg)
}

/// Handle `watch [file]` command
pub fn cmd_watch(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if !args.is_empty() {
        return CommandResult::Watch(PathBuf::from(args));
    }
    match &ctx.songbook_path {
        Some(path) => CommandResult::Watch(path.clone()),
        None => CommandResult::Error("Usage: watch <file>".to_string()),
    }
}

/// Print help information
fn print_help() {
    println!("{}", "🎵 nanotune Help".bold());
    println!("{}", "================".bold());
    println!();
    println!("{}", "Notation:".green());
    println!(
        "  {}  - instrument id, then notes",
        "LEDC44E44G48".cyan()
    );
    println!("  Each note is a pitch A-G (or X for a rest), an optional #,");
    println!("  an octave 1-8 and a duration code: 4 = crotchet, 8 = minim,");
    println!("  2 = quaver, 16 = semibreve.");
    println!();
    println!("{}", "Playback:".green());
    println!("  {}  - Play a track from the songbook", "play <track>".cyan());
    println!("  {}          - Stop playback", "stop".cyan());
    println!("  {}        - Show what is playing", "status".cyan());
    println!();
    println!("{}", "Songbook:".green());
    println!("  {}        - List tracks", "tracks".cyan());
    println!("  {}   - List instruments", "instruments".cyan());
    println!("  {}        - Re-read the songbook file", "reload".cyan());
    println!(
        "  {}  - Reload automatically when a file changes",
        "watch [file]".cyan()
    );
    println!();
    println!("{}", "Other Commands:".green());
    println!("  {}          - Show this help", "help".bright_green());
    println!("  {}          - Exit the REPL", "quit".bright_red());
}
