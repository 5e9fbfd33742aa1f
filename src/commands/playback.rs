//! Playback commands (play, stop, status)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `play <track>` command
pub fn cmd_play(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: play <track>".to_string());
    }

    match ctx.engine.play(args) {
        Ok(()) => {
            let looping = ctx
                .engine
                .songbook()
                .track(args)
                .map(|track| track.looping)
                .unwrap_or(false);
            let suffix = if looping { " (looping)" } else { "" };
            CommandResult::Message(
                format!(
                    "🔊 Playing {} - {} voice(s){}",
                    args,
                    ctx.engine.active_voices(),
                    suffix
                )
                .bright_green()
                .to_string(),
            )
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `stop` command
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.engine.current_track().map(str::to_string) {
        Some(track) => {
            ctx.engine.stop();
            CommandResult::Message(format!("⏹ Stopped {}", track).yellow().to_string())
        }
        None => CommandResult::Message("Nothing is playing".to_string()),
    }
}

/// Handle `status` command
pub fn cmd_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let clock = ctx.engine.context().current_time();
    match ctx.engine.current_track() {
        Some(track) => CommandResult::Message(format!(
            "▶ {} - {} active voice(s), audio clock {:.2}s",
            track.bright_cyan(),
            ctx.engine.active_voices(),
            clock
        )),
        None => CommandResult::Message(format!("Idle, audio clock {:.2}s", clock)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::context;

    #[test]
    fn test_play_and_stop() {
        let mut ctx = context();
        assert!(matches!(cmd_play("theme", &mut ctx), CommandResult::Message(_)));
        assert_eq!(ctx.engine.current_track(), Some("theme"));

        assert!(matches!(cmd_stop("", &mut ctx), CommandResult::Message(_)));
        assert!(!ctx.engine.is_playing());
        assert_eq!(
            cmd_stop("", &mut ctx),
            CommandResult::Message("Nothing is playing".to_string())
        );
    }

    #[test]
    fn test_play_unknown_track_keeps_current() {
        let mut ctx = context();
        cmd_play("theme", &mut ctx);
        match cmd_play("nope", &mut ctx) {
            CommandResult::Error(msg) => assert!(msg.contains("nope")),
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(ctx.engine.current_track(), Some("theme"));
    }

    #[test]
    fn test_play_requires_track() {
        let mut ctx = context();
        assert!(matches!(cmd_play("", &mut ctx), CommandResult::Error(_)));
    }
}
