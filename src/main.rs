use anyhow::{Context, Result};
use clap::Parser;
use nanotune::audio::{AudioContext, CpalContext, Engine};
use nanotune::config::load_songbook;
use nanotune::repl::Repl;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Play nanotune songbooks from the terminal
#[derive(Parser, Debug)]
#[command(name = "nanotune", version, about)]
struct Cli {
    /// Songbook JSON file with instruments and tracks
    songbook: PathBuf,

    /// Start playing this track immediately
    #[arg(short, long)]
    play: Option<String>,

    /// Reload the songbook when the file changes
    #[arg(short, long)]
    watch: bool,

    /// How often completion timers are checked, in milliseconds
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=1000))]
    tick_ms: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("NANOTUNE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("nanotune=info,nanotune_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let songbook = load_songbook(&cli.songbook)?;
    let context: Box<dyn AudioContext> =
        Box::new(CpalContext::new().context("failed to open audio output")?);
    let engine = Engine::with_songbook(songbook, context);

    let mut repl = Repl::new(engine, Some(cli.songbook.clone()), Duration::from_millis(cli.tick_ms))
        .context("failed to initialize REPL")?;

    if cli.watch {
        repl.watch(cli.songbook.clone());
    }
    if let Some(track) = &cli.play {
        repl.play(track)?;
    }

    repl.run()
}
