//! Songbook loading
//!
//! A songbook is a JSON file with `instruments` and `tracks` tables:
//!
//! ```json
//! {
//!   "instruments": { "LED": { "wave": "square", "gain": 0.3, "pan": -0.2 } },
//!   "tracks": { "theme": { "bpm": 140, "isLooping": true, "parts": ["LEDC44E44G48"] } }
//! }
//! ```

use anyhow::{Context, Result};
use nanotune_core::Songbook;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read, parse and validate a songbook file
pub fn load_songbook(path: &Path) -> Result<Songbook> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read songbook {}", path.display()))?;
    let songbook = Songbook::from_json(&json)
        .with_context(|| format!("invalid songbook {}", path.display()))?;
    debug!(
        path = %path.display(),
        instruments = songbook.instruments.len(),
        tracks = songbook.tracks.len(),
        "songbook loaded"
    );
    Ok(songbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("nanotune-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_songbook() {
        let path = temp_file(
            "ok.json",
            r#"{ "instruments": { "LED": { "wave": "sine" } },
                 "tracks": { "t": { "bpm": 100, "parts": ["LEDC44"] } } }"#,
        );
        let book = load_songbook(&path).unwrap();
        assert_eq!(book.track_names(), vec!["t"]);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_mentions_path() {
        let err = load_songbook(Path::new("/nonexistent/songs.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/songs.json"));
    }

    #[test]
    fn test_invalid_songbook() {
        let path = temp_file("bad.json", r#"{ "instruments": { "led": {} } }"#);
        assert!(load_songbook(&path).is_err());
        fs::remove_file(path).ok();
    }
}
