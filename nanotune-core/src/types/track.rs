use crate::error::Result;
use crate::types::note::NoteEvent;
use crate::types::time;

/// A playable track: one notation string per voice, shared tempo and loop flag
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    pub bpm: f64,
    #[cfg_attr(feature = "serde", serde(default, rename = "isLooping", alias = "loop"))]
    pub looping: bool,
    pub parts: Vec<String>,
}

impl Track {
    pub fn new(bpm: f64, looping: bool, parts: Vec<String>) -> Self {
        Self {
            bpm,
            looping,
            parts,
        }
    }

    /// Convenience constructor from string slices
    pub fn from_parts(bpm: f64, looping: bool, parts: &[&str]) -> Self {
        Self::new(bpm, looping, parts.iter().map(|p| p.to_string()).collect())
    }
}

/// A note resolved to absolute units: frequency in Hz (0 for a rest) and
/// length in seconds (always positive, rests included)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvertedEvent {
    pub hz: f64,
    pub seconds: f64,
}

impl ConvertedEvent {
    pub fn new(hz: f64, seconds: f64) -> Self {
        Self { hz, seconds }
    }

    pub fn is_rest(&self) -> bool {
        self.hz == 0.0
    }
}

/// Convert parsed tokens to frequency/seconds pairs at the given tempo,
/// preserving order.
pub fn convert_events(tokens: &[NoteEvent], bpm: f64) -> Result<Vec<ConvertedEvent>> {
    let seconds_per_beat = time::seconds_per_beat(bpm)?;
    Ok(tokens
        .iter()
        .map(|token| {
            let beats = time::to_f64(time::beats(token.duration_code));
            ConvertedEvent::new(token.frequency(), beats * seconds_per_beat)
        })
        .collect())
}

/// Total length of an event sequence in seconds
pub fn total_seconds(events: &[ConvertedEvent]) -> f64 {
    events.iter().map(|event| event.seconds).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TuneError;
    use crate::types::note::PitchClass;

    #[test]
    fn test_convert_preserves_order() {
        let tokens = vec![
            NoteEvent::new(PitchClass::A, false, 4, 4),
            NoteEvent::rest(1, 2),
            NoteEvent::new(PitchClass::F, false, 5, 8),
        ];
        let events = convert_events(&tokens, 120.0).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ConvertedEvent::new(440.0, 0.5));
        assert!(events[1].is_rest());
        assert_eq!(events[1].seconds, 0.25);
        assert!((events[2].hz - 698.56).abs() < 1e-6);
        assert_eq!(events[2].seconds, 1.0);
    }

    #[test]
    fn test_rests_still_occupy_time() {
        let tokens = vec![NoteEvent::rest(3, 1)];
        let events = convert_events(&tokens, 200.0).unwrap();
        assert!(events[0].seconds > 0.0);
    }

    #[test]
    fn test_convert_rejects_bad_tempo() {
        let tokens = vec![NoteEvent::new(PitchClass::C, false, 4, 4)];
        assert_eq!(
            convert_events(&tokens, 0.0),
            Err(TuneError::InvalidTempo(0.0))
        );
    }

    #[test]
    fn test_total_seconds() {
        let events = vec![ConvertedEvent::new(440.0, 0.5), ConvertedEvent::new(0.0, 0.25)];
        assert!((total_seconds(&events) - 0.75).abs() < 1e-12);
        assert_eq!(total_seconds(&[]), 0.0);
    }
}
