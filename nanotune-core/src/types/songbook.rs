//! Instrument and track registries
//!
//! A [`Songbook`] bundles the two lookup tables a player needs and resolves a
//! raw track part into an instrument plus converted events, failing before
//! anything is scheduled if any piece is missing.

use crate::error::{Result, TuneError};
use crate::parser::{is_instrument_id, parse};
use crate::types::audio_config::Instrument;
use crate::types::track::{convert_events, ConvertedEvent, Track};
use std::collections::HashMap;

/// Instrument id (three uppercase letters) to instrument
pub type InstrumentRegistry = HashMap<String, Instrument>;

/// Track name to track
pub type TrackRegistry = HashMap<String, Track>;

/// A track part resolved against the instrument registry
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPart {
    pub instrument_id: String,
    pub instrument: Instrument,
    pub events: Vec<ConvertedEvent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Songbook {
    #[cfg_attr(feature = "serde", serde(default))]
    pub instruments: InstrumentRegistry,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tracks: TrackRegistry,
}

impl Songbook {
    pub fn new(instruments: InstrumentRegistry, tracks: TrackRegistry) -> Self {
        Self {
            instruments,
            tracks,
        }
    }

    pub fn with_instrument(mut self, id: &str, instrument: Instrument) -> Self {
        self.instruments.insert(id.to_string(), instrument);
        self
    }

    pub fn with_track(mut self, name: &str, track: Track) -> Self {
        self.tracks.insert(name.to_string(), track);
        self
    }

    pub fn instrument(&self, id: &str) -> Result<&Instrument> {
        self.instruments
            .get(id)
            .ok_or_else(|| TuneError::UnknownInstrument(id.to_string()))
    }

    pub fn track(&self, name: &str) -> Result<&Track> {
        self.tracks
            .get(name)
            .ok_or_else(|| TuneError::UnknownTrack(name.to_string()))
    }

    /// Track names in sorted order
    pub fn track_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tracks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instrument ids in sorted order
    pub fn instrument_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.instruments.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Parse a part, look up its instrument and convert its events.
    pub fn resolve_part(&self, raw: &str, bpm: f64) -> Result<ResolvedPart> {
        let parsed = parse(raw)?;
        let instrument = *self.instrument(&parsed.instrument_id)?;
        let events = convert_events(&parsed.tokens, bpm)?;

        Ok(ResolvedPart {
            instrument_id: parsed.instrument_id,
            instrument,
            events,
        })
    }

    /// Resolve every part of a named track, in part order
    pub fn resolve_track(&self, name: &str) -> Result<(&Track, Vec<ResolvedPart>)> {
        let track = self.track(name)?;
        let parts = track
            .parts
            .iter()
            .map(|raw| self.resolve_part(raw, track.bpm))
            .collect::<Result<Vec<_>>>()?;
        Ok((track, parts))
    }

    /// Shape checks for loaded data: instrument ids are three uppercase
    /// letters and effect values are in range.
    pub fn validate(&self) -> Result<()> {
        for (id, instrument) in &self.instruments {
            if !is_instrument_id(id) {
                return Err(TuneError::InvalidInstrument {
                    id: id.clone(),
                    reason: "id must be three uppercase letters".to_string(),
                });
            }
            instrument.validate(id)?;
        }
        Ok(())
    }

    /// Load and validate a songbook from JSON
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let songbook: Songbook = serde_json::from_str(json)
            .map_err(|e| TuneError::InvalidSongbook(e.to_string()))?;
        songbook.validate()?;
        Ok(songbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::audio_config::Waveform;

    fn songbook() -> Songbook {
        Songbook::default()
            .with_instrument("GTR", Instrument::new(Waveform::Square).with_gain(0.5))
            .with_track("intro", Track::from_parts(120.0, false, &["GTRA44B44"]))
    }

    #[test]
    fn test_resolve_part() {
        let part = songbook().resolve_part("GTRA44X48", 120.0).unwrap();
        assert_eq!(part.instrument_id, "GTR");
        assert_eq!(part.instrument.waveform, Waveform::Square);
        assert_eq!(part.events.len(), 2);
        assert_eq!(part.events[1], ConvertedEvent::new(0.0, 1.0));
    }

    #[test]
    fn test_resolve_unknown_instrument() {
        assert_eq!(
            songbook().resolve_part("BASC34", 120.0),
            Err(TuneError::UnknownInstrument("BAS".to_string()))
        );
    }

    #[test]
    fn test_resolve_unknown_track() {
        assert_eq!(
            songbook().resolve_track("missing").map(|(_, parts)| parts.len()),
            Err(TuneError::UnknownTrack("missing".to_string()))
        );
    }

    #[test]
    fn test_resolve_track_checks_tempo() {
        let book = songbook().with_track("broken", Track::from_parts(0.0, false, &["GTRA44"]));
        assert_eq!(
            book.resolve_track("broken").map(|(_, parts)| parts.len()),
            Err(TuneError::InvalidTempo(0.0))
        );
    }

    #[test]
    fn test_validate_rejects_bad_ids() {
        let book = Songbook::default().with_instrument("gtr", Instrument::default());
        assert!(matches!(
            book.validate(),
            Err(TuneError::InvalidInstrument { .. })
        ));
    }

    #[test]
    fn test_sorted_listings() {
        let book = songbook()
            .with_track("coda", Track::from_parts(90.0, true, &[]))
            .with_instrument("BAS", Instrument::default());
        assert_eq!(book.track_names(), vec!["coda", "intro"]);
        assert_eq!(book.instrument_ids(), vec!["BAS", "GTR"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_accepts_legacy_field_names() {
        let json = r#"{
            "instruments": {
                "LED": { "wave": "square", "gain": 0.3, "pan": -0.5 },
                "BAS": { "waveform": "saw" }
            },
            "tracks": {
                "theme": { "bpm": 140, "isLooping": true, "parts": ["LEDC44", "BASC24"] }
            }
        }"#;
        let book = Songbook::from_json(json).unwrap();

        let lead = book.instrument("LED").unwrap();
        assert_eq!(lead.waveform, Waveform::Square);
        assert_eq!(lead.gain, Some(0.3));
        assert_eq!(lead.pan, Some(-0.5));
        assert_eq!(book.instrument("BAS").unwrap().waveform, Waveform::Sawtooth);

        let theme = book.track("theme").unwrap();
        assert!(theme.looping);
        assert_eq!(theme.parts.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_waveform_names_ignore_case() {
        let cases = [
            ("sin", Waveform::Sine),
            ("SINE", Waveform::Sine),
            ("sq", Waveform::Square),
            ("Square", Waveform::Square),
            ("saw", Waveform::Sawtooth),
            ("SawTooth", Waveform::Sawtooth),
            ("TRI", Waveform::Triangle),
            ("triangle", Waveform::Triangle),
        ];
        for (name, expected) in cases {
            let json = format!(r#"{{ "instruments": {{ "LED": {{ "wave": "{}" }} }} }}"#, name);
            let book = Songbook::from_json(&json).unwrap();
            assert_eq!(book.instrument("LED").unwrap().waveform, expected, "{}", name);
        }

        let json = r#"{ "instruments": { "LED": { "wave": "noise" } } }"#;
        match Songbook::from_json(json) {
            Err(TuneError::InvalidSongbook(reason)) => {
                assert!(reason.contains("unknown waveform 'noise'"), "{}", reason)
            }
            other => panic!("expected InvalidSongbook, got {:?}", other),
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_validates() {
        let json = r#"{ "instruments": { "LED": { "wave": "sine", "gain": 3.0 } } }"#;
        assert!(matches!(
            Songbook::from_json(json),
            Err(TuneError::InvalidInstrument { .. })
        ));
        assert!(matches!(
            Songbook::from_json("not json"),
            Err(TuneError::InvalidSongbook(_))
        ));
    }
}
