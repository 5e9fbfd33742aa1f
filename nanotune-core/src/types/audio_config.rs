//! Instrument configuration types
//!
//! Pure data describing how a voice should sound. The audio crate turns an
//! [`Instrument`] into an oscillator plus an ordered chain of effect nodes.

use crate::error::{Result, TuneError};

/// Available oscillator waveforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Parse waveform from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Waveform> {
        match s.to_lowercase().as_str() {
            "sine" | "sin" => Some(Waveform::Sine),
            "square" | "sq" => Some(Waveform::Square),
            "sawtooth" | "saw" => Some(Waveform::Sawtooth),
            "triangle" | "tri" => Some(Waveform::Triangle),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

/// Songbook names go through [`Waveform::from_str`], so JSON accepts the
/// same short names and any casing.
impl TryFrom<String> for Waveform {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        Waveform::from_str(&name).ok_or_else(|| format!("unknown waveform '{}'", name))
    }
}

impl From<Waveform> for String {
    fn from(waveform: Waveform) -> Self {
        waveform.name().to_string()
    }
}

/// Kinds of effect node a host audio graph may be able to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Gain,
    StereoPanner,
}

/// A configured effect node inserted after the oscillator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Output level in [0, 1]
    Gain(f32),
    /// Stereo position in [-1, 1], negative is left
    Pan(f32),
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Gain(_) => EffectKind::Gain,
            Effect::Pan(_) => EffectKind::StereoPanner,
        }
    }

    pub fn value(&self) -> f32 {
        match self {
            Effect::Gain(level) => *level,
            Effect::Pan(position) => *position,
        }
    }
}

/// How one voice sounds: a waveform plus optional gain and pan
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instrument {
    #[cfg_attr(feature = "serde", serde(rename = "wave", alias = "waveform"))]
    pub waveform: Waveform,
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "gainLevel", skip_serializing_if = "Option::is_none")
    )]
    pub gain: Option<f32>,
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "panPosition", skip_serializing_if = "Option::is_none")
    )]
    pub pan: Option<f32>,
}

impl Instrument {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            gain: None,
            pan: None,
        }
    }

    pub fn with_gain(mut self, level: f32) -> Self {
        self.gain = Some(level);
        self
    }

    pub fn with_pan(mut self, position: f32) -> Self {
        self.pan = Some(position);
        self
    }

    /// Effects to insert after the oscillator, in chain order.
    ///
    /// Gain always precedes pan. An effect that is absent or set to zero is
    /// left out of the chain entirely.
    pub fn effects(&self) -> impl Iterator<Item = Effect> {
        [self.gain.map(Effect::Gain), self.pan.map(Effect::Pan)]
            .into_iter()
            .flatten()
            .filter(|effect| effect.value() != 0.0)
    }

    /// Check value ranges: gain in [0, 1], pan in [-1, 1]. A zero gain is
    /// accepted and means "no gain node".
    pub fn validate(&self, id: &str) -> Result<()> {
        if let Some(gain) = self.gain {
            if !(0.0..=1.0).contains(&gain) {
                return Err(TuneError::InvalidInstrument {
                    id: id.to_string(),
                    reason: format!("gain {} is outside [0, 1]", gain),
                });
            }
        }
        if let Some(pan) = self.pan {
            if !(-1.0..=1.0).contains(&pan) {
                return Err(TuneError::InvalidInstrument {
                    id: id.to_string(),
                    reason: format!("pan {} is outside [-1, 1]", pan),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_parsing() {
        assert_eq!(Waveform::from_str("sine"), Some(Waveform::Sine));
        assert_eq!(Waveform::from_str("SAW"), Some(Waveform::Sawtooth));
        assert_eq!(Waveform::from_str("Square"), Some(Waveform::Square));
        assert_eq!(Waveform::from_str("tri"), Some(Waveform::Triangle));
        assert_eq!(Waveform::from_str("noise"), None);
    }

    #[test]
    fn test_waveform_string_conversions() {
        assert_eq!(Waveform::try_from("SQ".to_string()), Ok(Waveform::Square));
        assert_eq!(
            Waveform::try_from("noise".to_string()),
            Err("unknown waveform 'noise'".to_string())
        );
        assert_eq!(String::from(Waveform::Sawtooth), "sawtooth");
    }

    #[test]
    fn test_effects_keep_gain_before_pan() {
        let instrument = Instrument::new(Waveform::Square)
            .with_pan(-0.5)
            .with_gain(0.3);
        let effects: Vec<Effect> = instrument.effects().collect();
        assert_eq!(effects, vec![Effect::Gain(0.3), Effect::Pan(-0.5)]);
    }

    #[test]
    fn test_zero_and_absent_effects_are_skipped() {
        let bare = Instrument::new(Waveform::Sine);
        assert_eq!(bare.effects().count(), 0);

        let zeroed = Instrument::new(Waveform::Sine).with_gain(0.0).with_pan(0.0);
        assert_eq!(zeroed.effects().count(), 0);

        let pan_only = Instrument::new(Waveform::Sine).with_pan(1.0);
        let effects: Vec<Effect> = pan_only.effects().collect();
        assert_eq!(effects, vec![Effect::Pan(1.0)]);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Instrument::new(Waveform::Sine).with_gain(1.0).validate("LED").is_ok());
        assert!(Instrument::new(Waveform::Sine).with_pan(-1.0).validate("LED").is_ok());
        assert!(matches!(
            Instrument::new(Waveform::Sine).with_gain(1.5).validate("LED"),
            Err(TuneError::InvalidInstrument { .. })
        ));
        assert!(matches!(
            Instrument::new(Waveform::Sine).with_pan(2.0).validate("LED"),
            Err(TuneError::InvalidInstrument { .. })
        ));
    }
}
