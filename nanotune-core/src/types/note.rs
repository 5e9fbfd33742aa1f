use crate::error::Result;
use crate::types::time;
use std::fmt;

/// Pitch letter of a note token, or the rest marker `X`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PitchClass {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    /// Rest: occupies time but sounds at 0 Hz
    X,
}

impl PitchClass {
    /// Parse a pitch letter (`A`-`G`) or the rest marker (`X`)
    pub fn from_char(c: char) -> Option<PitchClass> {
        match c {
            'A' => Some(PitchClass::A),
            'B' => Some(PitchClass::B),
            'C' => Some(PitchClass::C),
            'D' => Some(PitchClass::D),
            'E' => Some(PitchClass::E),
            'F' => Some(PitchClass::F),
            'G' => Some(PitchClass::G),
            'X' => Some(PitchClass::X),
            _ => None,
        }
    }

    /// Semitone offset above C (C=0 ... B=11), `None` for a rest
    pub fn semitone(&self) -> Option<u8> {
        match self {
            PitchClass::C => Some(0),
            PitchClass::D => Some(2),
            PitchClass::E => Some(4),
            PitchClass::F => Some(5),
            PitchClass::G => Some(7),
            PitchClass::A => Some(9),
            PitchClass::B => Some(11),
            PitchClass::X => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        *self == PitchClass::X
    }

    pub fn as_char(&self) -> char {
        match self {
            PitchClass::A => 'A',
            PitchClass::B => 'B',
            PitchClass::C => 'C',
            PitchClass::D => 'D',
            PitchClass::E => 'E',
            PitchClass::F => 'F',
            PitchClass::G => 'G',
            PitchClass::X => 'X',
        }
    }
}

/// Equal-temperament frequencies for octave 0, C0 through B0
const OCTAVE_ZERO_HZ: [f64; 12] = [
    16.35, // C0
    17.32, // C#0
    18.35, // D0
    19.45, // D#0
    20.60, // E0
    21.83, // F0
    23.12, // F#0
    24.50, // G0
    25.96, // G#0
    27.50, // A0
    29.14, // A#0
    30.87, // B0
];

/// Convert a pitch class, sharp flag and octave to a frequency in Hz.
///
/// A rest is always 0 Hz regardless of octave. Pitched notes scale the
/// octave-0 table entry by `(2^(1/12))^(12 * octave)`, which is exactly
/// `2^octave`; the power of two is used so that A4 lands on 440 Hz without
/// rounding error.
///
/// `E#` sounds as `F` and `B#` as the `C` one octave up.
pub fn to_hz(pitch_class: PitchClass, sharp: bool, octave: u8) -> f64 {
    let Some(natural) = pitch_class.semitone() else {
        return 0.0;
    };

    let semitone = natural + u8::from(sharp);
    let (index, octave) = if semitone == 12 {
        (0, i32::from(octave) + 1)
    } else {
        (semitone as usize, i32::from(octave))
    };

    OCTAVE_ZERO_HZ[index] * 2.0_f64.powi(octave)
}

/// A single parsed note token: pitch, octave and duration code.
///
/// Duration code 4 is one crotchet; see [`time::to_seconds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    pub pitch_class: PitchClass,
    pub sharp: bool,
    /// 1-8 when produced by the parser
    pub octave: u8,
    /// 1-99 when produced by the parser, never containing a zero digit
    pub duration_code: u8,
}

impl NoteEvent {
    pub fn new(pitch_class: PitchClass, sharp: bool, octave: u8, duration_code: u8) -> Self {
        Self {
            pitch_class,
            sharp,
            octave,
            duration_code,
        }
    }

    pub fn rest(octave: u8, duration_code: u8) -> Self {
        Self::new(PitchClass::X, false, octave, duration_code)
    }

    pub fn is_rest(&self) -> bool {
        self.pitch_class.is_rest()
    }

    /// Frequency of this note in Hz (0 for a rest)
    pub fn frequency(&self) -> f64 {
        to_hz(self.pitch_class, self.sharp, self.octave)
    }

    /// Length of this note in seconds at the given tempo
    pub fn seconds(&self, bpm: f64) -> Result<f64> {
        time::to_seconds(self.duration_code, bpm)
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pitch_class.as_char())?;
        if self.sharp {
            write!(f, "#")?;
        }
        write!(f, "{}{}", self.octave, self.duration_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn test_reference_frequencies() {
        assert!((to_hz(PitchClass::F, false, 5) - 698.56).abs() < TOLERANCE);
        assert!((to_hz(PitchClass::D, true, 2) - 77.80).abs() < TOLERANCE);
    }

    #[test]
    fn test_a4_is_exactly_440() {
        assert_eq!(to_hz(PitchClass::A, false, 4), 440.0);
    }

    #[test]
    fn test_rest_is_silent_at_any_octave() {
        for octave in [0, 1, 4, 8, 9, 255] {
            assert_eq!(to_hz(PitchClass::X, false, octave), 0.0);
            assert_eq!(to_hz(PitchClass::X, true, octave), 0.0);
        }
    }

    #[test]
    fn test_frequency_strictly_increases_with_octave() {
        let pitches = [
            PitchClass::A,
            PitchClass::B,
            PitchClass::C,
            PitchClass::D,
            PitchClass::E,
            PitchClass::F,
            PitchClass::G,
        ];
        for pitch in pitches {
            for sharp in [false, true] {
                for octave in 1..8 {
                    let lower = to_hz(pitch, sharp, octave);
                    let upper = to_hz(pitch, sharp, octave + 1);
                    assert!(
                        upper > lower,
                        "{:?} sharp={} octave {} -> {}: {} !< {}",
                        pitch,
                        sharp,
                        octave,
                        octave + 1,
                        lower,
                        upper
                    );
                }
            }
        }
    }

    #[test]
    fn test_enharmonic_sharps_without_table_entry() {
        assert_eq!(to_hz(PitchClass::E, true, 3), to_hz(PitchClass::F, false, 3));
        assert_eq!(to_hz(PitchClass::B, true, 3), to_hz(PitchClass::C, false, 4));
    }

    #[test]
    fn test_note_event_display() {
        let note = NoteEvent::new(PitchClass::C, true, 5, 16);
        assert_eq!(note.to_string(), "C#516");
        assert_eq!(NoteEvent::rest(1, 4).to_string(), "X14");
    }

    #[test]
    fn test_note_event_seconds() {
        let note = NoteEvent::new(PitchClass::A, false, 4, 4);
        assert_eq!(note.frequency(), 440.0);
        assert_eq!(note.seconds(120.0).unwrap(), 0.5);
    }
}
