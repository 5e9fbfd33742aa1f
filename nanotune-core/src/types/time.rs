//! Rational beat arithmetic for duration codes
//!
//! A duration code counts quarter-beats: code 4 is one crotchet, code 16 is
//! four crotchets. Beat counts are kept as exact rationals and converted to
//! seconds only at the tempo boundary, so summing a long part never drifts.

use crate::error::{Result, TuneError};
use num_rational::Ratio;

/// Exact beat count (crotchets)
pub type Beats = Ratio<u64>;

/// Duration code that equals exactly one crotchet
pub const CODE_PER_BEAT: u64 = 4;

/// Beats covered by a duration code
#[inline]
pub fn beats(duration_code: u8) -> Beats {
    Ratio::new(u64::from(duration_code), CODE_PER_BEAT)
}

/// Convert a beat count to f64 for audio scheduling
#[inline]
pub fn to_f64(b: Beats) -> f64 {
    *b.numer() as f64 / *b.denom() as f64
}

/// Length of one crotchet in seconds. Fails with `InvalidTempo` unless
/// `bpm` is finite and strictly positive.
pub fn seconds_per_beat(bpm: f64) -> Result<f64> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(TuneError::InvalidTempo(bpm));
    }
    Ok(60.0 / bpm)
}

/// Convert a duration code to seconds at the given tempo:
/// `(duration_code / 4) * (60 / bpm)`
pub fn to_seconds(duration_code: u8, bpm: f64) -> Result<f64> {
    let seconds_per_beat = seconds_per_beat(bpm)?;
    Ok(to_f64(beats(duration_code)) * seconds_per_beat)
}
