//! Render-side oscillator
//!
//! Generates sine, sawtooth, square and triangle waves and applies
//! frequency steps at the audio time they were scheduled for.

use nanotune_core::Waveform;
use std::collections::VecDeque;
use std::f32::consts::PI;

pub struct ToneOscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
    sample_rate: f32,
    /// Pending `(at, hz)` steps, sorted by time
    automation: VecDeque<(f64, f32)>,
    start_at: Option<f64>,
    stop_at: Option<f64>,
}

impl ToneOscillator {
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            frequency: 0.0,
            phase: 0.0,
            sample_rate,
            automation: VecDeque::new(),
            start_at: None,
            stop_at: None,
        }
    }

    pub fn start(&mut self, at: f64) {
        self.start_at = Some(at);
    }

    pub fn stop(&mut self, at: f64) {
        self.stop_at = Some(at);
    }

    /// Schedule a step to `hz` at audio time `at`.
    /// A later step for the same instant replaces an earlier one.
    pub fn set_frequency_at(&mut self, hz: f32, at: f64) {
        let idx = self.automation.partition_point(|(t, _)| *t <= at);
        if idx > 0 && self.automation[idx - 1].0 == at {
            self.automation[idx - 1].1 = hz;
        } else {
            self.automation.insert(idx, (at, hz));
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn is_sounding(&self, time: f64) -> bool {
        self.start_at.is_some_and(|start| time >= start)
            && self.stop_at.map_or(true, |stop| time < stop)
    }

    /// Generate the sample for audio time `time`
    pub fn next_sample(&mut self, time: f64) -> f32 {
        while let Some(&(at, hz)) = self.automation.front() {
            if at > time {
                break;
            }
            self.frequency = hz;
            self.automation.pop_front();
        }

        // A rest holds 0 Hz; output silence rather than a DC level
        if !self.is_sounding(time) || self.frequency <= 0.0 {
            return 0.0;
        }

        let value = self.generate_waveform();
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        value
    }

    fn generate_waveform(&self) -> f32 {
        match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 48_000.0;

    fn sounding(waveform: Waveform, hz: f32) -> ToneOscillator {
        let mut osc = ToneOscillator::new(waveform, RATE);
        osc.start(0.0);
        osc.set_frequency_at(hz, 0.0);
        osc
    }

    #[test]
    fn test_waveforms_stay_in_range() {
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ] {
            let mut osc = sounding(waveform, 440.0);
            for i in 0..2000 {
                let value = osc.next_sample(i as f64 / RATE as f64);
                assert!((-1.0..=1.0).contains(&value), "{:?} gave {}", waveform, value);
            }
        }
    }

    #[test]
    fn test_square_alternates() {
        // 12 kHz at 48 kHz: two samples high, two low
        let mut osc = sounding(Waveform::Square, 12_000.0);
        let samples: Vec<f32> = (0..4).map(|i| osc.next_sample(i as f64 / 48_000.0)).collect();
        assert_eq!(samples, vec![1.0, 1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_silent_outside_start_and_stop() {
        let mut osc = ToneOscillator::new(Waveform::Square, RATE);
        osc.set_frequency_at(440.0, 0.0);
        osc.start(1.0);
        osc.stop(2.0);

        assert_eq!(osc.next_sample(0.5), 0.0);
        assert_ne!(osc.next_sample(1.0), 0.0);
        assert_eq!(osc.next_sample(2.0), 0.0);
    }

    #[test]
    fn test_frequency_steps_apply_at_their_time() {
        let mut osc = sounding(Waveform::Sine, 440.0);
        osc.set_frequency_at(0.0, 0.5);
        osc.set_frequency_at(880.0, 1.0);

        osc.next_sample(0.25);
        assert_eq!(osc.frequency(), 440.0);
        assert_eq!(osc.next_sample(0.5), 0.0);
        osc.next_sample(1.0);
        assert_eq!(osc.frequency(), 880.0);
    }

    #[test]
    fn test_reprogramming_same_instant_replaces_step() {
        let mut osc = sounding(Waveform::Sine, 440.0);
        osc.set_frequency_at(220.0, 1.0);
        osc.set_frequency_at(330.0, 1.0);
        osc.next_sample(1.0);
        assert_eq!(osc.frequency(), 330.0);
    }
}
