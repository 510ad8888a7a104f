// Oscillateur des clics - Phase accumulator with per-sample frequency

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Waveform shapes available to click recipes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
}

impl WaveformType {
    /// Value of one cycle at `phase` in [0, 1)
    #[inline]
    pub fn at(self, phase: f32) -> f32 {
        match self {
            WaveformType::Sine => (phase * TAU).sin(),
            WaveformType::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            // Starts at -1, peaks at +1 mid-cycle
            WaveformType::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// Naive oscillator driving one click voice
///
/// The frequency is passed on every sample, which is what the kick's pitch
/// sweep needs. Clicks are too short for square-wave aliasing to matter, so
/// there is no band-limiting.
pub struct ClickOscillator {
    waveform: WaveformType,
    phase: f32,
    inv_sample_rate: f32,
}

impl ClickOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        let inv_sample_rate = if sample_rate > 0.0 { 1.0 / sample_rate } else { 0.0 };
        Self {
            waveform,
            phase: 0.0,
            inv_sample_rate,
        }
    }

    pub fn waveform(&self) -> WaveformType {
        self.waveform
    }

    /// Output the current sample, then advance by one period of `frequency`
    #[inline]
    pub fn next(&mut self, frequency: f32) -> f32 {
        let sample = self.waveform.at(self.phase);

        let increment = if frequency.is_finite() { frequency * self.inv_sample_rate } else { 0.0 };
        self.phase = (self.phase + increment).rem_euclid(1.0);
        if !self.phase.is_finite() {
            self.phase = 0.0;
        }
        sample
    }
}
