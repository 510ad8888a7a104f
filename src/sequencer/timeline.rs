// Timeline - Musical time representation
// Tempo and bar length, and the conversions the scheduler needs from them

use std::fmt;

/// Lowest accepted tempo
pub const MIN_BPM: f64 = 1.0;
/// Highest accepted tempo
pub const MAX_BPM: f64 = 300.0;
/// Tempo used when nothing else was asked for (or the input was NaN)
pub const DEFAULT_BPM: f64 = 120.0;

/// Largest bar length accepted by `set_time_signature`
pub const MAX_BEATS_PER_BAR: u32 = 32;

/// Tempo in BPM (Beats Per Minute)
///
/// Always inside [`MIN_BPM`, `MAX_BPM`]: out-of-range input is clamped
/// instead of rejected, since a live tool must never fail mid-beat.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo, clamped to the valid range
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: clamp_bpm(bpm),
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value (clamped)
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = clamp_bpm(bpm);
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one subdivision slot in seconds
    pub fn onset_duration_seconds(&self, divisions: u32) -> f64 {
        self.beat_duration_seconds() / divisions.max(1) as f64
    }

    /// Duration of one bar in seconds
    pub fn bar_duration_seconds(&self, beats_per_bar: u32) -> f64 {
        self.beat_duration_seconds() * beats_per_bar as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl From<f64> for Tempo {
    fn from(bpm: f64) -> Self {
        Self::new(bpm)
    }
}

impl From<Tempo> for f64 {
    fn from(tempo: Tempo) -> Self {
        tempo.bpm
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Clamp a raw BPM value into the accepted range. NaN maps to the default.
pub fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_nan() {
        DEFAULT_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}

/// Clamp a bar length into [1, MAX_BEATS_PER_BAR]
pub fn clamp_beats_per_bar(beats: u32) -> u32 {
    beats.clamp(1, MAX_BEATS_PER_BAR)
}
