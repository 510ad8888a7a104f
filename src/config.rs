// Engine configuration - Scheduler and audio tuning, loaded from RON

use crate::error::{MetronomeError, Result};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs of the scheduling engine
///
/// Every field has a default, so a partial RON file is valid:
///
/// ```ron
/// (lookahead_interval_ms: 20, initial_volume: 0.8)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the scheduler timer
    pub lookahead_interval_ms: u64,
    /// How far ahead of the audio clock onsets are scheduled
    pub schedule_ahead_secs: f64,
    /// Delay between `start` and the first onset
    pub start_offset_secs: f64,
    /// Slots in the queue between scheduler and audio callback
    pub click_queue_capacity: usize,
    pub initial_volume: f32,
    /// Time constant of the volume smoother
    pub volume_smoothing_ms: f32,
    /// Simultaneous click voices before the oldest is stolen
    pub max_voices: usize,
    /// Output device name; `None` picks the host default
    pub output_device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_interval_ms: 25,
            schedule_ahead_secs: 0.1,
            start_offset_secs: 0.05,
            click_queue_capacity: 256,
            initial_volume: 0.5,
            volume_smoothing_ms: 15.0,
            max_voices: 32,
            output_device: None,
        }
    }
}

impl EngineConfig {
    /// Parse a RON document, then sanitize it
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: EngineConfig = ron::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Engine config loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(|e| MetronomeError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Replace unusable values with defaults (or the nearest usable value)
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();

        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 { value } else { fallback }
        };

        let schedule_ahead_secs = positive(self.schedule_ahead_secs, defaults.schedule_ahead_secs);
        let start_offset_secs = if self.start_offset_secs.is_finite() && self.start_offset_secs >= 0.0 {
            self.start_offset_secs
        } else {
            defaults.start_offset_secs
        };
        let volume_smoothing_ms =
            if self.volume_smoothing_ms.is_finite() && self.volume_smoothing_ms >= 0.0 {
                self.volume_smoothing_ms
            } else {
                defaults.volume_smoothing_ms
            };

        let sanitized = Self {
            lookahead_interval_ms: self.lookahead_interval_ms.max(1),
            schedule_ahead_secs,
            start_offset_secs,
            click_queue_capacity: self.click_queue_capacity.max(1),
            initial_volume: crate::audio::parameters::clamp_volume(self.initial_volume),
            volume_smoothing_ms,
            max_voices: self.max_voices.max(1),
            output_device: self.output_device,
        };

        // A timer slower than the window leaves gaps between passes
        if sanitized.lookahead_interval_ms as f64 / 1000.0 >= sanitized.schedule_ahead_secs {
            log::warn!(
                "Lookahead interval {} ms is not shorter than the {:.3}s schedule window, clicks may be late",
                sanitized.lookahead_interval_ms,
                sanitized.schedule_ahead_secs
            );
        }

        sanitized
    }
}
