// Click synthesizer - Turns (time, category, sound) into a scheduled transient
//
// The scheduler thread resolves the recipe and pitch here, then hands a
// plain-data `ScheduledClick` to the audio callback through a ringbuffer.
// Rendering happens in `synth::voice`.

use super::oscillator::WaveformType;
use super::sound_bank::SoundId;
use crate::error::{MetronomeError, Result};
use crate::messaging::channels::ClickProducer;
use ringbuf::traits::{Observer, Producer};

/// Attack ramp length in seconds (avoids a discontinuity at onset)
pub const ATTACK_SECONDS: f32 = 0.002;
/// The oscillator keeps running this long after the decay target is reached
pub const RELEASE_TAIL_SECONDS: f32 = 0.01;
/// Envelope level reached at the end of the decay (-60 dB)
pub const DECAY_FLOOR: f32 = 0.001;
/// Duration of the kick's downward pitch sweep
pub const PITCH_SWEEP_SECONDS: f32 = 0.05;

/// What a click means musically. Exactly one applies per sounding onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickCategory {
    Normal,
    /// Downbeat of a bar
    Accent,
    /// Pre-warning before a tempo ramp step
    Cue,
    /// Count-in before playback proper
    CountIn,
}

impl ClickCategory {
    /// Pitch multiplier applied to the recipe's base frequency
    pub fn frequency_multiplier(&self) -> f32 {
        match self {
            ClickCategory::Accent => 1.5,
            ClickCategory::CountIn => 1.25,
            ClickCategory::Normal => 1.0,
            ClickCategory::Cue => 0.8,
        }
    }
}

/// A fully resolved click, ready for the audio callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledClick {
    /// Absolute audio-clock time in seconds
    pub time: f64,
    pub waveform: WaveformType,
    /// Final frequency in Hz (category multiplier applied)
    pub frequency: f32,
    pub decay: f32,
    pub pitch_sweep: bool,
    pub category: ClickCategory,
}

impl ScheduledClick {
    /// Resolve a click from its musical description
    pub fn resolve(time: f64, category: ClickCategory, sound: SoundId) -> Self {
        let recipe = sound.recipe();
        Self {
            time,
            waveform: recipe.waveform,
            frequency: recipe.frequency * category.frequency_multiplier(),
            decay: recipe.decay,
            pitch_sweep: recipe.pitch_sweep,
            category,
        }
    }

    /// Total audible length, attack to oscillator stop
    pub fn duration_seconds(&self) -> f32 {
        self.decay.max(ATTACK_SECONDS) + RELEASE_TAIL_SECONDS
    }
}

/// Seam between the scheduler and whatever produces sound
///
/// The cpal backend implements this with [`ClickSynthesizer`]; tests record
/// the calls instead.
pub trait ClickOutput: Send {
    fn play_click(&mut self, time: f64, category: ClickCategory, sound: SoundId) -> Result<()>;
}

/// Click synthesizer feeding the realtime renderer
pub struct ClickSynthesizer {
    producer: ClickProducer,
}

impl ClickSynthesizer {
    pub fn new(producer: ClickProducer) -> Self {
        Self { producer }
    }

    /// Free slots left in the queue to the audio callback
    pub fn free_capacity(&self) -> usize {
        self.producer.vacant_len()
    }
}

impl ClickOutput for ClickSynthesizer {
    fn play_click(&mut self, time: f64, category: ClickCategory, sound: SoundId) -> Result<()> {
        let click = ScheduledClick::resolve(time, category, sound);
        self.producer
            .try_push(click)
            .map_err(|_| MetronomeError::ClickQueueFull { time })
    }
}
