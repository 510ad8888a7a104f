// clicktrack - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod messaging;
pub mod preset;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, OutputDevice};
pub use audio::timing::{AudioClock, ManualClock, SampleClock};
pub use config::EngineConfig;
pub use error::{MetronomeError, Result};
pub use messaging::beat_bus::{BeatEvent, BeatEventBus, Subscription};
pub use preset::{Preset, PresetError, PresetStore};
pub use sequencer::{
    Metronome, MetronomeHandle, Scheduler, SilentMode, Subdivision, TempoRamp, TransportSnapshot,
    TransportState,
};
pub use synth::click::{ClickCategory, ClickOutput, ClickSynthesizer};
pub use synth::sound_bank::SoundId;
