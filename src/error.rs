// Error types for the metronome engine

/// Errors surfaced by the engine
///
/// Timing never fails: bad numbers are clamped and unknown ids fall back.
/// What can fail is everything that touches the outside world.
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Audio output device '{0}' not found")]
    DeviceNotFound(String),

    #[error("Audio configuration error: {0}")]
    AudioConfig(String),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedSampleFormat(String),

    #[error("Error in stream creation: {0}")]
    StreamBuild(String),

    #[error("Could not start audio output: {0}")]
    StreamPlay(String),

    #[error("Click queue full, click at {time:.3}s dropped")]
    ClickQueueFull { time: f64 },

    #[error("Could not spawn scheduler timer: {0}")]
    Timer(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Preset error: {0}")]
    Preset(#[from] crate::preset::PresetError),
}

pub type Result<T> = std::result::Result<T, MetronomeError>;
