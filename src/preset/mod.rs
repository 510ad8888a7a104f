// Preset persistence - Saved practice setups (JSON)

pub mod manager;
pub mod types;

pub use manager::{PresetError, PresetStore};
pub use types::Preset;
