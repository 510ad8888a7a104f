// Preset store - JSON list of presets on disk

use super::types::Preset;
use std::path::{Path, PathBuf};

/// Preset error types
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("No data directory available on this platform")]
    NoDataDir,

    #[error("Preset '{0}' not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Presets persisted as one pretty-printed JSON array
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/clicktrack/presets.json`
    pub fn default_path() -> Result<PathBuf, PresetError> {
        dirs::data_dir()
            .map(|dir| dir.join("clicktrack").join("presets.json"))
            .ok_or(PresetError::NoDataDir)
    }

    pub fn open_default() -> Result<Self, PresetError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every preset. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<Preset>, PresetError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json_str = std::fs::read_to_string(&self.path)?;
        let presets: Vec<Preset> = serde_json::from_str(&json_str)?;
        Ok(presets)
    }

    /// Like `load`, but an unreadable store yields an empty list
    pub fn load_or_default(&self) -> Vec<Preset> {
        match self.load() {
            Ok(presets) => presets,
            Err(e) => {
                log::warn!("Ignoring preset file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, presets: &[Preset]) -> Result<(), PresetError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json_str = serde_json::to_string_pretty(presets)?;
        std::fs::write(&self.path, json_str)?;
        log::debug!("Saved {} presets to {}", presets.len(), self.path.display());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Preset, PresetError> {
        self.load()?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    /// Insert a preset, replacing any existing one with the same name
    pub fn add(&self, preset: Preset) -> Result<(), PresetError> {
        let mut presets = self.load()?;
        match presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => presets.push(preset),
        }
        self.save(&presets)
    }

    pub fn remove(&self, name: &str) -> Result<(), PresetError> {
        let mut presets = self.load()?;
        let before = presets.len();
        presets.retain(|p| p.name != name);
        if presets.len() == before {
            return Err(PresetError::NotFound(name.to_string()));
        }
        self.save(&presets)
    }
}
