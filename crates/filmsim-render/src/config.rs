//! Renderer configuration.

use filmsim_color::GrainSettings;
use filmsim_core::{memory_budget, FilmSimError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a [`Renderer`](crate::Renderer). Missing JSON fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Longest edge of thumbnails.
    pub thumbnail_max_dim: u32,
    /// Initial LUT intensity.
    pub intensity: f32,
    /// Initial grain settings.
    pub grain: GrainSettings,
    /// Optional grain image overriding the generated textures.
    pub grain_texture: Option<PathBuf>,
    /// Use the GPU for preview and export when an adapter is available.
    pub gpu_enabled: bool,
    /// Estimated GPU bytes a single export may use.
    pub gpu_memory_budget: usize,
    /// Largest raster the CPU export path will allocate.
    pub cpu_memory_budget: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            thumbnail_max_dim: memory_budget::THUMBNAIL_MAX_DIM,
            intensity: 1.0,
            grain: GrainSettings::default(),
            grain_texture: None,
            gpu_enabled: true,
            gpu_memory_budget: memory_budget::GPU_EXPORT_BUDGET,
            cpu_memory_budget: memory_budget::CPU_EXPORT_BUDGET,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FilmSimError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FilmSimError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| FilmSimError::Config(e.to_string()))
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    /// Reject values no renderer can work with.
    pub fn validate(&self) -> Result<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(FilmSimError::Config("viewport must be non-empty".into()));
        }
        if self.thumbnail_max_dim == 0 {
            return Err(FilmSimError::Config("thumbnail_max_dim must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(FilmSimError::Config(format!(
                "intensity {} is outside [0, 1]",
                self.intensity
            )));
        }
        if !(self.grain.scale.is_finite() && self.grain.scale > 0.0) {
            return Err(FilmSimError::Config("grain scale must be positive".into()));
        }
        Ok(())
    }
}
