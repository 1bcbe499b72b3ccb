use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DataError;
use crate::map::DEFAULT_MAX_BATCH_PATHS;
use crate::stage::FontSource;

/// Tunables for a render. Every field has a default, so a JSON config
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Output width in px
    pub width: u32,
    /// Output height in px
    pub height: u32,
    /// Water-area and park elements processed per step
    pub polygon_chunk: usize,
    /// Waterway elements processed per step
    pub waterway_chunk: usize,
    /// Road elements processed per step
    pub road_chunk: usize,
    /// Paths per draw call before a batch is split
    pub max_batch_paths: usize,
    pub fonts: FontSource,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1600,
            polygon_chunk: 500,
            waterway_chunk: 500,
            road_chunk: 1000,
            max_batch_paths: DEFAULT_MAX_BATCH_PATHS,
            fonts: FontSource::System,
        }
    }
}

impl RenderOptions {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Multiplier applied to stroke widths and type sizes
    pub fn scale(&self) -> f32 {
        self.width as f32 / 1200.0
    }
}
