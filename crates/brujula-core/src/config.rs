//! Dashboard configuration. Every field has a default, so an empty JSON
//! object (or no file at all) yields the Santa María deployment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::Precision;
use crate::error::{BrujulaError, Result};
use crate::geometry::{LatLon, FALLBACK_CENTER};
use crate::loader::SchemaPolicy;
use crate::render::TileRegistry;
use crate::scale::ScaleRegistry;

pub const DEFAULT_TITLE: &str = "PLATAFORMA DE LA BRÚJULA";
pub const DEFAULT_METHODOLOGY_URL: &str = "https://santifederico.github.io/plataforma-brujula/pages/metodologia.html";
pub const DEFAULT_ZOOM: u8 = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Consolidated GeoJSON feature collection.
    pub data: PathBuf,
    /// Optional narrative sidecar (metrics and conclusions).
    pub narrative: Option<PathBuf>,
    /// Listen address of the HTTP server.
    pub bind: String,
    pub title: String,
    pub methodology_url: String,
    pub scales: ScaleRegistry,
    pub tiles: TileRegistry,
    /// Map center used when the selection has no usable geometry.
    pub fallback_center: LatLon,
    /// Initial map zoom, 0–19.
    pub zoom: u8,
    pub schema: SchemaPolicy,
    /// Rounding applied to tables and radars.
    pub precision: Precision,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::from("data/gdf_consolidado.geojson"),
            narrative: None,
            bind: "127.0.0.1:8080".to_string(),
            title: DEFAULT_TITLE.to_string(),
            methodology_url: DEFAULT_METHODOLOGY_URL.to_string(),
            scales: ScaleRegistry::santa_maria(),
            tiles: TileRegistry::default(),
            fallback_center: FALLBACK_CENTER,
            zoom: DEFAULT_ZOOM,
            schema: SchemaPolicy::Strict,
            precision: Precision::Hundredths,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| BrujulaError::Io { path: path.to_path_buf(), source })?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// [`DashboardConfig::load`] when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scales.is_empty() {
            return Err(BrujulaError::Config("at least one scale must be configured".into()));
        }
        if let Some(option) = self.scales.options().iter().find(|o| o.prefixes.iter().all(|p| p.is_empty())) {
            return Err(BrujulaError::Config(format!("scale {:?} has no COD prefix", option.key)));
        }
        for (i, a) in self.scales.options().iter().enumerate() {
            if self.scales.options()[..i].iter().any(|b| b.key == a.key) {
                return Err(BrujulaError::Config(format!("duplicate scale key {:?}", a.key)));
            }
        }
        if self.tiles.sources().is_empty() {
            return Err(BrujulaError::Config("at least one tile source must be configured".into()));
        }
        if self.zoom > 19 {
            return Err(BrujulaError::Config(format!("zoom {} is outside 0..=19", self.zoom)));
        }
        Ok(())
    }
}
