//! Base-map tile sources. The selected source is passed explicitly down the
//! render chain; nothing here is shared mutable state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSource {
    /// Name shown in the dropdown; also the selection key.
    pub name: String,
    /// Leaflet URL template with `{z}`, `{x}`, `{y}` (and optionally `{s}`).
    pub url: String,
    pub attribution: String,
}

impl TileSource {
    pub fn new(name: &str, url: &str, attribution: &str) -> Self {
        Self { name: name.to_string(), url: url.to_string(), attribution: attribution.to_string() }
    }

    pub fn openstreetmap() -> Self {
        Self::new(
            "Fondo Mapa",
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
        )
    }

    pub fn esri_imagery() -> Self {
        Self::new(
            "Fondo Satelital",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            "Tiles &copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community",
        )
    }
}

/// Ordered tile sources; the first is the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileRegistry {
    sources: Vec<TileSource>,
}

impl TileRegistry {
    pub fn new(sources: Vec<TileSource>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[TileSource] {
        &self.sources
    }

    pub fn get(&self, name: &str) -> Option<&TileSource> {
        self.sources.iter().find(|t| t.name == name)
    }

    pub fn default_source(&self) -> TileSource {
        self.sources.first().cloned().unwrap_or_else(TileSource::openstreetmap)
    }

    /// The named source, or the default when the name is absent or unknown.
    pub fn resolve(&self, name: Option<&str>) -> TileSource {
        name.and_then(|n| self.get(n)).cloned().unwrap_or_else(|| self.default_source())
    }
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new(vec![TileSource::openstreetmap(), TileSource::esri_imagery()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_name_with_default_fallback() {
        let reg = TileRegistry::default();
        assert_eq!(reg.resolve(None).name, "Fondo Mapa");
        assert_eq!(reg.resolve(Some("Fondo Satelital")).name, "Fondo Satelital");
        assert_eq!(reg.resolve(Some("Nope")).name, "Fondo Mapa");
    }

    #[test]
    fn empty_registry_still_has_a_default() {
        let reg = TileRegistry::new(Vec::new());
        assert_eq!(reg.resolve(Some("Fondo Satelital")), TileSource::openstreetmap());
    }
}
