//! One parameterized pipeline from a selection to a complete view.
//!
//! Every request recomputes from scratch: resolve the selection, filter the
//! table, aggregate, build the map. Each section is a [`Panel`], so one
//! section having no data never hides the others.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{self, NoData, Precision, Profile, Summary};
use crate::catalog::{Dimension, IndicatorType, Variable};
use crate::config::DashboardConfig;
use crate::error::{BrujulaError, Result};
use crate::feature::FeatureTable;
use crate::loader::{self, LoadReport};
use crate::narrative::{Conclusion, Metric, Narrative};
use crate::render::map::{build_map, MapView, DEFAULT_TOOLTIP};
use crate::render::{PageContext, TileSource};
use crate::scale::{filter, ScaleOption};

// ── Tabs ──────────────────────────────────────────────────────────────────────

/// One of the five dimension tabs, or the consolidated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dimension(Dimension),
    Consolidated,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dimension(Dimension::HousingLand),
        Tab::Dimension(Dimension::Infrastructure),
        Tab::Dimension(Dimension::Amenities),
        Tab::Dimension(Dimension::Accessibility),
        Tab::Dimension(Dimension::LocalDevelopment),
        Tab::Consolidated,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Tab::Dimension(d) => d.key(),
            Tab::Consolidated => "consolidated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Dimension(d) => d.label(),
            Tab::Consolidated => "BRÚJULA CONSOLIDADA",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        if key == "consolidated" {
            return Some(Tab::Consolidated);
        }
        Dimension::from_key(key).map(Tab::Dimension)
    }
}

impl Default for Tab {
    fn default() -> Self {
        Tab::Dimension(Dimension::HousingLand)
    }
}

impl Serialize for Tab {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

// ── Request / view ────────────────────────────────────────────────────────────

/// Raw selection as it arrives in a query string or on the command line.
/// Every field is optional; anything absent or invalid falls back to the
/// first option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    /// Scale key, e.g. `municipio-santa-maria`.
    pub scale: Option<String>,
    pub locality: Option<String>,
    /// Dimension key or `consolidated`.
    pub tab: Option<String>,
    /// Indicator key, e.g. `public-works`.
    pub indicator: Option<String>,
    /// Variable code, e.g. `op-b3`.
    pub variable: Option<String>,
    /// Tile source name.
    pub tile: Option<String>,
}

/// The selection actually used after fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSelection {
    pub scale: ScaleOption,
    pub locality: Option<String>,
    pub tab: Tab,
    pub indicator: IndicatorType,
    /// Mapped variable; `None` on the consolidated tab or when no column of
    /// the dimension/indicator pair exists.
    pub variable: Option<Variable>,
    pub tile: TileSource,
}

/// One independently degradable section of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "kebab-case")]
pub enum Panel<T> {
    Ready(T),
    NoData(NoData),
}

impl<T> Panel<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(v) => Some(v),
            Panel::NoData(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }
}

impl<T> From<std::result::Result<T, NoData>> for Panel<T> {
    fn from(result: std::result::Result<T, NoData>) -> Self {
        match result {
            Ok(v) => Panel::Ready(v),
            Err(reason) => Panel::NoData(reason),
        }
    }
}

/// Everything one page (or one JSON summary) shows for a selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub selection: ResolvedSelection,
    /// Rows matched by the scale/locality filter.
    pub rows: usize,
    /// Locality dropdown options for the selected scale.
    pub localities: Vec<String>,
    /// Variable dropdown options; empty on the consolidated tab.
    pub variables: Vec<Variable>,
    pub metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_note: Option<String>,
    pub precision: Precision,
    /// Rows × indicator types with totals (0–20 radar).
    pub summary: Panel<Summary>,
    /// One indicator type across variables or dimensions (0–4 radar).
    pub profile: Panel<Profile>,
    pub conclusions: Vec<Conclusion>,
    pub map: Panel<MapView>,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// The loaded feature table plus everything needed to answer selections.
/// Immutable; share it behind an `Arc`.
#[derive(Debug)]
pub struct Dashboard {
    table: FeatureTable,
    config: DashboardConfig,
    narrative: Narrative,
    default_scale: ScaleOption,
}

impl Dashboard {
    pub fn new(table: FeatureTable, config: DashboardConfig, narrative: Narrative) -> Result<Self> {
        config.validate()?;
        let default_scale = config
            .scales
            .first()
            .cloned()
            .ok_or_else(|| BrujulaError::Config("no scales configured".into()))?;
        Ok(Self { table, config, narrative, default_scale })
    }

    /// Load the feature table and, when configured, the narrative sidecar.
    pub fn open(config: DashboardConfig) -> Result<(Self, LoadReport)> {
        config.validate()?;
        let (table, report) = loader::load_path(&config.data, &config.scales, config.schema)?;
        let narrative = match &config.narrative {
            Some(path) => Narrative::load(path)?,
            None => Narrative::default(),
        };
        Ok((Self::new(table, config, narrative)?, report))
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    /// Static page context: title, methodology link and dropdown registries.
    pub fn page_context(&self) -> PageContext<'_> {
        PageContext {
            title: &self.config.title,
            methodology_url: self.narrative.methodology_url.as_deref().unwrap_or(&self.config.methodology_url),
            scales: &self.config.scales,
            tiles: &self.config.tiles,
        }
    }

    /// Row count per configured scale, in registry order.
    pub fn scale_counts(&self) -> Vec<(String, usize)> {
        self.config
            .scales
            .options()
            .iter()
            .map(|o| (o.key.clone(), filter(&self.table, o, None).len()))
            .collect()
    }

    /// Compute the view for one selection.
    pub fn view(&self, request: &ViewRequest) -> DashboardView {
        let precision = self.config.precision;

        // ── 1. Resolve the selection ────────────────────────────────────────
        let scale = self.resolve_scale(request.scale.as_deref());
        let locality = request.locality.as_deref().filter(|l| !l.is_empty()).map(str::to_string);
        let tab = resolve_key(request.tab.as_deref(), "tab", Tab::from_key).unwrap_or_default();
        let indicator = resolve_key(request.indicator.as_deref(), "indicator", IndicatorType::from_key)
            .unwrap_or(IndicatorType::Rights);
        let tile = self.config.tiles.resolve(request.tile.as_deref());
        if let Some(name) = request.tile.as_deref() {
            if self.config.tiles.get(name).is_none() {
                warn!(tile = name, fallback = %tile.name, "unknown tile source");
            }
        }

        // ── 2. Filter ───────────────────────────────────────────────────────
        let localities = filter(&self.table, &scale, None).localities();
        let selection = filter(&self.table, &scale, locality.as_deref());
        debug!(scale = %scale.key, locality = ?locality, rows = selection.len(), "selection filtered");

        // ── 3. Aggregate ────────────────────────────────────────────────────
        let (summary, profile, variables) = match tab {
            Tab::Dimension(dimension) => {
                let variables: Vec<Variable> = dimension
                    .variables(indicator)
                    .into_iter()
                    .filter(|v| self.table.has_column(*v))
                    .collect();
                (
                    aggregate::dimension_summary(&selection, dimension),
                    aggregate::variable_profile(&selection, dimension, indicator),
                    variables,
                )
            }
            Tab::Consolidated => (
                aggregate::consolidated(&selection),
                aggregate::dimension_profile(&selection, indicator),
                Vec::new(),
            ),
        };
        let summary = summary.map(|s| s.rounded(precision));
        let profile = profile.map(|p| p.rounded(precision));

        // ── 4. Map ──────────────────────────────────────────────────────────
        let variable = resolve_variable(request.variable.as_deref(), &variables);
        let map = match (tab, variable) {
            (Tab::Consolidated, _) => Err(NoData::NotApplicable),
            (Tab::Dimension(_), None) => Err(NoData::MissingColumns),
            (Tab::Dimension(_), Some(v)) => build_map(
                &selection,
                v,
                &tile,
                self.config.zoom,
                self.config.fallback_center,
                &DEFAULT_TOOLTIP,
            ),
        };

        // ── 5. Narrative ────────────────────────────────────────────────────
        let metrics = self.narrative.metrics_for(&scale.key, locality.as_deref()).to_vec();
        let conclusions = match tab {
            Tab::Dimension(dimension) => {
                let items = dimension.variables(indicator);
                self.narrative.conclusions_for(&scale.key, locality.as_deref(), &items)
            }
            Tab::Consolidated => Vec::new(),
        };

        DashboardView {
            selection: ResolvedSelection { scale, locality, tab, indicator, variable, tile },
            rows: selection.len(),
            localities,
            variables,
            metrics,
            metrics_note: self.narrative.metrics_note.clone(),
            precision,
            summary: summary.into(),
            profile: profile.into(),
            conclusions,
            map: map.into(),
        }
    }

    fn resolve_scale(&self, key: Option<&str>) -> ScaleOption {
        match key {
            None => self.default_scale.clone(),
            Some(k) => match self.config.scales.get(k) {
                Some(option) => option.clone(),
                None => {
                    warn!(scale = k, fallback = %self.default_scale.key, "unknown scale");
                    self.default_scale.clone()
                }
            },
        }
    }
}

fn resolve_key<T>(raw: Option<&str>, what: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw);
    if parsed.is_none() {
        warn!(value = raw, field = what, "unknown selection value, using default");
    }
    parsed
}

/// The requested variable when it is one of `options`, else the first option.
fn resolve_variable(raw: Option<&str>, options: &[Variable]) -> Option<Variable> {
    let first = options.first().copied();
    let Some(code) = raw else { return first };
    match Variable::parse(code) {
        Some(v) if options.contains(&v) => Some(v),
        _ => {
            if !options.is_empty() {
                warn!(variable = code, "variable not available for this selection, using first");
            }
            first
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::feature::tests::feature;
    use crate::loader::tests::{collection, full_props};

    fn dashboard() -> Dashboard {
        let rows = vec![
            feature("MUN-1-01", Some("Santa María"), &[("d-a1", 4), ("op-b3", 2)]),
            feature("MUN-1-02", Some("Santa María"), &[("d-a1", 3), ("op-b3", 4)]),
            feature("MUN-1-03", Some("Fuerte Quemado"), &[("d-a1", 2)]),
            feature("MUN-1-04", Some("Fuerte Quemado"), &[("d-a1", 4)]),
            feature("MUN-1-05", Some("Fuerte Quemado"), &[("d-a1", 3)]),
            feature("LOC-001", Some("San José"), &[("d-a1", 1)]),
        ];
        let narrative = Narrative::from_json(
            r#"{ "metrics": { "municipio-santa-maria": [ { "label": "Personas*", "value": "26822" } ] },
                 "conclusions": { "municipio-santa-maria": { "d-a1": "Buena tenencia." } } }"#,
        )
        .unwrap();
        Dashboard::new(FeatureTable::new(rows), DashboardConfig::default(), narrative).unwrap()
    }

    fn request(pairs: &[(&str, &str)]) -> ViewRequest {
        let mut r = ViewRequest::default();
        for &(k, v) in pairs {
            let v = Some(v.to_string());
            match k {
                "scale" => r.scale = v,
                "locality" => r.locality = v,
                "tab" => r.tab = v,
                "indicator" => r.indicator = v,
                "variable" => r.variable = v,
                "tile" => r.tile = v,
                _ => unreachable!(),
            }
        }
        r
    }

    #[test]
    fn default_request_uses_first_options() {
        let d = dashboard();
        let view = d.view(&ViewRequest::default());
        assert_eq!(view.selection.scale.key, "departamento");
        assert_eq!(view.selection.tab, Tab::Dimension(Dimension::HousingLand));
        assert_eq!(view.selection.indicator, IndicatorType::Rights);
        assert_eq!(view.selection.tile.name, "Fondo Mapa");
        assert_eq!(view.rows, 0);
        assert_eq!(view.summary, Panel::NoData(NoData::EmptySelection));
        assert_eq!(view.map.ready().map(|m| m.feature_count()), None);
        assert!(matches!(view.map, Panel::NoData(NoData::EmptySelection)));
    }

    #[test]
    fn municipality_dimension_view() {
        let d = dashboard();
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("variable", "d-a1")]));
        assert_eq!(view.rows, 5);
        assert_eq!(view.localities, ["Fuerte Quemado", "Santa María"]);

        let summary = view.summary.ready().unwrap();
        assert_eq!(summary.rows[0].values[0], Some(3.2));
        assert_eq!(view.profile.ready().unwrap().entries[0].value, 3.2);

        let map = view.map.ready().unwrap();
        assert_eq!(map.feature_count(), 5);
        assert_eq!(map.variable.code(), "d-a1");

        assert_eq!(view.metrics.len(), 1);
        assert_eq!(view.conclusions.len(), 1);
        assert_eq!(view.conclusions[0].text, "Buena tenencia.");
    }

    #[test]
    fn locality_narrows_selection() {
        let d = dashboard();
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("locality", "Fuerte Quemado")]));
        assert_eq!(view.rows, 3);
        assert_eq!(view.summary.ready().unwrap().rows[0].values[0], Some(3.0));
        // Dropdown still lists every locality of the scale.
        assert_eq!(view.localities.len(), 2);
    }

    #[test]
    fn unknown_locality_is_an_empty_selection() {
        let d = dashboard();
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("locality", "Nowhere")]));
        assert_eq!(view.rows, 0);
        assert!(matches!(view.summary, Panel::NoData(NoData::EmptySelection)));
        assert!(matches!(view.map, Panel::NoData(NoData::EmptySelection)));
    }

    #[test]
    fn locality_must_match_exactly() {
        let d = dashboard();
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("locality", " Fuerte Quemado")]));
        assert_eq!(view.rows, 0);
        assert!(matches!(view.summary, Panel::NoData(NoData::EmptySelection)));

        // The "Todas" option submits an empty locality.
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("locality", "")]));
        assert_eq!(view.rows, 5);
        assert_eq!(view.selection.locality, None);
    }

    #[test]
    fn invalid_selections_fall_back() {
        let d = dashboard();
        let view = d.view(&request(&[
            ("scale", "nope"),
            ("tab", "nope"),
            ("indicator", "nope"),
            ("variable", "n-e5"),
            ("tile", "nope"),
        ]));
        assert_eq!(view.selection.scale.key, "departamento");
        assert_eq!(view.selection.tab, Tab::default());
        assert_eq!(view.selection.indicator, IndicatorType::Rights);
        assert_eq!(view.selection.variable.map(|v| v.code()), Some("d-a1".to_string()));
        assert_eq!(view.selection.tile.name, "Fondo Mapa");
    }

    #[test]
    fn variable_outside_dimension_falls_back_to_first() {
        let d = dashboard();
        let view = d.view(&request(&[
            ("scale", "municipio-santa-maria"),
            ("tab", "infrastructure"),
            ("indicator", "public-works"),
            ("variable", "d-a1"),
        ]));
        assert_eq!(view.selection.variable.map(|v| v.code()), Some("op-b1".to_string()));
        let codes: Vec<String> = view.variables.iter().map(|v| v.code()).collect();
        assert_eq!(codes, ["op-b1", "op-b2", "op-b3", "op-b4", "op-b5"]);

        let view = d.view(&request(&[
            ("scale", "municipio-santa-maria"),
            ("tab", "infrastructure"),
            ("indicator", "public-works"),
            ("variable", "op-b3"),
        ]));
        let map = view.map.ready().unwrap();
        assert_eq!(map.variable.code(), "op-b3");
    }

    #[test]
    fn consolidated_tab_has_no_map() {
        let d = dashboard();
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("tab", "consolidated")]));
        assert_eq!(view.selection.tab, Tab::Consolidated);
        assert!(view.variables.is_empty());
        assert_eq!(view.selection.variable, None);
        assert!(matches!(view.map, Panel::NoData(NoData::NotApplicable)));
        let summary = view.summary.ready().unwrap();
        assert_eq!(summary.totals_label, "SUMA");
        assert_eq!(summary.rows.len(), 5);
        assert!(view.conclusions.is_empty());
    }

    #[test]
    fn missing_columns_degrade_sections_independently() {
        let columns: BTreeSet<Variable> = Variable::all().filter(|v| v.indicator() != IndicatorType::Norms).collect();
        let table = FeatureTable::with_columns(vec![feature("LOC-1", None, &[("d-a1", 2)])], columns);
        let d = Dashboard::new(table, DashboardConfig::default(), Narrative::default()).unwrap();
        let view = d.view(&request(&[("scale", "localidades"), ("indicator", "norms")]));
        assert!(view.summary.is_ready());
        assert!(matches!(view.profile, Panel::NoData(NoData::MissingColumns)));
        assert!(matches!(view.map, Panel::NoData(NoData::MissingColumns)));
        assert!(view.variables.is_empty());
    }

    #[test]
    fn scale_counts_follow_registry_order() {
        let d = dashboard();
        let counts = d.scale_counts();
        let keys: Vec<&str> = counts.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["departamento", "municipio-santa-maria", "municipio-san-jose", "localidades", "manzanas"]);
        assert_eq!(counts[1].1, 5);
        assert_eq!(counts[3].1, 1);
    }

    #[test]
    fn tab_keys_round_trip() {
        for tab in Tab::ALL {
            assert_eq!(Tab::from_key(tab.key()), Some(tab));
        }
        assert_eq!(Tab::Consolidated.label(), "BRÚJULA CONSOLIDADA");
    }

    #[test]
    fn view_serializes_with_panel_status() {
        let d = dashboard();
        let view = d.view(&request(&[("scale", "municipio-santa-maria"), ("tab", "consolidated")]));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["selection"]["tab"], "consolidated");
        assert_eq!(json["summary"]["status"], "ready");
        assert_eq!(json["map"]["status"], "no-data");
        assert_eq!(json["map"]["data"], "not-applicable");
    }

    #[test]
    fn new_rejects_empty_scale_registry() {
        let config = DashboardConfig { scales: crate::scale::ScaleRegistry::new(Vec::new()), ..Default::default() };
        assert!(Dashboard::new(FeatureTable::default(), config, Narrative::default()).is_err());
    }

    // ── Files on disk ───────────────────────────────────────────────────────

    /// Fresh scratch directory per test.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brujula-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_data(dir: &Path) -> PathBuf {
        let mut sparse = full_props("LOC-002", 1);
        sparse.remove("d-a1");
        let text = collection(vec![full_props("MUN-1-01", 3), full_props("LOC-001", 2), sparse]);
        let path = dir.join("consolidado.geojson");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn open_loads_table_and_narrative_from_disk() {
        let dir = scratch("open");
        let data = write_data(&dir);
        let narrative = dir.join("narrativa.json");
        fs::write(
            &narrative,
            r#"{ "methodology_url": "https://example.org/metodo",
                 "metrics": { "localidades": [ { "label": "Personas*", "value": "1200" } ] } }"#,
        )
        .unwrap();
        let config_path = dir.join("brujula.json");
        let config_json = serde_json::json!({ "data": data, "narrative": narrative, "zoom": 11 });
        fs::write(&config_path, config_json.to_string()).unwrap();

        let config = DashboardConfig::load(&config_path).unwrap();
        assert_eq!(config.zoom, 11);
        let (dashboard, report) = Dashboard::open(config).unwrap();
        assert_eq!(report.features, 3);
        assert_eq!(report.dropped_features, 0);
        assert!(report.missing_columns.is_empty());
        assert_eq!(report.unknown_scores.get("d-a1"), Some(&1));
        assert_eq!(dashboard.table().len(), 3);
        assert_eq!(dashboard.page_context().methodology_url, "https://example.org/metodo");

        let view = dashboard.view(&request(&[("scale", "localidades")]));
        assert_eq!(view.rows, 2);
        assert_eq!(view.metrics.len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_without_narrative_uses_empty_narrative() {
        let dir = scratch("no-narrative");
        let config = DashboardConfig { data: write_data(&dir), ..Default::default() };
        let (dashboard, _) = Dashboard::open(config).unwrap();
        assert_eq!(dashboard.narrative(), &Narrative::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn configured_but_absent_narrative_fails_with_path() {
        let dir = scratch("absent-narrative");
        let missing = dir.join("no-such-narrative.json");
        let config = DashboardConfig { data: write_data(&dir), narrative: Some(missing.clone()), ..Default::default() };
        match Dashboard::open(config).unwrap_err() {
            BrujulaError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn absent_config_file_fails_with_path() {
        let missing = std::env::temp_dir().join(format!("brujula-no-config-{}.json", std::process::id()));
        match DashboardConfig::load(&missing).unwrap_err() {
            BrujulaError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(DashboardConfig::load_or_default(None).unwrap(), DashboardConfig::default());
    }
}
