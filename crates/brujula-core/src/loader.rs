//! GeoJSON → [`FeatureTable`].
//!
//! The loader is the only place that looks at raw property names. It checks
//! the schema against the catalog once, so nothing downstream formats column
//! names by hand.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use geojson::{GeoJson, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Variable, MAX_SCORE};
use crate::error::{BrujulaError, Result};
use crate::feature::{Feature, FeatureTable, ATTRIBUTE_FIELDS, COD_FIELD};
use crate::scale::ScaleRegistry;

/// How strictly the loader enforces the expected schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaPolicy {
    /// Any absent score column or unrecognized `COD` prefix fails the load.
    #[default]
    Strict,
    /// Absent columns are recorded and skipped by the views; features with an
    /// unrecognized prefix are dropped. Both are logged.
    Lenient,
}

/// Summary of what the loader accepted, for logging and `report check`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub features: usize,
    pub dropped_features: usize,
    pub missing_columns: Vec<String>,
    /// Column → number of cells that were absent, null, non-integer or out of
    /// range, for columns present in at least one feature.
    pub unknown_scores: BTreeMap<String, usize>,
}

pub fn load_path(path: &Path, scales: &ScaleRegistry, policy: SchemaPolicy) -> Result<(FeatureTable, LoadReport)> {
    let file = File::open(path).map_err(|source| BrujulaError::Io { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "loading feature table");
    load_reader(BufReader::new(file), scales, policy)
}

pub fn load_reader<R: Read>(reader: R, scales: &ScaleRegistry, policy: SchemaPolicy) -> Result<(FeatureTable, LoadReport)> {
    let geojson = GeoJson::from_reader(reader)?;
    from_geojson(geojson, scales, policy)
}

pub fn load_str(text: &str, scales: &ScaleRegistry, policy: SchemaPolicy) -> Result<(FeatureTable, LoadReport)> {
    let geojson: GeoJson = text.parse()?;
    from_geojson(geojson, scales, policy)
}

pub fn from_geojson(geojson: GeoJson, scales: &ScaleRegistry, policy: SchemaPolicy) -> Result<(FeatureTable, LoadReport)> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(BrujulaError::NotAFeatureCollection),
    };

    let mut report = LoadReport::default();
    // Column → number of features carrying the key.
    let mut seen: BTreeMap<Variable, usize> = BTreeMap::new();
    let mut features = Vec::with_capacity(collection.features.len());
    let empty = JsonObject::new();

    for (index, raw) in collection.features.into_iter().enumerate() {
        let props = raw.properties.as_ref().unwrap_or(&empty);

        let cod = match props.get(COD_FIELD) {
            Some(JsonValue::String(s)) => s.clone(),
            _ => return Err(BrujulaError::MissingCod { index }),
        };

        let scales_hit: Vec<String> = scales.classify(&cod).map(|o| o.key.clone()).collect();
        if scales_hit.len() != 1 {
            let err = if scales_hit.is_empty() {
                BrujulaError::UnknownScalePrefix { cod }
            } else {
                BrujulaError::AmbiguousScalePrefix { cod, scales: scales_hit }
            };
            match policy {
                SchemaPolicy::Strict => return Err(err),
                SchemaPolicy::Lenient => {
                    warn!("dropping feature: {err}");
                    report.dropped_features += 1;
                    continue;
                }
            }
        }

        let mut feature = Feature::new(cod, raw.geometry);
        for name in ATTRIBUTE_FIELDS {
            if let Some(text) = props.get(name).and_then(attribute_text) {
                feature = feature.with_attribute(name, text);
            }
        }

        for variable in Variable::all() {
            let code = variable.code();
            let Some(value) = props.get(&code) else { continue };
            *seen.entry(variable).or_default() += 1;
            let score = parse_score(value);
            if score.is_none() {
                *report.unknown_scores.entry(code).or_default() += 1;
            }
            feature = feature.with_score(variable, score);
        }

        features.push(feature);
    }

    report.features = features.len();
    for (variable, &count) in &seen {
        let absent = report.features - count;
        if absent > 0 {
            *report.unknown_scores.entry(variable.code()).or_default() += absent;
        }
    }
    let present: BTreeSet<Variable> = seen.into_keys().collect();
    let table = FeatureTable::with_columns(features, present);
    report.missing_columns = table.missing_columns().iter().map(|v| v.code()).collect();

    if !report.missing_columns.is_empty() {
        if table.is_empty() {
            warn!("feature table is empty; schema cannot be checked");
        } else {
            match policy {
                SchemaPolicy::Strict => {
                    return Err(BrujulaError::MissingColumns { columns: report.missing_columns });
                }
                SchemaPolicy::Lenient => warn!(
                    count = report.missing_columns.len(),
                    columns = %report.missing_columns.join(","),
                    "score columns absent; affected variables will be skipped"
                ),
            }
        }
    }

    for (column, count) in &report.unknown_scores {
        debug!(column = %column, count, "cells without a usable score");
    }
    if !report.unknown_scores.is_empty() {
        let total: usize = report.unknown_scores.values().sum();
        warn!(cells = total, columns = report.unknown_scores.len(), "scores outside 0..=4 or missing are treated as unknown");
    }

    info!(features = report.features, dropped = report.dropped_features, "feature table loaded");
    Ok((table, report))
}

/// Integer scores in `0..=MAX_SCORE` only. Floats with no fractional part are
/// accepted since GeoJSON writers often emit `3.0`.
fn parse_score(value: &JsonValue) -> Option<u8> {
    let n = value.as_f64()?;
    if !n.is_finite() || n.fract() != 0.0 || n < 0.0 || n > f64::from(MAX_SCORE) {
        return None;
    }
    Some(n as u8)
}

fn attribute_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
