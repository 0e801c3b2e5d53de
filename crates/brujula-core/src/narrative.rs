//! Narrative sidecar: general metrics and preliminary conclusions authored
//! per scale, outside the feature table.
//!
//! Entries are keyed by scale key, or by `"{scale}/{locality}"` when a
//! locality needs its own text. Lookups try the locality key first.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Variable;
use crate::error::{BrujulaError, Result};

/// One figure of the metrics strip, e.g. `Personas* 26822 (19,4 %)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    /// Intercensal variation, shown next to the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

/// A titled paragraph; the title is the variable's display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conclusion {
    pub variable: Variable,
    pub title: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Narrative {
    /// Overrides the configured methodology link when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methodology_url: Option<String>,
    /// Caption under the metrics strip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_note: Option<String>,
    pub metrics: BTreeMap<String, Vec<Metric>>,
    /// Scale key → variable code → paragraph.
    pub conclusions: BTreeMap<String, BTreeMap<String, String>>,
}

impl Narrative {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| BrujulaError::Io { path: path.to_path_buf(), source })?;
        let narrative = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            metrics = narrative.metrics.len(),
            conclusions = narrative.conclusions.len(),
            "narrative loaded"
        );
        Ok(narrative)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let narrative: Self = serde_json::from_str(text)?;
        for codes in narrative.conclusions.values() {
            for code in codes.keys() {
                if Variable::parse(code).is_none() {
                    return Err(BrujulaError::UnknownVariable(code.clone()));
                }
            }
        }
        Ok(narrative)
    }

    fn lookup<'a, T>(map: &'a BTreeMap<String, T>, scale: &str, locality: Option<&str>) -> Option<&'a T> {
        locality
            .and_then(|l| map.get(&format!("{scale}/{l}")))
            .or_else(|| map.get(scale))
    }

    pub fn metrics_for(&self, scale: &str, locality: Option<&str>) -> &[Metric] {
        Self::lookup(&self.metrics, scale, locality).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Conclusions for the given variables, in the order given. Variables
    /// without text are skipped.
    pub fn conclusions_for(&self, scale: &str, locality: Option<&str>, variables: &[Variable]) -> Vec<Conclusion> {
        let Some(texts) = Self::lookup(&self.conclusions, scale, locality) else {
            return Vec::new();
        };
        variables
            .iter()
            .filter_map(|&v| {
                texts.get(&v.code()).map(|text| Conclusion { variable: v, title: v.label(), text: text.clone() })
            })
            .collect()
    }
}
