//! Administrative scales and the prefix filter over the feature table.
//!
//! A feature's scale is encoded in the prefix of its `COD`. Filtering is an
//! exact, case-sensitive `starts_with`; an empty result is a normal outcome.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, FeatureTable, LOCALITY_FIELD};

/// Administrative granularity of a scale option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleKind {
    Department,
    Municipality,
    Locality,
    Block,
}

/// One entry of the scale dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleOption {
    /// Stable key used in URLs and narrative lookups.
    pub key: String,
    pub label: String,
    pub kind: ScaleKind,
    /// Any of these prefixes selects a feature.
    pub prefixes: Vec<String>,
}

impl ScaleOption {
    pub fn new(key: &str, label: &str, kind: ScaleKind, prefixes: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[inline]
    pub fn matches(&self, cod: &str) -> bool {
        self.prefixes.iter().any(|p| cod.starts_with(p.as_str()))
    }
}

/// Ordered set of scale options. The first entry is the default selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleRegistry {
    options: Vec<ScaleOption>,
}

impl ScaleRegistry {
    pub fn new(options: Vec<ScaleOption>) -> Self {
        Self { options }
    }

    /// Scales of the Santa María department dataset.
    pub fn santa_maria() -> Self {
        Self::new(vec![
            ScaleOption::new(
                "departamento",
                "Departamento de Santa María",
                ScaleKind::Department,
                &["DEPTO-", "DPTO-"],
            ),
            ScaleOption::new(
                "municipio-santa-maria",
                "Municipio de Santa María",
                ScaleKind::Municipality,
                &["MUN-1"],
            ),
            ScaleOption::new(
                "municipio-san-jose",
                "Municipio de San José",
                ScaleKind::Municipality,
                &["MUN-2"],
            ),
            ScaleOption::new(
                "localidades",
                "Localidades y áreas rurales del Departamento de Santa María",
                ScaleKind::Locality,
                &["LOC-"],
            ),
            ScaleOption::new(
                "manzanas",
                "Manzanas del Departamento de Santa María",
                ScaleKind::Block,
                &["MAN-"],
            ),
        ])
    }

    pub fn options(&self) -> &[ScaleOption] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ScaleOption> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn first(&self) -> Option<&ScaleOption> {
        self.options.first()
    }

    /// All options whose prefixes match `cod`. A well-formed code matches
    /// exactly one.
    pub fn classify<'a>(&'a self, cod: &'a str) -> impl Iterator<Item = &'a ScaleOption> + 'a {
        self.options.iter().filter(move |o| o.matches(cod))
    }
}

impl Default for ScaleRegistry {
    fn default() -> Self {
        Self::santa_maria()
    }
}

/// A filtered view of a [`FeatureTable`]. Borrowing keeps the table immutable
/// and lets the aggregator see which score columns the table actually has.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    table: &'a FeatureTable,
    rows: Vec<&'a Feature>,
}

impl<'a> Selection<'a> {
    /// Every row of the table.
    pub fn all(table: &'a FeatureTable) -> Self {
        Self { table, rows: table.features().iter().collect() }
    }

    /// Keep rows whose `COD` starts with one of the scale's prefixes.
    pub fn scale(self, scale: &ScaleOption) -> Self {
        self.retain(|f| scale.matches(f.cod()))
    }

    /// Keep rows whose `LOCALIDAD` equals `locality` exactly.
    pub fn locality(self, locality: &str) -> Self {
        self.retain(|f| f.attribute(LOCALITY_FIELD) == Some(locality))
    }

    fn retain(mut self, keep: impl Fn(&Feature) -> bool) -> Self {
        self.rows.retain(|f| keep(f));
        self
    }

    pub fn table(&self) -> &'a FeatureTable {
        self.table
    }

    pub fn rows(&self) -> &[&'a Feature] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct, sorted `LOCALIDAD` values among the selected rows.
    pub fn localities(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|f| f.attribute(LOCALITY_FIELD))
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Rows of `table` in `scale`, optionally narrowed to one locality.
pub fn filter<'a>(table: &'a FeatureTable, scale: &ScaleOption, locality: Option<&str>) -> Selection<'a> {
    let selection = Selection::all(table).scale(scale);
    match locality {
        Some(name) => selection.locality(name),
        None => selection,
    }
}
