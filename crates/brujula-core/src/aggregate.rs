//! Means over a [`Selection`]: per-dimension summaries, per-indicator profiles
//! and the consolidated cross-dimension view.
//!
//! Cells that cannot be computed are `None` rather than NaN; a summary that
//! would be entirely empty is reported as [`NoData`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Dimension, IndicatorType, Variable};
use crate::scale::Selection;

/// Totals row label in per-dimension summaries.
pub const TOTALS_LABEL: &str = "Totales";
/// Totals row label in the consolidated summary.
pub const CONSOLIDATED_TOTALS_LABEL: &str = "SUMA";

const INDICATORS: usize = IndicatorType::ALL.len();

/// Why a view section has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoData {
    /// The scale/locality filter matched no features.
    EmptySelection,
    /// None of the requested columns exist in the table.
    MissingColumns,
    /// Columns exist but every cell is unknown.
    NoScores,
    /// The section does not apply to this tab.
    NotApplicable,
}

impl NoData {
    /// Placeholder text shown in place of the section.
    pub fn message(self) -> &'static str {
        match self {
            NoData::EmptySelection => "No se encontraron datos para la escala seleccionada.",
            NoData::MissingColumns => "No se encontraron variables para la combinación seleccionada de escala e indicador.",
            NoData::NoScores       => "No hay datos para mostrar en la matriz para esta selección.",
            NoData::NotApplicable  => "Sección no disponible para esta vista.",
        }
    }
}

impl fmt::Display for NoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Decimal places applied when a summary is prepared for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    Whole,
    #[default]
    Hundredths,
}

impl Precision {
    pub fn decimals(self) -> usize {
        match self {
            Precision::Whole => 0,
            Precision::Hundredths => 2,
        }
    }

    pub fn round(self, v: f64) -> f64 {
        let scale = 10f64.powi(self.decimals() as i32);
        (v * scale).round() / scale
    }
}

// ── Summary (rows × indicator types) ─────────────────────────────────────────

/// One labelled row of means, one cell per indicator type in
/// [`IndicatorType::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Variable code or dimension key.
    pub key: String,
    pub label: String,
    pub values: [Option<f64>; INDICATORS],
}

/// A table of means with a trailing totals row.
///
/// `totals[i]` is the sum of `rows[*].values[i]` (unknown cells contribute
/// nothing). With five rows of means in `[0, 4]`, totals stay within `[0, 20]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Header of the label column.
    pub heading: &'static str,
    pub rows: Vec<SummaryRow>,
    pub totals_label: &'static str,
    pub totals: [f64; INDICATORS],
}

impl Summary {
    fn new(heading: &'static str, rows: Vec<SummaryRow>, totals_label: &'static str) -> Result<Self, NoData> {
        if rows.iter().all(|r| r.values.iter().all(Option::is_none)) {
            return Err(NoData::NoScores);
        }
        let mut totals = [0.0; INDICATORS];
        for row in &rows {
            for (total, value) in totals.iter_mut().zip(row.values) {
                *total += value.unwrap_or(0.0);
            }
        }
        Ok(Self { heading, rows, totals_label, totals })
    }

    /// (indicator label, total) pairs in display order, for the totals radar.
    pub fn totals_series(&self) -> Vec<(String, f64)> {
        IndicatorType::ALL
            .iter()
            .zip(self.totals)
            .map(|(i, t)| (i.label().to_string(), t))
            .collect()
    }

    /// Round every cell and total. Totals are taken from the unrounded means
    /// and rounded once here.
    pub fn rounded(&self, precision: Precision) -> Self {
        Self {
            heading: self.heading,
            rows: self
                .rows
                .iter()
                .map(|r| SummaryRow {
                    key: r.key.clone(),
                    label: r.label.clone(),
                    values: r.values.map(|v| v.map(|x| precision.round(x))),
                })
                .collect(),
            totals_label: self.totals_label,
            totals: self.totals.map(|t| precision.round(t)),
        }
    }
}

// ── Profile (one value per category) ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileEntry {
    pub key: String,
    pub label: String,
    pub value: f64,
}

/// Ordered (category, mean) pairs for one indicator type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub indicator: IndicatorType,
    pub entries: Vec<ProfileEntry>,
}

impl Profile {
    /// (label, value) pairs for a 0–4 radar.
    pub fn series(&self) -> Vec<(String, f64)> {
        self.entries.iter().map(|e| (e.label.clone(), e.value)).collect()
    }

    pub fn rounded(&self, precision: Precision) -> Self {
        Self {
            indicator: self.indicator,
            entries: self
                .entries
                .iter()
                .map(|e| ProfileEntry { value: precision.round(e.value), ..e.clone() })
                .collect(),
        }
    }
}

// ── Means ────────────────────────────────────────────────────────────────────

/// Mean of the known scores in one column. `None` when the column is absent
/// from the table or every selected cell is unknown.
pub fn column_mean(selection: &Selection<'_>, variable: Variable) -> Option<f64> {
    if !selection.table().has_column(variable) {
        return None;
    }
    mean(selection.rows().iter().filter_map(|f| f.score(variable)).map(f64::from))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn warn_missing(selection: &Selection<'_>, variables: &[Variable]) {
    for v in variables {
        if !selection.table().has_column(*v) {
            warn!(column = %v, "score column absent, skipping variable");
        }
    }
}

/// Mean of the per-variable means of `dimension` under `indicator`.
fn dimension_mean(selection: &Selection<'_>, dimension: Dimension, indicator: IndicatorType) -> Option<f64> {
    mean(dimension.variables(indicator).into_iter().filter_map(|v| column_mean(selection, v)))
}

/// Per-variable means of one dimension, one column per indicator type, plus
/// a totals row. The general table and 0–20 radar of a dimension tab.
pub fn dimension_summary(selection: &Selection<'_>, dimension: Dimension) -> Result<Summary, NoData> {
    if selection.is_empty() {
        return Err(NoData::EmptySelection);
    }
    let rows: Vec<SummaryRow> = dimension
        .items()
        .into_iter()
        .map(|item| {
            let variables = IndicatorType::ALL.map(|i| Variable::new(i, item));
            warn_missing(selection, &variables);
            SummaryRow {
                key: item.code(),
                label: item.label().to_string(),
                values: variables.map(|v| column_mean(selection, v)),
            }
        })
        .collect();
    Summary::new("Variable", rows, TOTALS_LABEL)
}

/// The five per-variable means of `dimension` under one indicator type.
/// Absent columns are skipped with a warning.
pub fn variable_profile(
    selection: &Selection<'_>,
    dimension: Dimension,
    indicator: IndicatorType,
) -> Result<Profile, NoData> {
    if selection.is_empty() {
        return Err(NoData::EmptySelection);
    }
    let variables = dimension.variables(indicator);
    warn_missing(selection, &variables);
    let existing: Vec<Variable> = variables.into_iter().filter(|v| selection.table().has_column(*v)).collect();
    if existing.is_empty() {
        return Err(NoData::MissingColumns);
    }
    let entries: Vec<ProfileEntry> = existing
        .into_iter()
        .filter_map(|v| {
            column_mean(selection, v).map(|value| ProfileEntry { key: v.code(), label: v.label().to_string(), value })
        })
        .collect();
    if entries.is_empty() {
        return Err(NoData::NoScores);
    }
    Ok(Profile { indicator, entries })
}

/// One row per dimension, each cell the mean of that dimension's five
/// per-variable means, plus a `SUMA` totals row.
///
/// `SUMA` adds the unrounded dimension means, same as the per-dimension
/// `Totales`; [`Summary::rounded`] then rounds cells and totals once each.
pub fn consolidated(selection: &Selection<'_>) -> Result<Summary, NoData> {
    if selection.is_empty() {
        return Err(NoData::EmptySelection);
    }
    let rows: Vec<SummaryRow> = Dimension::ALL
        .into_iter()
        .map(|dimension| SummaryRow {
            key: dimension.key().to_string(),
            label: dimension.label().to_string(),
            values: IndicatorType::ALL.map(|i| dimension_mean(selection, dimension, i)),
        })
        .collect();
    Summary::new("Dimensión", rows, CONSOLIDATED_TOTALS_LABEL)
}

/// The five per-dimension means under one indicator type.
pub fn dimension_profile(selection: &Selection<'_>, indicator: IndicatorType) -> Result<Profile, NoData> {
    if selection.is_empty() {
        return Err(NoData::EmptySelection);
    }
    let entries: Vec<ProfileEntry> = Dimension::ALL
        .into_iter()
        .filter_map(|d| {
            dimension_mean(selection, d, indicator).map(|value| ProfileEntry {
                key: d.key().to_string(),
                label: d.label().to_string(),
                value,
            })
        })
        .collect();
    if entries.is_empty() {
        return Err(NoData::NoScores);
    }
    Ok(Profile { indicator, entries })
}
