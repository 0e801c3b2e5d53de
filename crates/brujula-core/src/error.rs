use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating dashboard inputs.
///
/// Nothing after a successful load returns this type: per-view problems are
/// reported as [`crate::aggregate::NoData`] instead.
#[derive(Debug, Error)]
pub enum BrujulaError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    #[error("feature #{index} has no string COD property")]
    MissingCod { index: usize },

    #[error("feature {cod:?} does not start with a recognized scale prefix")]
    UnknownScalePrefix { cod: String },

    #[error("feature {cod:?} matches more than one scale prefix: {scales:?}")]
    AmbiguousScalePrefix { cod: String, scales: Vec<String> },

    #[error("feature table is missing {} score column(s): {}", .columns.len(), .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("unknown variable code {0:?}")]
    UnknownVariable(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BrujulaError>;
