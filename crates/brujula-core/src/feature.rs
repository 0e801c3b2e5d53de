use std::collections::{BTreeMap, BTreeSet};

use geojson::Geometry;

use crate::catalog::{Variable, MAX_SCORE, VARIABLE_COUNT};

/// Property holding the hierarchical code.
pub const COD_FIELD: &str = "COD";
pub const DEPARTMENT_FIELD: &str = "DEPARTAMENTO";
pub const MUNICIPALITY_FIELD: &str = "MUNICIPIO";
pub const LOCALITY_FIELD: &str = "LOCALIDAD";
pub const BLOCK_GROUP_FIELD: &str = "MANZANERO";

/// Descriptive attributes kept on every feature when present.
pub const ATTRIBUTE_FIELDS: [&str; 4] = [DEPARTMENT_FIELD, MUNICIPALITY_FIELD, LOCALITY_FIELD, BLOCK_GROUP_FIELD];

/// One geospatial entity: a department, municipality, locality or block.
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Feature {
    cod: String,
    attributes: BTreeMap<String, String>,
    geometry: Option<Geometry>,
    /// Indexed by [`Variable::index`]. `None` = missing or unusable score.
    scores: [Option<u8>; VARIABLE_COUNT],
}

impl Feature {
    pub fn new(cod: impl Into<String>, geometry: Option<Geometry>) -> Self {
        Self {
            cod: cod.into(),
            attributes: BTreeMap::new(),
            geometry,
            scores: [None; VARIABLE_COUNT],
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Set a score. Values above [`MAX_SCORE`] are stored as unknown.
    pub fn with_score(mut self, variable: Variable, score: Option<u8>) -> Self {
        self.scores[variable.index()] = score.filter(|&s| s <= MAX_SCORE);
        self
    }

    pub fn cod(&self) -> &str {
        &self.cod
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        if name == COD_FIELD {
            return Some(&self.cod);
        }
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    #[inline]
    pub fn score(&self, variable: Variable) -> Option<u8> {
        self.scores[variable.index()]
    }
}

/// The consolidated feature table plus the set of score columns it carries.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    features: Vec<Feature>,
    columns: BTreeSet<Variable>,
}

impl FeatureTable {
    /// A table whose schema holds every catalog column.
    pub fn new(features: Vec<Feature>) -> Self {
        Self::with_columns(features, Variable::all().collect())
    }

    pub fn with_columns(features: Vec<Feature>, columns: BTreeSet<Variable>) -> Self {
        Self { features, columns }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[inline]
    pub fn has_column(&self, variable: Variable) -> bool {
        self.columns.contains(&variable)
    }

    pub fn columns(&self) -> &BTreeSet<Variable> {
        &self.columns
    }

    /// Catalog columns absent from this table, in catalog order.
    pub fn missing_columns(&self) -> Vec<Variable> {
        Variable::all().filter(|v| !self.columns.contains(v)).collect()
    }
}
