//! La Brújula: a territorial-diagnosis dashboard over a multi-scale
//! compliance index.
//!
//! A consolidated GeoJSON feature table is loaded once, then every selection
//! (scale, locality, tab, indicator, variable, base map) flows through
//! [`pipeline::Dashboard::view`] into tables, radar charts and a choropleth
//! map.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod loader;
pub mod narrative;
pub mod pipeline;
pub mod render;
pub mod scale;

pub use catalog::{Dimension, IndicatorType, Variable};
pub use config::DashboardConfig;
pub use error::{BrujulaError, Result};
pub use feature::{Feature, FeatureTable};
pub use pipeline::{Dashboard, DashboardView, Panel, Tab, ViewRequest};
