//! Geographic helpers for centering the map.
//! All coordinate math uses f64.

use geo::{Area, BooleanOps, Centroid, GeometryCollection, MultiPolygon, Point};
use geojson::{Geometry, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A point in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Initial map center when the selection has no usable geometry
/// (Santa María, Catamarca).
pub const FALLBACK_CENTER: LatLon = LatLon::new(-26.779, -66.027);

/// Centroid of the union of `geometries`.
///
/// Polygonal parts are dissolved first, so overlapping or nested features
/// count once. When the union has no area the centroid of the remaining
/// points and lines is used instead. Geometries with invalid coordinates are
/// skipped. Returns `None` when nothing usable remains.
pub fn union_centroid<'a>(geometries: impl IntoIterator<Item = &'a Geometry>) -> Option<LatLon> {
    let mut polygons = Vec::new();
    let mut rest = Vec::new();
    for g in geometries {
        if !positions_valid(&g.value) {
            debug!("skipping geometry with invalid coordinates");
            continue;
        }
        match geo::Geometry::<f64>::try_from(g) {
            Ok(shape) => split(shape, &mut polygons, &mut rest),
            Err(err) => debug!(%err, "skipping unconvertible geometry"),
        }
    }

    let union = dissolve(&polygons);
    union
        .centroid()
        .and_then(to_lat_lon)
        .or_else(|| GeometryCollection(rest).centroid().and_then(to_lat_lon))
}

/// [`union_centroid`] or `fallback`.
pub fn map_center<'a>(geometries: impl IntoIterator<Item = &'a Geometry>, fallback: LatLon) -> LatLon {
    union_centroid(geometries).unwrap_or(fallback)
}

fn positions_valid(value: &Value) -> bool {
    let ok = |p: &Vec<f64>| matches!(p.as_slice(), [x, y, ..] if LatLon::new(*y, *x).is_valid());
    match value {
        Value::Point(p) => ok(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().all(ok),
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines.iter().flatten().all(ok),
        Value::MultiPolygon(polys) => polys.iter().flatten().flatten().all(ok),
        Value::GeometryCollection(gs) => gs.iter().all(|g| positions_valid(&g.value)),
    }
}

/// Polygons with area go to `polygons`; everything else to `rest`.
fn split(shape: geo::Geometry<f64>, polygons: &mut Vec<MultiPolygon<f64>>, rest: &mut Vec<geo::Geometry<f64>>) {
    match shape {
        geo::Geometry::Polygon(p) if p.unsigned_area() > 0.0 => polygons.push(MultiPolygon::new(vec![p])),
        geo::Geometry::MultiPolygon(mp) => {
            for p in mp {
                split(geo::Geometry::Polygon(p), polygons, rest);
            }
        }
        geo::Geometry::GeometryCollection(gc) => {
            for g in gc {
                split(g, polygons, rest);
            }
        }
        other => rest.push(other),
    }
}

/// Pairwise union, halving the input each level.
fn dissolve(parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    match parts {
        [] => MultiPolygon::new(Vec::new()),
        [single] => single.clone(),
        _ => {
            let (left, right) = parts.split_at(parts.len() / 2);
            dissolve(left).union(&dissolve(right))
        }
    }
}

fn to_lat_lon(p: Point<f64>) -> Option<LatLon> {
    let c = LatLon::new(p.y(), p.x());
    c.is_valid().then_some(c)
}
