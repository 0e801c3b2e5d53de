//! Choropleth map of one variable over the current selection, rendered as a
//! Leaflet fragment.

use std::fmt::Write;

use geojson::{FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::NoData;
use crate::catalog::Variable;
use crate::feature::{
    BLOCK_GROUP_FIELD, COD_FIELD, DEPARTMENT_FIELD, LOCALITY_FIELD, MUNICIPALITY_FIELD,
};
use crate::geometry::{map_center, LatLon};
use crate::scale::Selection;

use super::color::{score_color, OUTLINE_COLOR};
use super::tiles::TileSource;
use super::{html_escape, script_json};

/// Property carrying the selected variable's score (null when unknown).
pub const VALUE_PROPERTY: &str = "VALOR";
const FILL_PROPERTY: &str = "_fill";
const TOOLTIP_PROPERTY: &str = "_tooltip";
const MAP_HEIGHT_PX: u32 = 600;
const UNKNOWN_TEXT: &str = "Sin dato";

/// One tooltip line: the property to show and its caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TooltipField {
    pub field: &'static str,
    pub alias: &'static str,
}

pub const DEFAULT_TOOLTIP: [TooltipField; 5] = [
    TooltipField { field: COD_FIELD, alias: "Código:" },
    TooltipField { field: DEPARTMENT_FIELD, alias: "Departamento:" },
    TooltipField { field: MUNICIPALITY_FIELD, alias: "Municipio:" },
    TooltipField { field: LOCALITY_FIELD, alias: "Localidad:" },
    TooltipField { field: BLOCK_GROUP_FIELD, alias: "Manzanero:" },
];

/// Everything the map fragment needs. Built from a selection, rendered
/// without further lookups.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    pub tile: TileSource,
    pub variable: Variable,
    pub collection: FeatureCollection,
    pub tooltip: Vec<TooltipField>,
}

impl MapView {
    pub fn feature_count(&self) -> usize {
        self.collection.features.len()
    }
}

/// Colour each selected feature by its score for `variable`.
///
/// The center is the centroid of the selection's union, or `fallback` when
/// there is no usable geometry. Features without geometry are left off the
/// map but still count toward the summaries.
pub fn build_map(
    selection: &Selection<'_>,
    variable: Variable,
    tile: &TileSource,
    zoom: u8,
    fallback: LatLon,
    tooltip: &[TooltipField],
) -> Result<MapView, NoData> {
    if selection.is_empty() {
        return Err(NoData::EmptySelection);
    }
    if !selection.table().has_column(variable) {
        return Err(NoData::MissingColumns);
    }

    let center = map_center(selection.rows().iter().filter_map(|f| f.geometry()), fallback);

    let mut features = Vec::with_capacity(selection.len());
    for f in selection.rows() {
        let Some(geometry) = f.geometry() else {
            debug!(cod = f.cod(), "feature has no geometry, not drawn");
            continue;
        };
        let score = f.score(variable);

        let mut props = JsonObject::new();
        props.insert(COD_FIELD.to_string(), JsonValue::from(f.cod()));
        for (name, value) in f.attributes() {
            props.insert(name.clone(), JsonValue::from(value.as_str()));
        }
        props.insert(VALUE_PROPERTY.to_string(), score.map_or(JsonValue::Null, JsonValue::from));
        props.insert("VARIABLE".to_string(), JsonValue::from(variable.code()));
        props.insert(FILL_PROPERTY.to_string(), JsonValue::from(score_color(score)));

        let mut lines = String::new();
        for t in tooltip {
            if let Some(value) = f.attribute(t.field) {
                let _ = write!(lines, "<b>{}</b> {}<br>", html_escape(t.alias), html_escape(value));
            }
        }
        let shown = score.map_or_else(|| UNKNOWN_TEXT.to_string(), |s| s.to_string());
        let _ = write!(lines, "<b>{}:</b> {}", html_escape(variable.label()), shown);
        props.insert(TOOLTIP_PROPERTY.to_string(), JsonValue::from(lines));

        features.push(geojson::Feature {
            bbox: None,
            geometry: Some(geometry.clone()),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    Ok(MapView {
        center,
        zoom,
        tile: tile.clone(),
        variable,
        collection: FeatureCollection { bbox: None, features, foreign_members: None },
        tooltip: tooltip.to_vec(),
    })
}

/// HTML fragment: a map container plus the script that fills it. Expects
/// Leaflet to be loaded by the surrounding page.
pub fn render_map(view: &MapView, element_id: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div id="{id}" class="brujula-map" style="height:{MAP_HEIGHT_PX}px;"></div>"#,
        id = html_escape(element_id)
    );
    let _ = write!(
        out,
        r#"<script>
(function () {{
  var map = L.map({id}).setView([{lat}, {lon}], {zoom});
  var base = L.tileLayer({url}, {{ attribution: {attribution}, maxZoom: 19 }}).addTo(map);
  var data = {data};
  var layer = L.geoJSON(data, {{
    style: function (f) {{
      return {{ fillColor: f.properties.{fill}, color: {outline}, weight: 2, fillOpacity: 0.5 }};
    }},
    onEachFeature: function (f, l) {{
      l.bindTooltip(f.properties.{tip}, {{ sticky: true }});
    }}
  }}).addTo(map);
  var bases = {{}};
  bases[{tile_name}] = base;
  var overlays = {{}};
  overlays[{overlay}] = layer;
  L.control.layers(bases, overlays).addTo(map);
}})();
</script>"#,
        id = script_json(element_id),
        lat = view.center.lat,
        lon = view.center.lon,
        zoom = view.zoom,
        url = script_json(&view.tile.url),
        attribution = script_json(&view.tile.attribution),
        data = script_json(&view.collection),
        fill = FILL_PROPERTY,
        outline = script_json(OUTLINE_COLOR),
        tip = TOOLTIP_PROPERTY,
        tile_name = script_json(&view.tile.name),
        overlay = script_json(view.variable.label()),
    );
    out
}
