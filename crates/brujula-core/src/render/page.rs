//! Full HTML document for one [`DashboardView`].

use std::fmt::Write;

use crate::aggregate::NoData;
use crate::catalog::IndicatorType;
use crate::pipeline::{DashboardView, Panel, Tab};
use crate::scale::ScaleRegistry;

use super::radar::{radar_chart, render_radar_svg, RadarRange};
use super::table::{render_profile_table, render_summary_table};
use super::tiles::TileRegistry;
use super::{html_escape, render_map, render_no_data};

const LEAFLET_CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css";
const LEAFLET_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js";
const MAP_ELEMENT_ID: &str = "brujula-map";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1200px; padding: 1rem 2rem; color: #222; }
h1 { color: #A40000; }
nav.tabs button { border: 0; background: none; padding: .5rem .8rem; cursor: pointer; font-weight: 600; }
nav.tabs button.active { border-bottom: 3px solid #FF4B4B; color: #A40000; }
form.selection label { display: inline-block; margin: .3rem 1rem .3rem 0; }
.metrics { display: flex; gap: 2rem; margin: 1rem 0; }
.metric .value { display: block; font-size: 1.6rem; }
.metric .delta { color: #2e7d32; font-size: .9rem; }
.row { display: flex; flex-wrap: wrap; gap: 2rem; align-items: flex-start; }
table.brujula-table { border-collapse: collapse; }
table.brujula-table th, table.brujula-table td { border: 1px solid #ddd; padding: .3rem .6rem; }
table.brujula-table td.num { text-align: right; }
table.brujula-table tr.totals { font-weight: 700; background: #fff3f2; }
.no-data { padding: .8rem 1rem; background: #fff8e1; border-left: 4px solid #f9a825; }
a.button { display: inline-block; background: #FF4B4B; color: #fff; padding: .4rem .9rem; border-radius: .4rem; text-decoration: none; }
"#;

/// Static context shared by every page: title, links and dropdown registries.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub title: &'a str,
    pub methodology_url: &'a str,
    pub scales: &'a ScaleRegistry,
    pub tiles: &'a TileRegistry,
}

fn option(out: &mut String, value: &str, label: &str, selected: bool) {
    let _ = write!(
        out,
        r#"<option value="{}"{}>{}</option>"#,
        html_escape(value),
        if selected { " selected" } else { "" },
        html_escape(label)
    );
}

const SUBMIT: &str = "this.form.submit()";
/// A locality belongs to one scale; switching scale goes back to "Todas".
const SUBMIT_NEW_SCALE: &str = "if(this.form.locality)this.form.locality.value='';this.form.submit()";

fn select_open(out: &mut String, name: &str, caption: &str, onchange: &str) {
    let _ = write!(
        out,
        r#"<label>{}<br><select name="{name}" onchange="{onchange}">"#,
        html_escape(caption)
    );
}

fn hidden(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, r#"<input type="hidden" name="{name}" value="{}">"#, html_escape(value));
}

fn tabs(out: &mut String, view: &DashboardView) {
    let sel = &view.selection;
    out.push_str(r#"<form method="get" class="tabs-form"><nav class="tabs">"#);
    hidden(out, "scale", &sel.scale.key);
    if let Some(locality) = &sel.locality {
        hidden(out, "locality", locality);
    }
    hidden(out, "indicator", sel.indicator.key());
    hidden(out, "tile", &sel.tile.name);
    for tab in Tab::ALL {
        let _ = write!(
            out,
            r#"<button type="submit" name="tab" value="{}"{}>{}</button>"#,
            tab.key(),
            if tab == sel.tab { r#" class="active""# } else { "" },
            html_escape(tab.label())
        );
    }
    out.push_str("</nav></form>");
}

fn selection_form(out: &mut String, view: &DashboardView, ctx: &PageContext<'_>) {
    let sel = &view.selection;
    out.push_str(r#"<form method="get" class="selection">"#);
    hidden(out, "tab", sel.tab.key());

    select_open(out, "scale", "Seleccionar una escala", SUBMIT_NEW_SCALE);
    for o in ctx.scales.options() {
        option(out, &o.key, &o.label, o.key == sel.scale.key);
    }
    out.push_str("</select></label>");

    if !view.localities.is_empty() || sel.locality.is_some() {
        select_open(out, "locality", "Localidad", SUBMIT);
        option(out, "", "Todas", sel.locality.is_none());
        for l in &view.localities {
            option(out, l, l, sel.locality.as_deref() == Some(l.as_str()));
        }
        if let Some(l) = &sel.locality {
            if !view.localities.contains(l) {
                option(out, l, l, true);
            }
        }
        out.push_str("</select></label>");
    }

    select_open(out, "indicator", "Seleccionar tipo de indicador", SUBMIT);
    for i in IndicatorType::ALL {
        option(out, i.key(), i.label(), i == sel.indicator);
    }
    out.push_str("</select></label>");

    if matches!(sel.tab, Tab::Dimension(_)) {
        if !view.variables.is_empty() {
            select_open(out, "variable", "Seleccionar una variable para su visualización", SUBMIT);
            for v in &view.variables {
                option(out, &v.code(), v.label(), Some(*v) == sel.variable);
            }
            out.push_str("</select></label>");
        }
        select_open(out, "tile", "Seleccionar mapa base", SUBMIT);
        for t in ctx.tiles.sources() {
            option(out, &t.name, &t.name, t.name == sel.tile.name);
        }
        out.push_str("</select></label>");
    }

    out.push_str(r#"<noscript><button type="submit">Aplicar</button></noscript></form>"#);
}

fn metrics(out: &mut String, view: &DashboardView) {
    if view.metrics.is_empty() {
        return;
    }
    let _ = write!(out, "<h2>Métricas generales del {}</h2>", html_escape(&view.selection.scale.label));
    out.push_str(r#"<div class="metrics">"#);
    for m in &view.metrics {
        let _ = write!(
            out,
            r#"<div class="metric"><span class="label">{}</span><span class="value">{}</span>"#,
            html_escape(&m.label),
            html_escape(&m.value)
        );
        if let Some(delta) = &m.delta {
            let _ = write!(out, r#"<span class="delta">{}</span>"#, html_escape(delta));
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    if let Some(note) = &view.metrics_note {
        let _ = write!(out, r#"<p class="caption">{}</p>"#, html_escape(note));
    }
}

fn radar_or_no_data(points: Vec<(String, f64)>, range: RadarRange) -> String {
    match radar_chart(points, range) {
        Ok(chart) => render_radar_svg(&chart),
        Err(reason) => render_no_data(reason),
    }
}

fn general_results(out: &mut String, view: &DashboardView) {
    let scale = html_escape(&view.selection.scale.label);
    match view.selection.tab {
        Tab::Dimension(_) => {
            let _ = write!(out, "<h2>Resultados generales de La Brújula del {scale}</h2>");
        }
        Tab::Consolidated => out.push_str("<h2>Tabla Resumen por Dimensión y Tipo de Indicador</h2>"),
    }
    match &view.summary {
        Panel::Ready(summary) => {
            let _ = write!(
                out,
                r#"<div class="row"><div>{}</div><div>{}</div></div>"#,
                render_summary_table(summary, view.precision),
                radar_or_no_data(summary.totals_series(), RadarRange::Totals)
            );
        }
        Panel::NoData(reason) => out.push_str(&render_no_data(*reason)),
    }
}

fn particular_results(out: &mut String, view: &DashboardView) {
    let (heading, category) = match view.selection.tab {
        Tab::Dimension(_) => (
            format!(
                "Resultados particulares de La Brújula por dimensión del {}",
                html_escape(&view.selection.scale.label)
            ),
            "Variable",
        ),
        Tab::Consolidated => (format!("Promedio por dimensión: {}", html_escape(view.selection.indicator.label())), "Dimensión"),
    };
    let _ = write!(out, "<h2>{heading}</h2>");
    match &view.profile {
        Panel::Ready(profile) => {
            let _ = write!(
                out,
                r#"<div class="row"><div>{}</div><div>{}</div></div>"#,
                render_profile_table(profile, category, view.precision),
                radar_or_no_data(profile.series(), RadarRange::Variable)
            );
        }
        Panel::NoData(reason) => out.push_str(&render_no_data(*reason)),
    }
}

fn conclusions(out: &mut String, view: &DashboardView) {
    if view.conclusions.is_empty() {
        return;
    }
    out.push_str(r#"<section class="conclusions"><h2>Conclusiones preliminares</h2>"#);
    for c in &view.conclusions {
        let _ = write!(out, "<h4>{}.</h4><p>{}</p>", html_escape(c.title), html_escape(&c.text));
    }
    out.push_str("</section>");
}

fn map_section(out: &mut String, view: &DashboardView) {
    match &view.map {
        Panel::NoData(NoData::NotApplicable) => {}
        Panel::NoData(reason) => {
            out.push_str("<h2>Territorialización de los indicadores de la Brújula</h2>");
            out.push_str(&render_no_data(*reason));
        }
        Panel::Ready(map) => {
            out.push_str("<h2>Territorialización de los indicadores de la Brújula</h2>");
            out.push_str(&render_map(map, MAP_ELEMENT_ID));
        }
    }
}

/// Render the complete page. All text coming from data, configuration or
/// the narrative is escaped.
pub fn render_page(view: &DashboardView, ctx: &PageContext<'_>) -> String {
    let mut out = String::with_capacity(64 * 1024);
    let _ = write!(
        out,
        r#"<!DOCTYPE html><html lang="es"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title}</title><link rel="stylesheet" href="{LEAFLET_CSS}" crossorigin="anonymous"><script src="{LEAFLET_JS}" crossorigin="anonymous"></script><style>{STYLE}</style></head><body>"#,
        title = html_escape(ctx.title)
    );
    let _ = write!(out, "<h1>{}</h1>", html_escape(ctx.title));

    tabs(&mut out, view);
    selection_form(&mut out, view, ctx);
    let _ = write!(
        out,
        r#"<p><a class="button" href="{}" target="_blank" rel="noopener">Ver metodología</a></p>"#,
        html_escape(ctx.methodology_url)
    );

    metrics(&mut out, view);
    general_results(&mut out, view);
    particular_results(&mut out, view);
    conclusions(&mut out, view);
    map_section(&mut out, view);

    out.push_str("</body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::feature::tests::feature;
    use crate::feature::FeatureTable;
    use crate::narrative::Narrative;
    use crate::pipeline::{Dashboard, ViewRequest};

    fn dashboard() -> Dashboard {
        let rows = vec![
            feature("MUN-1-01", Some("Santa <María>"), &[("d-a1", 4), ("op-a1", 1)]),
            feature("MUN-1-02", Some("Santa <María>"), &[("d-a1", 2), ("op-a1", 3)]),
        ];
        let narrative = Narrative::from_json(
            r#"{ "metrics": { "municipio-santa-maria": [ { "label": "Hogares*", "value": "8495", "delta": "42,01 %" } ] },
                 "metrics_note": "*Variación intercensal.",
                 "conclusions": { "municipio-santa-maria": { "d-a1": "Texto <b>crudo</b>" } } }"#,
        )
        .unwrap();
        Dashboard::new(FeatureTable::new(rows), DashboardConfig::default(), narrative).unwrap()
    }

    fn page(d: &Dashboard, scale: &str, tab: &str) -> String {
        let request = ViewRequest { scale: Some(scale.into()), tab: Some(tab.into()), ..Default::default() };
        render_page(&d.view(&request), &d.page_context())
    }

    #[test]
    fn dimension_page_has_every_section() {
        let d = dashboard();
        let html = page(&d, "municipio-santa-maria", "housing-land");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>PLATAFORMA DE LA BRÚJULA</title>"));
        assert!(html.contains("leaflet/1.9.4/leaflet.js"));
        assert_eq!(html.matches(r#"<button type="submit" name="tab""#).count(), 6);
        assert!(html.contains(r#"value="housing-land" class="active""#));
        assert!(html.contains("Hogares*"));
        assert!(html.contains("42,01 %"));
        assert!(html.contains("Totales"));
        assert_eq!(html.matches("<svg").count(), 2);
        assert!(html.contains("Conclusiones preliminares"));
        assert!(html.contains("Texto &lt;b&gt;crudo&lt;/b&gt;"));
        assert!(html.contains(r#"id="brujula-map""#));
        assert!(html.contains(r#"<option value="municipio-santa-maria" selected>"#));
        assert!(html.contains("Santa &lt;María&gt;"));
        assert!(!html.contains("Santa <María>"));
    }

    #[test]
    fn consolidated_page_omits_map_and_variable_select() {
        let d = dashboard();
        let html = page(&d, "municipio-santa-maria", "consolidated");
        assert!(html.contains("SUMA"));
        assert!(!html.contains(r#"id="brujula-map""#));
        assert!(!html.contains(r#"name="variable""#));
        assert!(!html.contains(r#"name="tile" onchange"#));
        assert!(!html.contains("Conclusiones preliminares"));
    }

    #[test]
    fn changing_scale_resets_locality() {
        let d = dashboard();
        let request = ViewRequest {
            scale: Some("municipio-santa-maria".into()),
            locality: Some("Santa <María>".into()),
            ..Default::default()
        };
        let html = render_page(&d.view(&request), &d.page_context());
        assert!(html.contains(&format!(r#"<select name="scale" onchange="{SUBMIT_NEW_SCALE}">"#)));
        assert!(html.contains(r#"<select name="locality" onchange="this.form.submit()">"#));
        assert!(html.contains(r#"<option value="">Todas</option>"#));
    }

    #[test]
    fn empty_selection_renders_placeholders() {
        let d = dashboard();
        let html = page(&d, "manzanas", "amenities");
        assert!(html.matches(r#"class="no-data""#).count() >= 3);
        assert!(html.contains(NoData::EmptySelection.message()));
        assert!(!html.contains("<svg"));
    }
}
