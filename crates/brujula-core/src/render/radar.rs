//! Radar (polar area) chart rendered as inline SVG.

use std::f64::consts::PI;
use std::fmt::Write;

use serde::Serialize;

use crate::aggregate::NoData;

use super::color::ACCENT_COLOR;
use super::html_escape;

const SIZE: f64 = 300.0;
const RADIUS: f64 = 100.0;
const LABEL_CHARS: usize = 28;

/// Radial axis range. The caller chooses; it is never inferred from values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadarRange {
    /// 0–4, one compliance score.
    Variable,
    /// 0–20, five variables × max score summed per indicator type.
    Totals,
}

impl RadarRange {
    pub fn upper(self) -> f64 {
        match self {
            RadarRange::Variable => 4.0,
            RadarRange::Totals => 20.0,
        }
    }

    pub fn ticks(self) -> &'static [f64] {
        match self {
            RadarRange::Variable => &[0.0, 1.0, 2.0, 3.0, 4.0],
            RadarRange::Totals => &[0.0, 4.0, 8.0, 12.0, 16.0, 20.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    pub points: Vec<(String, f64)>,
    pub range: RadarRange,
}

impl RadarChart {
    /// Points with the first repeated at the end so the polygon closes.
    pub fn closed(&self) -> Vec<(String, f64)> {
        let mut pts = self.points.clone();
        if let Some(first) = self.points.first() {
            pts.push(first.clone());
        }
        pts
    }
}

/// Build a chart; no categories means no chart.
pub fn radar_chart(points: Vec<(String, f64)>, range: RadarRange) -> Result<RadarChart, NoData> {
    if points.is_empty() {
        return Err(NoData::NoScores);
    }
    Ok(RadarChart { points, range })
}

fn polar(i: usize, n: usize, r: f64) -> (f64, f64) {
    // First axis points up, then clockwise.
    let theta = 2.0 * PI * i as f64 / n as f64 - PI / 2.0;
    (SIZE / 2.0 + r * theta.cos(), SIZE / 2.0 + r * theta.sin())
}

fn short_label(label: &str) -> String {
    if label.chars().count() <= LABEL_CHARS {
        return label.to_string();
    }
    let cut: String = label.chars().take(LABEL_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}

pub fn render_radar_svg(chart: &RadarChart) -> String {
    let n = chart.points.len();
    let upper = chart.range.upper();
    let scale = |v: f64| (v.clamp(0.0, upper) / upper) * RADIUS;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="brujula-radar" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {SIZE} {SIZE}" width="{SIZE}" height="{SIZE}" role="img">"#
    );

    // Grid rings, one per tick.
    for &tick in chart.range.ticks().iter().filter(|&&t| t > 0.0) {
        let ring: Vec<String> = (0..n.max(3))
            .map(|i| {
                let (x, y) = polar(i, n.max(3), scale(tick));
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = write!(svg, r##"<polygon points="{}" fill="none" stroke="#d0d0d0" stroke-width="0.5"/>"##, ring.join(" "));
        let (tx, ty) = polar(0, n.max(3), scale(tick));
        let _ = write!(svg, r##"<text x="{:.1}" y="{:.1}" font-size="8" fill="#888">{}</text>"##, tx + 2.0, ty, tick);
    }

    // Axes and category labels.
    for (i, (label, _)) in chart.points.iter().enumerate() {
        let (x, y) = polar(i, n, RADIUS);
        let _ = write!(
            svg,
            r##"<line x1="{c:.1}" y1="{c:.1}" x2="{x:.1}" y2="{y:.1}" stroke="#d0d0d0" stroke-width="0.5"/>"##,
            c = SIZE / 2.0
        );
        let (lx, ly) = polar(i, n, RADIUS + 14.0);
        let anchor = if (lx - SIZE / 2.0).abs() < 1.0 { "middle" } else if lx > SIZE / 2.0 { "start" } else { "end" };
        let _ = write!(
            svg,
            r#"<text x="{lx:.1}" y="{ly:.1}" font-size="10" text-anchor="{anchor}"><title>{full}</title>{short}</text>"#,
            full = html_escape(label),
            short = html_escape(&short_label(label)),
        );
    }

    // Data polygon; the closing point repeats the first.
    let closed = chart.closed();
    let path: Vec<String> = closed
        .iter()
        .enumerate()
        .map(|(i, (_, v))| {
            let (x, y) = polar(i % n, n, scale(*v));
            format!("{x:.1},{y:.1}")
        })
        .collect();
    let _ = write!(
        svg,
        r#"<polygon class="series" points="{}" fill="{ACCENT_COLOR}" fill-opacity="0.35" stroke="{ACCENT_COLOR}" stroke-width="2"/>"#,
        path.join(" ")
    );
    for (i, (label, v)) in chart.points.iter().enumerate() {
        let (x, y) = polar(i, n, scale(*v));
        let _ = write!(
            svg,
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="2.5" fill="{ACCENT_COLOR}"><title>{}: {:.2}</title></circle>"#,
            html_escape(label),
            v
        );
    }

    svg.push_str("</svg>");
    svg
}
