//! Static HTML tables. No index column; values are formatted at the
//! requested precision and unknown cells render as an en dash.

use std::fmt::Write;

use crate::aggregate::{Precision, Profile, Summary};
use crate::catalog::IndicatorType;

use super::html_escape;

const UNKNOWN_CELL: &str = "–";

fn number(v: f64, precision: Precision) -> String {
    format!("{:.*}", precision.decimals(), precision.round(v))
}

/// Rows × indicator types plus the totals row.
pub fn render_summary_table(summary: &Summary, precision: Precision) -> String {
    let mut out = String::from(r#"<table class="brujula-table"><thead><tr>"#);
    let _ = write!(out, "<th>{}</th>", html_escape(summary.heading));
    for indicator in IndicatorType::ALL {
        let _ = write!(out, "<th>{}</th>", html_escape(indicator.label()));
    }
    out.push_str("</tr></thead><tbody>");

    for row in &summary.rows {
        let _ = write!(out, r#"<tr data-key="{}"><td>{}</td>"#, html_escape(&row.key), html_escape(&row.label));
        for value in row.values {
            match value {
                Some(v) => {
                    let _ = write!(out, r#"<td class="num">{}</td>"#, number(v, precision));
                }
                None => {
                    let _ = write!(out, r#"<td class="num">{UNKNOWN_CELL}</td>"#);
                }
            }
        }
        out.push_str("</tr>");
    }

    let _ = write!(out, r#"<tr class="totals"><td>{}</td>"#, html_escape(summary.totals_label));
    for total in summary.totals {
        let _ = write!(out, r#"<td class="num">{}</td>"#, number(total, precision));
    }
    out.push_str("</tr></tbody></table>");
    out
}

/// Two-column table (category, value) for a single indicator type.
pub fn render_profile_table(profile: &Profile, heading: &str, precision: Precision) -> String {
    let mut out = String::from(r#"<table class="brujula-table"><thead><tr>"#);
    let _ = write!(
        out,
        "<th>{}</th><th>{}</th></tr></thead><tbody>",
        html_escape(heading),
        html_escape(profile.indicator.label())
    );
    for entry in &profile.entries {
        let _ = write!(
            out,
            r#"<tr data-key="{}"><td>{}</td><td class="num">{}</td></tr>"#,
            html_escape(&entry.key),
            html_escape(&entry.label),
            number(entry.value, precision)
        );
    }
    out.push_str("</tbody></table>");
    out
}
