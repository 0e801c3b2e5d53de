//! Presentation adapters. Everything here is pure formatting over values the
//! aggregator and pipeline already computed.

pub mod color;
pub mod map;
pub mod page;
pub mod radar;
pub mod table;
pub mod tiles;

pub use color::score_color;
pub use map::{build_map, render_map, MapView, TooltipField, DEFAULT_TOOLTIP};
pub use page::{render_page, PageContext};
pub use radar::{radar_chart, render_radar_svg, RadarChart, RadarRange};
pub use table::{render_profile_table, render_summary_table};
pub use tiles::{TileRegistry, TileSource};

use crate::aggregate::NoData;

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON safe to paste inside a `<script>` element: `<` only ever appears
/// inside string literals, where `\u003c` decodes to the same text.
pub(crate) fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

/// Placeholder rendered in place of a section with nothing to show.
pub fn render_no_data(reason: NoData) -> String {
    format!(r#"<div class="no-data">{}</div>"#, html_escape(reason.message()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn script_json_cannot_close_the_script_tag() {
        let s = script_json("</script><script>alert(1)</script>");
        assert!(!s.contains('<'));
        let back: String = serde_json::from_str(&s).unwrap();
        assert_eq!(back, "</script><script>alert(1)</script>");
    }

    #[test]
    fn no_data_placeholder_carries_message() {
        let html = render_no_data(NoData::EmptySelection);
        assert!(html.contains("no-data"));
        assert!(html.contains("No se encontraron datos"));
    }
}
