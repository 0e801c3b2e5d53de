//! Score → fill colour for the choropleth.

use crate::catalog::MAX_SCORE;

/// Five-step ramp, index = score (white → deep red).
pub const SCORE_RAMP: [&str; MAX_SCORE as usize + 1] = ["#ffffff", "#FFD0CB", "#FD8D89", "#FF4B4B", "#A40000"];

/// Colour of unknown or out-of-range scores.
pub const UNKNOWN_COLOR: &str = "#ffffff";

/// Feature outline colour.
pub const OUTLINE_COLOR: &str = "#A40000";

/// Radar fill / stroke colour.
pub const ACCENT_COLOR: &str = "#FF4B4B";

pub fn score_color(score: Option<u8>) -> &'static str {
    score
        .and_then(|s| SCORE_RAMP.get(usize::from(s)).copied())
        .unwrap_or(UNKNOWN_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_is_indexed_by_score() {
        assert_eq!(score_color(Some(0)), "#ffffff");
        assert_eq!(score_color(Some(2)), "#FD8D89");
        assert_eq!(score_color(Some(4)), "#A40000");
    }

    #[test]
    fn unknown_and_out_of_range_use_neutral_colour() {
        assert_eq!(score_color(None), UNKNOWN_COLOR);
        assert_eq!(score_color(Some(5)), UNKNOWN_COLOR);
        assert_eq!(score_color(Some(255)), UNKNOWN_COLOR);
    }
}
