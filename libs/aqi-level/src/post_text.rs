//! Composing status posts and reading the band back out of them

use crate::band::{SeverityBand, AQI_LEVELS};
use crate::classifier::AqiSummary;

/// Render the status message for a summary.
///
/// The `(<label>)` suffix is load-bearing: [`parse_band`] reads it back on
/// the next run to recover the previously announced band.
pub fn compose_post_text(summary: &AqiSummary, location: &str) -> String {
    format!(
        "{} AQI near {}: {} ({})",
        summary.emoji, location, summary.display_aqi, summary.label
    )
}

/// Find the band announced in a previously published post.
///
/// Matches the exact text `(<label>)`; the first band in table order wins.
/// `None` means the post was not written by this bot or the template
/// changed, and callers treat it as "no known prior state".
pub fn parse_band(text: &str) -> Option<&'static SeverityBand> {
    AQI_LEVELS
        .iter()
        .find(|band| text.contains(&format!("({})", band.label)))
}
