//! Reading classification and the display rounding rule

use serde::Serialize;

use crate::band::{SeverityBand, AQI_LEVELS};

/// Derived view of one reading, recomputed on every run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AqiSummary {
    pub emoji: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    /// Value to show: rounded unless rounding would cross a band boundary
    pub display_aqi: f64,
    /// The unrounded reading that was classified
    pub reading: f64,
}

impl AqiSummary {
    /// Band the reading was classified into
    pub fn band(&self) -> &'static SeverityBand {
        SeverityBand::from_label(self.label).unwrap_or_else(|| classify_band(self.reading))
    }

    /// True when the display value is the rounded reading
    pub fn is_rounded(&self) -> bool {
        self.display_aqi == self.reading.round()
    }
}

/// First band whose inclusive upper bound covers `value`.
///
/// Total: anything above every finite bound (including `+inf` and NaN) lands
/// in the unbounded last band.
pub fn classify_band(value: f64) -> &'static SeverityBand {
    AQI_LEVELS
        .iter()
        .find(|band| value <= band.upper_bound)
        .unwrap_or(&AQI_LEVELS[AQI_LEVELS.len() - 1])
}

/// Classify `value` and pick the number to display.
///
/// The rounded value is shown only when it classifies into the same band as
/// the exact reading; a reading of 100.4 is "Unhealthy for Sensitive Groups"
/// and displaying "100" next to that label would contradict it.
pub fn summarize(value: f64) -> AqiSummary {
    let exact = classify_band(value);
    let rounded_value = value.round();
    let rounded = classify_band(rounded_value);

    let display_aqi = if exact.color == rounded.color {
        rounded_value
    } else {
        value
    };

    AqiSummary {
        emoji: exact.emoji,
        label: exact.label,
        color: exact.color,
        display_aqi,
        reading: value,
    }
}
