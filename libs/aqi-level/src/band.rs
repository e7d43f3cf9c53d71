//! The AQI severity band table
//!
//! This table is the single source of truth for classification, post
//! composition and prior-post parsing. Labels are the round-trip key between
//! what we publish and what we read back, so changing one orphans every post
//! already published with the old label.

use serde::Serialize;

/// One severity band on the AQI scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityBand {
    /// Stable color identifier (EPA color name)
    pub color: &'static str,
    /// Human-readable label, unique across the table
    pub label: &'static str,
    /// Emoji shown in published posts
    pub emoji: &'static str,
    /// Inclusive upper threshold; `f64::INFINITY` for the last band
    #[serde(skip)]
    pub upper_bound: f64,
}

/// Bands ordered by `upper_bound` ascending; only the last one is unbounded
pub static AQI_LEVELS: [SeverityBand; 6] = [
    SeverityBand {
        color: "green",
        label: "Good",
        emoji: "🟢",
        upper_bound: 50.0,
    },
    SeverityBand {
        color: "yellow",
        label: "Moderate",
        emoji: "🟡",
        upper_bound: 100.0,
    },
    SeverityBand {
        color: "orange",
        label: "Unhealthy for Sensitive Groups",
        emoji: "🟠",
        upper_bound: 150.0,
    },
    SeverityBand {
        color: "red",
        label: "Unhealthy",
        emoji: "🔴",
        upper_bound: 200.0,
    },
    SeverityBand {
        color: "purple",
        label: "Very Unhealthy",
        emoji: "🟣",
        upper_bound: 300.0,
    },
    SeverityBand {
        color: "maroon",
        label: "Hazardous",
        emoji: "🟤",
        upper_bound: f64::INFINITY,
    },
];

impl SeverityBand {
    /// Position of this band in [`AQI_LEVELS`] (0 = Good)
    pub fn index(&self) -> usize {
        AQI_LEVELS
            .iter()
            .position(|band| band.color == self.color)
            .unwrap_or(AQI_LEVELS.len() - 1)
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_bound.is_infinite()
    }

    /// Look a band up by its exact label
    pub fn from_label(label: &str) -> Option<&'static SeverityBand> {
        AQI_LEVELS.iter().find(|band| band.label == label)
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.emoji, self.label)
    }
}
