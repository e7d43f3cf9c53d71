//! PM2.5 concentration to AQI conversion
//!
//! Sensors that report raw PM2.5 (ug/m3) need converting before the value
//! means anything on the AQI scale. Breakpoints are the 2024 EPA revision:
//! <https://www.epa.gov/system/files/documents/2024-02/pm-naaqs-air-quality-index-fact-sheet.pdf>

use serde::{Deserialize, Serialize};

/// How the sensor statistic maps onto the AQI scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingScale {
    /// The statistic is classified as-is
    #[default]
    Aqi,
    /// The statistic is a PM2.5 concentration and is converted first
    Pm25,
}

impl ReadingScale {
    /// Map a raw sensor statistic onto the AQI scale
    pub fn to_aqi(self, raw: f64) -> f64 {
        match self {
            ReadingScale::Aqi => raw,
            ReadingScale::Pm25 => pm25_to_aqi(raw),
        }
    }
}

/// Highest value on the AQI scale
pub const AQI_MAX: f64 = 500.0;

// (concentration low, concentration high, aqi low, aqi high)
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 6] = [
    (0.0, 9.0, 0.0, 50.0),       // Good
    (9.1, 35.4, 51.0, 100.0),    // Moderate
    (35.5, 55.4, 101.0, 150.0),  // Unhealthy for Sensitive Groups
    (55.5, 125.4, 151.0, 200.0), // Unhealthy
    (125.5, 225.4, 201.0, 300.0), // Very Unhealthy
    (225.5, 500.0, 301.0, 500.0), // Hazardous
];

/// Convert a PM2.5 concentration to an (unrounded) AQI value.
///
/// The concentration is truncated to one decimal first, as the EPA does,
/// so values between two breakpoint rows (e.g. 9.05) fall into the lower
/// row. Negative concentrations count as zero; anything past the top
/// breakpoint is [`AQI_MAX`].
pub fn pm25_to_aqi(pm25: f64) -> f64 {
    if pm25.is_nan() || pm25 <= 0.0 {
        return 0.0;
    }

    let truncated = (pm25 * 10.0).trunc() / 10.0;

    for &(c_low, c_high, i_low, i_high) in PM25_BREAKPOINTS.iter() {
        if truncated >= c_low && truncated <= c_high {
            // I = (Ihi - Ilo) / (Chi - Clo) * (C - Clo) + Ilo
            return (i_high - i_low) * (truncated - c_low) / (c_high - c_low) + i_low;
        }
    }

    AQI_MAX
}
