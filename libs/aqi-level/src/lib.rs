//! aqi-level - AQI severity bands and publish decisions for the AQI status bot
//!
//! Everything in this crate is pure: no I/O, no clock, no configuration
//! lookup. The service crate feeds it readings and prior post text and acts
//! on the answers.
//!
//! # Example
//!
//! ```rust
//! use aqi_level::{compose_post_text, parse_band, summarize, UpdatePolicy, UpdateReason};
//!
//! let summary = summarize(42.3);
//! assert_eq!(summary.label, "Good");
//! assert_eq!(summary.display_aqi, 42.0);
//!
//! let text = compose_post_text(&summary, "Central Park, NY");
//! assert_eq!(text, "🟢 AQI near Central Park, NY: 42 (Good)");
//!
//! // Reading our own post back gives the band we announced
//! let prior = parse_band(&text);
//! assert_eq!(prior.map(|b| b.label), Some("Good"));
//!
//! // Same band, ten minutes later: stay quiet
//! let policy = UpdatePolicy::default();
//! assert_eq!(policy.decide(&summarize(44.0), prior, 10.0), None);
//!
//! // Band changed: publish
//! assert_eq!(
//!     policy.decide(&summarize(77.0), prior, 10.0),
//!     Some(UpdateReason::BandChanged)
//! );
//! ```
//!
//! # Bands
//!
//! | Color  | Label                          | Upper bound (inclusive) |
//! |--------|--------------------------------|-------------------------|
//! | green  | Good                           | 50                      |
//! | yellow | Moderate                       | 100                     |
//! | orange | Unhealthy for Sensitive Groups | 150                     |
//! | red    | Unhealthy                      | 200                     |
//! | purple | Very Unhealthy                 | 300                     |
//! | maroon | Hazardous                      | unbounded               |

pub mod band;
pub mod classifier;
pub mod conversion;
pub mod decision;
pub mod post_text;

// Re-exports for convenience
pub use band::{SeverityBand, AQI_LEVELS};
pub use classifier::{classify_band, summarize, AqiSummary};
pub use conversion::{pm25_to_aqi, ReadingScale};
pub use decision::{should_publish, UpdatePolicy, UpdateReason, DEFAULT_HEARTBEAT_MINUTES};
pub use post_text::{compose_post_text, parse_band};
