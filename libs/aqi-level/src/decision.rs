//! Publish/skip decision
//!
//! Publishing on every run would flood the feed; publishing only on change
//! would look dead during long stretches of stable air. The policy posts on
//! any band change and otherwise at most once per heartbeat interval.

use serde::Serialize;

use crate::band::SeverityBand;
use crate::classifier::AqiSummary;

/// Six hours
pub const DEFAULT_HEARTBEAT_MINUTES: f64 = 360.0;

/// Why a new post is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    /// No prior post, or its band could not be parsed
    NoPriorState,
    /// The reading moved to a different band
    BandChanged,
    /// Same band, but the heartbeat interval has elapsed
    Heartbeat,
}

impl std::fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UpdateReason::NoPriorState => "no prior state",
            UpdateReason::BandChanged => "band changed",
            UpdateReason::Heartbeat => "heartbeat",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdatePolicy {
    /// Minutes after which an unchanged band is posted again
    pub heartbeat_minutes: f64,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            heartbeat_minutes: DEFAULT_HEARTBEAT_MINUTES,
        }
    }
}

impl UpdatePolicy {
    pub fn new(heartbeat_minutes: f64) -> Self {
        Self { heartbeat_minutes }
    }

    /// Decide whether to publish, and why.
    ///
    /// `minutes_since_prior` is ignored when there is no prior band.
    pub fn decide(
        &self,
        current: &AqiSummary,
        prior_band: Option<&SeverityBand>,
        minutes_since_prior: f64,
    ) -> Option<UpdateReason> {
        let Some(prior) = prior_band else {
            return Some(UpdateReason::NoPriorState);
        };

        if prior.label != current.label {
            return Some(UpdateReason::BandChanged);
        }

        if minutes_since_prior >= self.heartbeat_minutes {
            return Some(UpdateReason::Heartbeat);
        }

        None
    }
}

/// [`UpdatePolicy::decide`] with the six-hour heartbeat, as a boolean
pub fn should_publish(
    current: &AqiSummary,
    prior_band: Option<&SeverityBand>,
    minutes_since_prior: f64,
) -> bool {
    UpdatePolicy::default()
        .decide(current, prior_band, minutes_since_prior)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::SeverityBand;
    use crate::classifier::summarize;

    fn good() -> Option<&'static SeverityBand> {
        SeverityBand::from_label("Good")
    }

    #[test]
    fn test_no_prior_always_publishes() {
        let current = summarize(42.0);
        assert_eq!(current.label, "Good");
        assert!(should_publish(&current, None, 0.0));
        assert_eq!(
            UpdatePolicy::default().decide(&current, None, 1.0),
            Some(UpdateReason::NoPriorState)
        );
    }

    #[test]
    fn test_same_band_recent_is_quiet() {
        assert!(!should_publish(&summarize(42.0), good(), 10.0));
        assert!(!should_publish(&summarize(42.0), good(), 359.0));
    }

    #[test]
    fn test_band_change_publishes() {
        let current = summarize(72.0);
        assert_eq!(current.label, "Moderate");
        assert!(should_publish(&current, good(), 10.0));
        assert_eq!(
            UpdatePolicy::default().decide(&current, good(), 10.0),
            Some(UpdateReason::BandChanged)
        );
    }

    #[test]
    fn test_heartbeat() {
        assert!(should_publish(&summarize(42.0), good(), 361.0));
        assert!(should_publish(&summarize(42.0), good(), 360.0));
        assert_eq!(
            UpdatePolicy::default().decide(&summarize(42.0), good(), 361.0),
            Some(UpdateReason::Heartbeat)
        );
    }

    #[test]
    fn test_custom_heartbeat() {
        let policy = UpdatePolicy::new(60.0);
        assert_eq!(policy.decide(&summarize(10.0), good(), 59.0), None);
        assert_eq!(
            policy.decide(&summarize(10.0), good(), 60.0),
            Some(UpdateReason::Heartbeat)
        );
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(UpdateReason::BandChanged.to_string(), "band changed");
        assert_eq!(
            serde_json::to_value(UpdateReason::NoPriorState).unwrap(),
            serde_json::json!("no_prior_state")
        );
    }
}
