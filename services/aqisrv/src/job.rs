//! One AQI job run
//!
//! fetch reading -> classify -> fetch latest post -> parse prior band ->
//! decide -> publish (unless dry run). Nothing is retried; the first error
//! ends the run.

use aqi_level::{
    compose_post_text, parse_band, summarize, AqiSummary, ReadingScale, UpdatePolicy, UpdateReason,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::bluesky::{BlueskyClient, StatusFeed};
use crate::config::AqiSrvConfig;
use crate::error::Result;
use crate::sensor::{PurpleAirClient, SensorSource};

/// Per-run knobs taken from configuration
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub location: String,
    pub scale: ReadingScale,
    pub policy: UpdatePolicy,
    pub dry_run: bool,
}

impl JobSettings {
    pub fn from_config(config: &AqiSrvConfig) -> Self {
        Self {
            location: config.publish.location.clone(),
            scale: config.sensor.reading_scale,
            policy: config.update_policy(),
            dry_run: config.publish.dry_run,
        }
    }
}

/// What a run saw and did, echoed in the HTTP response
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// Sensor statistic as reported
    pub reading: f64,
    /// Reading on the AQI scale
    pub aqi: f64,
    pub summary: AqiSummary,
    pub prior_label: Option<&'static str>,
    /// `None` when there is no prior post
    pub minutes_since_prior: Option<f64>,
    /// Rule that called for a post, `None` when skipped
    pub decision: Option<UpdateReason>,
    pub published: bool,
    pub dry_run: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_uri: Option<String>,
}

pub struct AqiJob<'a> {
    sensor: &'a dyn SensorSource,
    feed: &'a dyn StatusFeed,
    settings: JobSettings,
}

impl<'a> AqiJob<'a> {
    pub fn new(
        sensor: &'a dyn SensorSource,
        feed: &'a dyn StatusFeed,
        settings: JobSettings,
    ) -> Self {
        Self {
            sensor,
            feed,
            settings,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobOutcome> {
        self.run_inner(now).instrument(info_span!("aqi_job")).await
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> Result<JobOutcome> {
        let reading = self.sensor.fetch_reading().await?;
        let aqi = self.settings.scale.to_aqi(reading.pm25_10minute);
        let summary = summarize(aqi);
        let text = compose_post_text(&summary, &self.settings.location);
        info!(
            "Sensor {} reads {} (AQI {}): {}",
            reading.sensor_index, reading.pm25_10minute, aqi, summary.label
        );

        let prior = self.feed.latest_post().await?;
        let prior_band = match &prior {
            Some(post) => {
                let band = parse_band(&post.text);
                if band.is_none() {
                    warn!(
                        "Could not find a known band in latest post {}: {:?}",
                        post.uri, post.text
                    );
                }
                band
            },
            None => {
                info!("No prior post found");
                None
            },
        };
        let minutes_since_prior = prior
            .as_ref()
            .map(|post| (now - post.created_at).num_milliseconds() as f64 / 60_000.0);

        let decision = self.settings.policy.decide(
            &summary,
            prior_band,
            minutes_since_prior.unwrap_or(f64::INFINITY),
        );

        let mut outcome = JobOutcome {
            reading: reading.pm25_10minute,
            aqi,
            summary,
            prior_label: prior_band.map(|band| band.label),
            minutes_since_prior,
            decision,
            published: false,
            dry_run: self.settings.dry_run,
            text,
            post_uri: None,
        };

        match decision {
            None => {
                info!(
                    "Skipping post: still {} after {:.0} minutes",
                    summary.label,
                    minutes_since_prior.unwrap_or_default()
                );
            },
            Some(reason) if self.settings.dry_run => {
                info!("Dry run, would post ({}): {}", reason, outcome.text);
            },
            Some(reason) => {
                info!("Posting ({}): {}", reason, outcome.text);
                let post = self.feed.publish(&outcome.text).await?;
                outcome.published = true;
                outcome.post_uri = Some(post.uri);
            },
        }

        Ok(outcome)
    }
}

/// Build the real clients from configuration and run once.
///
/// Credentials are checked before any network call.
pub async fn run_configured(
    config: &AqiSrvConfig,
    http: &Client,
    dry_run_override: bool,
    now: DateTime<Utc>,
) -> Result<JobOutcome> {
    let credentials = config.require_credentials()?;

    let sensor = PurpleAirClient::new(
        http.clone(),
        &config.sensor.base_url,
        credentials.sensor_api_key,
        credentials.sensor_index,
    );
    let feed = BlueskyClient::new(
        http.clone(),
        &config.bluesky.service_url,
        credentials.bluesky_username,
        credentials.bluesky_password,
        config.publish.feed_limit,
    );

    let mut settings = JobSettings::from_config(config);
    settings.dry_run |= dry_run_override;

    AqiJob::new(&sensor, &feed, settings).run(now).await
}
