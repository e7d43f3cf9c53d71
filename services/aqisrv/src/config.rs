//! aqisrv configuration
//!
//! Loaded once per process into [`AqiSrvConfig`] and passed explicitly to
//! every component. Credentials are optional at load time; a run checks for
//! them with [`AqiSrvConfig::require_credentials`] before touching the
//! network, so a half-configured server still starts and answers `/health`.

use std::path::Path;

use aqi_level::{ReadingScale, UpdatePolicy, DEFAULT_HEARTBEAT_MINUTES};
use common::logging::LogConfig;
use common::ConfigLoader;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AqiSrvError, Result};

pub const SERVICE_NAME: &str = "aqisrv";
pub const ENV_PREFIX: &str = "AQISRV";
pub const DEFAULT_CONFIG_PATH: &str = "config/aqisrv.yaml";

pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 6010;
pub const DEFAULT_PURPLEAIR_URL: &str = "https://api.purpleair.com/v1";
pub const DEFAULT_BLUESKY_URL: &str = "https://bsky.social";
pub const DEFAULT_LOCATION: &str = "Central Park, NY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FEED_LIMIT: u8 = 10;

/// Unprefixed variable names the job has always been deployed with
pub static LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("PURPLEAIR_API_KEY", "sensor.api_key"),
    ("SENSOR_INDEX", "sensor.sensor_index"),
    ("BLUESKY_USERNAME", "bluesky.username"),
    ("BLUESKY_PASSWORD", "bluesky.password"),
    ("CRON_SECRET", "trigger.cron_secret"),
];

/// String keys whose `AQISRV_*` values must not be parsed as numbers
pub static RAW_STRING_KEYS: &[&str] = &[
    "sensor.api_key",
    "sensor.sensor_index",
    "bluesky.username",
    "bluesky.password",
    "trigger.cron_secret",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AqiSrvConfig {
    pub service: ServiceConfig,
    pub sensor: SensorConfig,
    pub bluesky: BlueskyConfig,
    pub trigger: TriggerConfig,
    pub publish: PublishConfig,
    pub logging: LogConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// PurpleAir sensor API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub base_url: String,
    /// Sent as `X-API-Key`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// A bare number in YAML is accepted
    #[serde(deserialize_with = "string_or_integer")]
    pub sensor_index: Option<String>,
    pub reading_scale: ReadingScale,
    /// Timeout for every outbound request, sensor and Bluesky alike
    pub timeout_secs: u64,
}

/// Bluesky account the job posts as
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueskyConfig {
    pub service_url: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Inbound trigger authentication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Expected as `authorization: Bearer <cron_secret>`
    #[serde(skip_serializing)]
    pub cron_secret: Option<String>,
}

/// What gets posted and how often
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Place name used in the post text
    pub location: String,
    /// Repost an unchanged band after this many minutes
    pub heartbeat_minutes: f64,
    /// Read and decide, but never write
    pub dry_run: bool,
    /// How many feed items to scan for our own latest post
    pub feed_limit: u8,
}

/// Credentials a run needs, all present and non-empty
#[derive(Debug, Clone)]
pub struct Credentials {
    pub sensor_api_key: String,
    pub sensor_index: String,
    pub bluesky_username: String,
    pub bluesky_password: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PURPLEAIR_URL.to_string(),
            api_key: None,
            sensor_index: None,
            reading_scale: ReadingScale::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_BLUESKY_URL.to_string(),
            username: None,
            password: None,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            heartbeat_minutes: DEFAULT_HEARTBEAT_MINUTES,
            dry_run: false,
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }
}

impl AqiSrvConfig {
    /// Load configuration
    ///
    /// Priority (highest first): `AQISRV_*` env, legacy env names, the YAML
    /// file, built-in defaults. An explicit `path` must exist; without one
    /// `config/aqisrv.yaml` is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let loader = ConfigLoader::new().with_defaults(AqiSrvConfig::default());

        let loader = match path {
            Some(path) => loader.with_required_yaml_file(path)?,
            None => loader.with_yaml_file(DEFAULT_CONFIG_PATH),
        };

        let config: AqiSrvConfig = loader
            .with_env_aliases(LEGACY_ENV_KEYS)
            .with_env_prefix(ENV_PREFIX)
            .with_raw_env_keys(ENV_PREFIX, RAW_STRING_KEYS)
            .build()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that can never work, independent of credentials
    pub fn validate(&self) -> Result<()> {
        if self.service.port == 0 {
            return Err(AqiSrvError::Config("service.port cannot be 0".to_string()));
        }
        let heartbeat = self.publish.heartbeat_minutes;
        if heartbeat.is_nan() || heartbeat <= 0.0 {
            return Err(AqiSrvError::Config(
                "publish.heartbeat_minutes must be positive".to_string(),
            ));
        }
        if self.publish.feed_limit == 0 || self.publish.feed_limit > 100 {
            return Err(AqiSrvError::Config(
                "publish.feed_limit must be between 1 and 100".to_string(),
            ));
        }
        if self.sensor.timeout_secs == 0 {
            return Err(AqiSrvError::Config(
                "sensor.timeout_secs cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The trigger secret, if one is configured
    pub fn cron_secret(&self) -> Option<&str> {
        non_empty(&self.trigger.cron_secret)
    }

    /// Collect every credential a run needs, naming all missing ones at once
    pub fn require_credentials(&self) -> Result<Credentials> {
        let required = [
            ("sensor.api_key (PURPLEAIR_API_KEY)", non_empty(&self.sensor.api_key)),
            ("sensor.sensor_index (SENSOR_INDEX)", non_empty(&self.sensor.sensor_index)),
            ("bluesky.username (BLUESKY_USERNAME)", non_empty(&self.bluesky.username)),
            ("bluesky.password (BLUESKY_PASSWORD)", non_empty(&self.bluesky.password)),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AqiSrvError::MissingConfig(missing.join(", ")));
        }

        let [api_key, sensor_index, username, password] =
            required.map(|(_, value)| value.unwrap_or_default());
        Ok(Credentials {
            sensor_api_key: api_key.to_string(),
            sensor_index: sensor_index.to_string(),
            bluesky_username: username.to_string(),
            bluesky_password: password.to_string(),
        })
    }

    pub fn update_policy(&self) -> UpdatePolicy {
        UpdatePolicy::new(self.publish.heartbeat_minutes)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `sensor_index: 12345` in YAML is an integer; keep it as its decimal text
fn string_or_integer<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInteger {
        Str(String),
        Int(u64),
    }

    Ok(
        Option::<StringOrInteger>::deserialize(deserializer)?.map(|value| match value {
            StringOrInteger::Str(s) => s,
            StringOrInteger::Int(i) => i.to_string(),
        }),
    )
}
