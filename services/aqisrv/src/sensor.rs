//! PurpleAir sensor client
//!
//! `GET {base_url}/sensors/{sensor_index}` with an `X-API-Key` header. The
//! value we classify is `sensor.stats["pm2.5_10minute"]`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AqiSrvError, Result};

const SERVICE: &str = "PurpleAir";

/// One reading taken from the sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_index: String,
    pub sensor_name: Option<String>,
    /// 10-minute PM2.5 average, as reported
    pub pm25_10minute: f64,
}

/// Source of the current reading
#[async_trait]
pub trait SensorSource: Send + Sync {
    async fn fetch_reading(&self) -> Result<SensorReading>;
}

#[derive(Debug, Deserialize)]
struct SensorResponse {
    sensor: SensorPayload,
}

#[derive(Debug, Deserialize)]
struct SensorPayload {
    #[serde(default)]
    name: Option<String>,
    stats: SensorStats,
}

#[derive(Debug, Deserialize)]
struct SensorStats {
    #[serde(rename = "pm2.5_10minute")]
    pm25_10minute: Option<f64>,
}

pub struct PurpleAirClient {
    http: Client,
    base_url: String,
    api_key: String,
    sensor_index: String,
}

impl PurpleAirClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        sensor_index: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            sensor_index: sensor_index.into(),
        }
    }

    fn sensor_url(&self) -> String {
        format!("{}/sensors/{}", self.base_url, self.sensor_index)
    }
}

#[async_trait]
impl SensorSource for PurpleAirClient {
    async fn fetch_reading(&self) -> Result<SensorReading> {
        let url = self.sensor_url();
        debug!("Fetching sensor {} from {}", self.sensor_index, url);

        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AqiSrvError::Sensor(format!(
                "sensor {} request failed with status {}: {}",
                self.sensor_index, status, body
            )));
        }

        parse_sensor_body(&self.sensor_index, &body)
    }
}

fn parse_sensor_body(sensor_index: &str, body: &str) -> Result<SensorReading> {
    let parsed: SensorResponse =
        serde_json::from_str(body).map_err(|e| AqiSrvError::malformed(SERVICE, e.to_string()))?;

    let value = parsed
        .sensor
        .stats
        .pm25_10minute
        .ok_or_else(|| AqiSrvError::malformed(SERVICE, "sensor.stats has no pm2.5_10minute"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(AqiSrvError::malformed(
            SERVICE,
            format!("pm2.5_10minute out of range: {}", value),
        ));
    }

    debug!("Sensor {} pm2.5_10minute = {}", sensor_index, value);
    Ok(SensorReading {
        sensor_index: sensor_index.to_string(),
        sensor_name: parsed.sensor.name,
        pm25_10minute: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sensor_body() {
        let body = r#"{
            "api_version": "V1.0.11-0.0.49",
            "time_stamp": 1700000000,
            "sensor": {
                "sensor_index": 1234,
                "name": "CPW 86th",
                "stats": {"pm2.5": 13.1, "pm2.5_10minute": 12.4, "pm2.5_30minute": 11.9}
            }
        }"#;
        let reading = parse_sensor_body("1234", body).unwrap();
        assert_eq!(reading.pm25_10minute, 12.4);
        assert_eq!(reading.sensor_name.as_deref(), Some("CPW 86th"));
        assert_eq!(reading.sensor_index, "1234");
    }

    #[test]
    fn test_parse_missing_statistic() {
        let body = r#"{"sensor": {"stats": {"pm2.5": 13.1}}}"#;
        let err = parse_sensor_body("1234", body).unwrap_err();
        assert!(matches!(err, AqiSrvError::MalformedPayload { service: "PurpleAir", .. }));
    }

    #[test]
    fn test_parse_not_json() {
        let err = parse_sensor_body("1234", "<html>oops</html>").unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn test_parse_negative_value() {
        let body = r#"{"sensor": {"stats": {"pm2.5_10minute": -3.0}}}"#;
        assert!(parse_sensor_body("1234", body).is_err());
    }

    #[test]
    fn test_sensor_url_trims_slash() {
        let client = PurpleAirClient::new(Client::new(), "http://localhost/v1/", "k", "77");
        assert_eq!(client.sensor_url(), "http://localhost/v1/sensors/77");
    }
}
