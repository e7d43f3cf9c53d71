//! Shared fixtures for the aqisrv integration tests
//!
//! Two wiremock servers stand in for PurpleAir and Bluesky. Every mock
//! carries an `.expect(n)`; the servers verify the counts when dropped.

#![allow(dead_code)]

use std::sync::Arc;

use aqisrv::config::AqiSrvConfig;
use aqisrv::{create_app_state, create_routes, AppState};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CRON_SECRET: &str = "s3cret";
pub const SENSOR_INDEX: &str = "1234";
pub const API_KEY: &str = "purpleair-key";
pub const BOT_DID: &str = "did:plc:aqibot";
pub const ACCESS_JWT: &str = "access-jwt";

pub struct Upstreams {
    pub purpleair: MockServer,
    pub bluesky: MockServer,
}

impl Upstreams {
    pub async fn start() -> Self {
        Self {
            purpleair: MockServer::start().await,
            bluesky: MockServer::start().await,
        }
    }

    /// Fully configured service pointing at the mock servers
    pub fn config(&self) -> AqiSrvConfig {
        let mut config = AqiSrvConfig::default();
        config.sensor.base_url = format!("{}/v1", self.purpleair.uri());
        config.sensor.api_key = Some(API_KEY.to_string());
        config.sensor.sensor_index = Some(SENSOR_INDEX.to_string());
        config.sensor.timeout_secs = 5;
        config.bluesky.service_url = self.bluesky.uri();
        config.bluesky.username = Some("aqibot.bsky.social".to_string());
        config.bluesky.password = Some("app-password".to_string());
        config.trigger.cron_secret = Some(CRON_SECRET.to_string());
        config
    }

    pub async fn mock_sensor(&self, value: f64, times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/sensors/{}", SENSOR_INDEX)))
            .and(header("X-API-Key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "api_version": "V1.0.11-0.0.49",
                "time_stamp": 1714564800,
                "sensor": {
                    "sensor_index": 1234,
                    "name": "CPW 86th",
                    "stats": {
                        "pm2.5": value,
                        "pm2.5_10minute": value,
                        "pm2.5_30minute": value
                    }
                }
            })))
            .expect(times)
            .mount(&self.purpleair)
            .await;
    }

    pub async fn mock_sensor_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/sensors/{}", SENSOR_INDEX)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": "ApiKeyInvalidError",
                "description": "The provided api_key was not valid."
            })))
            .expect(1)
            .mount(&self.purpleair)
            .await;
    }

    pub async fn mock_session(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_partial_json(json!({"identifier": "aqibot.bsky.social"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessJwt": ACCESS_JWT,
                "refreshJwt": "refresh-jwt",
                "did": BOT_DID,
                "handle": "aqibot.bsky.social"
            })))
            .expect(times)
            .mount(&self.bluesky)
            .await;
    }

    /// Author feed whose newest own post has `text` and was made `minutes_ago`
    pub async fn mock_feed(&self, latest: Option<(&str, i64)>, times: u64) {
        let feed = match latest {
            Some((text, minutes_ago)) => {
                vec![feed_item(text, Utc::now() - Duration::minutes(minutes_ago))]
            },
            None => Vec::new(),
        };

        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.feed.getAuthorFeed"))
            .and(query_param("actor", BOT_DID))
            .and(header("authorization", format!("Bearer {}", ACCESS_JWT).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "feed": feed })))
            .expect(times)
            .mount(&self.bluesky)
            .await;
    }

    /// createRecord mock; when `text` is given the request body must carry it
    pub async fn mock_create_record(&self, text: Option<&str>, times: u64) {
        let mut mock = Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .and(body_partial_json(json!({
                "repo": BOT_DID,
                "collection": "app.bsky.feed.post"
            })));
        if let Some(text) = text {
            mock = mock.and(body_partial_json(json!({"record": {"text": text}})));
        }

        mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": format!("at://{}/app.bsky.feed.post/3kabc", BOT_DID),
            "cid": "bafyreih"
        })))
        .expect(times)
        .mount(&self.bluesky)
        .await;
    }

    pub fn router(&self) -> Router {
        router_for(self.config())
    }
}

pub fn feed_item(text: &str, created_at: DateTime<Utc>) -> Value {
    json!({
        "post": {
            "uri": format!("at://{}/app.bsky.feed.post/3kprev", BOT_DID),
            "cid": "bafyprev",
            "author": {"did": BOT_DID, "handle": "aqibot.bsky.social"},
            "record": {
                "$type": "app.bsky.feed.post",
                "text": text,
                "createdAt": created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
            },
            "indexedAt": created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        }
    })
}

pub fn router_for(config: AqiSrvConfig) -> Router {
    let state: Arc<AppState> = create_app_state(config).unwrap();
    create_routes(state)
}

/// Trigger the cron route with an optional `authorization` header value
pub async fn trigger(
    app: Router,
    http_method: &str,
    authorization: Option<&str>,
) -> (Response<Body>, Value) {
    let mut request = Request::builder().method(http_method).uri("/api/cron/aqi");
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }

    let response = app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (Response::from_parts(parts, Body::empty()), json)
}

pub fn bearer() -> String {
    format!("Bearer {}", CRON_SECRET)
}
