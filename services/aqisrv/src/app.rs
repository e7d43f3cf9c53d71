//! Application state and initialization logic

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::AqiSrvConfig;
use crate::error::Result;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Arc<AqiSrvConfig>,
    /// One connection pool for PurpleAir and Bluesky
    pub http: Client,
}

/// Build the shared state from a loaded configuration
pub fn create_app_state(config: AqiSrvConfig) -> Result<Arc<AppState>> {
    let http = build_http_client(&config)?;
    Ok(Arc::new(AppState {
        config: Arc::new(config),
        http,
    }))
}

pub fn build_http_client(config: &AqiSrvConfig) -> Result<Client> {
    let timeout = Duration::from_secs(config.sensor.timeout_secs);
    debug!("Outbound HTTP timeout: {:?}", timeout);

    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
