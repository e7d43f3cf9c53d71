//! aqisrv library
//!
//! Scheduled AQI status job: read a PurpleAir sensor, classify the reading
//! and post to Bluesky when the band changes or the heartbeat is due.
//!
//! ## Architecture
//!
//! - `sensor`: PurpleAir client behind the `SensorSource` trait
//! - `bluesky`: XRPC client behind the `StatusFeed` trait
//! - `job`: one run, from reading to optional post
//! - `routes`: the cron trigger endpoint and health check

pub mod app;
pub mod bluesky;
pub mod config;
pub mod error;
pub mod job;
pub mod routes;
pub mod sensor;

// Re-export commonly used types
pub use config::AqiSrvConfig;
pub use error::{AqiSrvError, Result};
pub use job::{run_configured, AqiJob, JobOutcome, JobSettings};

// Re-export app state and initialization
pub use app::{create_app_state, AppState};

// Re-export route creation
pub use routes::create_routes;
