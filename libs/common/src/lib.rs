//! Shared basics for the AQI status bot services
//!
//! Provides the pieces every binary in the workspace needs:
//! - logging setup
//! - layered configuration loading
//! - API response and error types
//! - shutdown signal handling

pub mod api_types;
pub mod config_loader;
pub mod error;
pub mod logging;
pub mod shutdown;

pub use config_loader::ConfigLoader;
pub use error::{Error, Result};

// Re-export commonly used API types
pub use api_types::{ErrorInfo, ErrorResponse, HealthStatus, SuccessResponse};

// Re-export AppError when axum feature is enabled
#[cfg(feature = "axum")]
pub use api_types::AppError;
