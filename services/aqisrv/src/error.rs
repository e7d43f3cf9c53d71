use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::AppError;
use thiserror::Error;

/// Result type for aqisrv
pub type Result<T> = std::result::Result<T, AqiSrvError>;

/// Errors that can occur in aqisrv
#[derive(Error, Debug)]
pub enum AqiSrvError {
    /// A required credential or identifier is absent
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Trigger secret missing or wrong
    #[error("Cron secret is wrong or missing")]
    Unauthorized,

    /// Sensor API answered with a non-success status
    #[error("Sensor API error: {0}")]
    Sensor(String),

    /// Bluesky answered with a non-success status
    #[error("Bluesky error: {0}")]
    Bluesky(String),

    /// An upstream answered 2xx with a body we cannot use
    #[error("Malformed response from {service}: {message}")]
    MalformedPayload {
        service: &'static str,
        message: String,
    },

    /// Transport-level failure talking to an upstream
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AqiSrvError {
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            service,
            message: message.into(),
        }
    }

    /// True for failures of the sensor API or Bluesky
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Sensor(_) | Self::Bluesky(_) | Self::MalformedPayload { .. } | Self::Http(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingConfig(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<common::Error> for AqiSrvError {
    fn from(err: common::Error) -> Self {
        AqiSrvError::Config(err.to_string())
    }
}

impl IntoResponse for AqiSrvError {
    fn into_response(self) -> Response {
        let app_error = match self.status_code() {
            StatusCode::UNAUTHORIZED => AppError::unauthorized(self.to_string()),
            StatusCode::BAD_GATEWAY => AppError::bad_gateway("Upstream request failed")
                .with_details(self.to_string()),
            _ => AppError::internal_error(self.to_string()),
        };
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AqiSrvError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AqiSrvError::MissingConfig("CRON_SECRET".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AqiSrvError::Sensor("HTTP 503".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AqiSrvError::malformed("PurpleAir", "missing stats").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_upstream_classification() {
        assert!(AqiSrvError::Bluesky("HTTP 401".into()).is_upstream());
        assert!(!AqiSrvError::Unauthorized.is_upstream());
        assert!(!AqiSrvError::MissingConfig("x".into()).is_upstream());
    }

    #[test]
    fn test_unauthorized_message() {
        assert_eq!(
            AqiSrvError::Unauthorized.to_string(),
            "Cron secret is wrong or missing"
        );
    }
}
