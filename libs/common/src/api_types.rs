//! Shared API response models
//!
//! Every endpoint answers with either `SuccessResponse<T>` or
//! `ErrorResponse`, so callers (and cron dashboards) can branch on
//! `success` without knowing the endpoint.

use serde::{Deserialize, Serialize};

fn bool_true() -> bool {
    true
}

fn bool_false() -> bool {
    false
}

// ============================================================================
// Standard API Response Models
// ============================================================================

/// Standard success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    /// Success indicator (always true)
    #[serde(default = "bool_true")]
    pub success: bool,
    /// Response data
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Success indicator (always false for errors)
    #[serde(default = "bool_false")]
    pub success: bool,
    /// Error information
    pub error: ErrorInfo,
}

/// Standard error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (HTTP status)
    pub code: u16,
    /// Error message
    pub message: String,
    /// Detailed error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Health check payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthStatus {
    pub fn healthy(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            version: version.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

// ============================================================================
// AppError - HTTP Error with proper status codes (requires axum feature)
// ============================================================================

#[cfg(feature = "axum")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// Application error with HTTP status code
#[cfg(feature = "axum")]
#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub error: ErrorInfo,
}

#[cfg(feature = "axum")]
impl AppError {
    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    /// 500 Internal Server Error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 502 Bad Gateway, for failures of services we depend on
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_GATEWAY, message)
    }

    fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ErrorInfo::new(message).with_code(status.as_u16()),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error = self.error.with_details(details);
        self
    }
}

#[cfg(feature = "axum")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.error,
            }),
        )
            .into_response()
    }
}
