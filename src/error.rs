//! # Error Handling
//!
//! Custom error types and their conversion into HTTP responses.
//!
//! ## Error Categories:
//! - **InvalidConfiguration**: Beat parameters out of range or unsupported (400)
//! - **SessionNotFound**: Unknown session identifier (404)
//! - **Synthesis**: Unexpected numeric/runtime fault during buffer generation (500)
//! - **Config**: Configuration file or environment problems (500)
//! - **Internal**: Everything else server-side (500)
//!
//! A client disconnect during streaming is not represented here: the WebSocket
//! actor observes the close frame and stops, which is normal termination.
//!
//! All HTTP error responses share one JSON shape:
//! ```json
//! {
//!   "error": {
//!     "type": "invalid_configuration",
//!     "message": "combined frequency 1100 Hz exceeds the 1000 Hz limit",
//!     "timestamp": "2025-01-01T12:00:00Z"
//!   }
//! }
//! ```

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Application error taxonomy.
///
/// `InvalidConfiguration` and `SessionNotFound` are surfaced synchronously to
/// the caller. A `Synthesis` failure during streaming is delivered as an
/// in-band terminal frame instead, then the session is cleaned up.
#[derive(Debug)]
pub enum AppError {
    /// Beat parameters out of range, or an unsupported waveform kind
    InvalidConfiguration(String),

    /// Unknown session identifier on stream/query
    SessionNotFound(String),

    /// Unexpected fault while generating an audio buffer
    Synthesis(String),

    /// Configuration file or environment variable problems
    Config(String),

    /// Internal server errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            AppError::SessionNotFound(msg) => write!(f, "Session not found: {}", msg),
            AppError::Synthesis(msg) => write!(f, "Synthesis failure: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::InvalidConfiguration(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "invalid_configuration",
                msg.clone(),
            ),
            AppError::SessionNotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "session_not_found",
                msg.clone(),
            ),
            AppError::Synthesis(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "synthesis_failure",
                msg.clone(),
            ),
            AppError::Config(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidConfiguration(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
