//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HealthError>;

/// Failures of the surrounding application.
///
/// A failing service check is not an error: it is reported as an unhealthy
/// [`Status`](crate::health::Status).
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for HealthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            HealthError::GroupNotFound(group) => {
                (StatusCode::NOT_FOUND, format!("Group '{}' not found", group))
            }
            HealthError::Config(err) => {
                tracing::error!("Configuration error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }
            HealthError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            HealthError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
