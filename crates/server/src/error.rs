//! Error types and their HTTP mapping.

use autoparc_fleet::FleetError;
use autoparc_storage::StorageError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;

/// Error returned by a request handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid request
    #[error("{0}")]
    BadRequest(String),

    /// Missing or unknown bearer token
    #[error("authentication required")]
    Unauthorized,

    /// Unknown record
    #[error("{0}")]
    NotFound(String),

    /// Server-side failure; the detail is logged, never returned
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FleetError> for ApiError {
    fn from(e: FleetError) -> Self {
        match e {
            FleetError::Validation(msg) | FleetError::Conflict(msg) => Self::BadRequest(msg),
            FleetError::NotFound(_) => Self::NotFound(e.to_string()),
            FleetError::Storage(e) => {
                error!("Storage failure: {}", e);
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

/// Failure while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Bad configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage could not be opened
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Socket failure
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
