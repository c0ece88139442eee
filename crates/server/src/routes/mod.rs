//! HTTP routes under `/api`.

pub mod drivers;
pub mod missions;
pub mod vehicles;

use std::str::FromStr;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a path identifier.
pub(crate) fn parse_id<T: FromStr>(raw: &str, kind: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {kind} id: {raw}")))
}

/// `GET /api/health`, public.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let storage_ok = state.storage.health_check().await;
    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "success": storage_ok,
            "status": if storage_ok { "ok" } else { "degraded" },
            "storage": storage_ok,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
