//! Driver endpoints.

use autoparc_core::DriverId;
use autoparc_fleet::DriverRequest;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/drivers`
pub async fn list(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Value>, ApiError> {
    let drivers = state.drivers.list().await?;
    Ok(Json(json!({
        "success": true,
        "count": drivers.len(),
        "drivers": drivers,
    })))
}

/// `GET /api/drivers/active`
pub async fn active(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Value>, ApiError> {
    let drivers = state.drivers.list_active().await?;
    Ok(Json(json!({
        "success": true,
        "count": drivers.len(),
        "drivers": drivers,
    })))
}

/// `GET /api/drivers/stats`
pub async fn stats(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Value>, ApiError> {
    let stats = state.drivers.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// `GET /api/drivers/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let driver = state.drivers.get(parse_id::<DriverId>(&id, "driver")?).await?;
    Ok(Json(json!({ "success": true, "driver": driver })))
}

/// `GET /api/drivers/:id/license`
///
/// Licence number, category, expiry and whether it is `expired`,
/// `expiring` within 30 days or `valid`.
pub async fn license(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let license = state.drivers.license(parse_id::<DriverId>(&id, "driver")?).await?;
    Ok(Json(json!({ "success": true, "license": license })))
}

/// `POST /api/drivers`
pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Result<Json<DriverRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = body?;
    let driver = state.drivers.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Driver created",
            "driver": driver,
        })),
    ))
}

/// `PUT /api/drivers/:id`
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<DriverRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id::<DriverId>(&id, "driver")?;
    let Json(request) = body?;
    let driver = state.drivers.update(id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Driver updated",
        "driver": driver,
    })))
}

/// `DELETE /api/drivers/:id`
pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.drivers.delete(parse_id::<DriverId>(&id, "driver")?).await?;
    Ok(Json(json!({ "success": true, "message": "Driver deleted" })))
}
