//! Vehicle endpoints.

use autoparc_core::VehicleId;
use autoparc_fleet::VehicleRequest;
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

/// `GET /api/vehicles`
pub async fn list(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Value>, ApiError> {
    let vehicles = state.vehicles.list().await?;
    Ok(Json(json!({
        "success": true,
        "count": vehicles.len(),
        "vehicles": vehicles,
    })))
}

/// `GET /api/vehicles/stats`
pub async fn stats(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Value>, ApiError> {
    let stats = state.vehicles.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// `GET /api/vehicles/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let vehicle = state.vehicles.get(parse_id::<VehicleId>(&id, "vehicle")?).await?;
    Ok(Json(json!({ "success": true, "vehicle": vehicle })))
}

/// `POST /api/vehicles`
pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Result<Json<VehicleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = body?;
    let vehicle = state.vehicles.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Vehicle created",
            "vehicle": vehicle,
        })),
    ))
}

/// `PUT /api/vehicles/:id`
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<VehicleRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id::<VehicleId>(&id, "vehicle")?;
    let Json(request) = body?;
    let vehicle = state.vehicles.update(id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Vehicle updated",
        "vehicle": vehicle,
    })))
}

/// `DELETE /api/vehicles/:id`
pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.vehicles.delete(parse_id::<VehicleId>(&id, "vehicle")?).await?;
    Ok(Json(json!({ "success": true, "message": "Vehicle deleted" })))
}
