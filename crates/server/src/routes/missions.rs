//! Mission endpoints.

use autoparc_core::{MissionFilter, MissionId, MissionStatus, VehicleId};
use autoparc_fleet::MissionRequest;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `GET /api/missions`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionQuery {
    /// Status filter
    pub status: Option<String>,
    /// Vehicle filter
    pub vehicle_id: Option<String>,
}

impl MissionQuery {
    fn into_filter(self) -> Result<MissionFilter, ApiError> {
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<MissionStatus>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let vehicle_id = self
            .vehicle_id
            .filter(|v| !v.is_empty())
            .map(|v| parse_id::<VehicleId>(&v, "vehicle"))
            .transpose()?;
        Ok(MissionFilter { status, vehicle_id })
    }
}

/// `GET /api/missions`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    query: Result<Query<MissionQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let missions = state.missions.list(&query.into_filter()?).await?;
    Ok(Json(json!({
        "success": true,
        "count": missions.len(),
        "missions": missions,
    })))
}

/// `GET /api/missions/stats`
pub async fn stats(State(state): State<AppState>, _user: AuthUser) -> Result<Json<Value>, ApiError> {
    let stats = state.missions.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// `GET /api/missions/vehicle/:vehicle_id`
pub async fn by_vehicle(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(vehicle_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let vehicle_id = parse_id::<VehicleId>(&vehicle_id, "vehicle")?;
    let missions = state.missions.list_by_vehicle(vehicle_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": missions.len(),
        "missions": missions,
    })))
}

/// `GET /api/missions/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mission = state.missions.get(parse_id::<MissionId>(&id, "mission")?).await?;
    Ok(Json(json!({ "success": true, "mission": mission })))
}

/// `POST /api/missions`
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<MissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = body?;
    let mission = state.missions.create(request, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Mission created",
            "mission": mission,
        })),
    ))
}

/// `PUT /api/missions/:id`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<MissionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id::<MissionId>(&id, "mission")?;
    let Json(request) = body?;
    let mission = state.missions.update(id, request, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Mission updated",
        "mission": mission,
    })))
}

/// `DELETE /api/missions/:id`
pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.missions.delete(parse_id::<MissionId>(&id, "mission")?).await?;
    Ok(Json(json!({ "success": true, "message": "Mission deleted" })))
}
