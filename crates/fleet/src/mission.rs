//! Mission lifecycle and the odometer side-effect.
//!
//! A mission entering `completed` with a known distance credits that distance
//! to its vehicle exactly once. The credit goes through
//! [`Storage::apply_mission_distance`], which flips the mission's
//! `distance_applied` flag and bumps the odometer in one atomic step, so two
//! concurrent completions of the same mission add the distance once.

use std::collections::HashMap;
use std::sync::Arc;

use autoparc_core::{
    Coordinates, DriverId, Mission, MissionFilter, MissionId, MissionStats, MissionStatus,
    User, Vehicle, VehicleId,
};
use autoparc_geo::{maps_link, DistanceResolver, RouteRequest};
use autoparc_storage::Storage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{required, required_text, FleetError, Result};

/// Fes depot, used as trip origin when a request only gives a destination.
pub const DEFAULT_DEPOT: Coordinates = Coordinates {
    lat: 34.03713134630721,
    lng: -4.997884940839293,
};

/// Body of a mission create or update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionRequest {
    /// Vehicle doing the trip
    pub vehicle_id: Option<VehicleId>,
    /// Assigned driver
    pub driver_id: Option<DriverId>,
    /// Purpose of the trip
    pub purpose: Option<String>,
    /// Destination label
    pub destination: Option<String>,
    /// Departure date
    pub departure_date: Option<NaiveDate>,
    /// Return date
    pub return_date: Option<NaiveDate>,
    /// Transported personnel
    pub personnel: Option<String>,
    /// Lifecycle state; planned on create, unchanged on update when absent
    pub status: Option<MissionStatus>,
    /// Trip start point
    pub origin: Option<Coordinates>,
    /// Trip end point
    pub destination_coords: Option<Coordinates>,
    /// Known distance in km
    pub distance_km: Option<f64>,
    /// Known duration in minutes
    pub duration_min: Option<u32>,
    /// Odometer reading at departure, km
    pub start_odometer_km: Option<f64>,
    /// Odometer reading on return, km
    pub return_odometer_km: Option<f64>,
    /// Free text
    pub notes: Option<String>,
}

/// Validated request fields.
struct CheckedMission {
    vehicle_id: VehicleId,
    purpose: String,
    destination: String,
    departure_date: NaiveDate,
}

impl MissionRequest {
    fn check(&self) -> Result<CheckedMission> {
        let checked = CheckedMission {
            vehicle_id: required(self.vehicle_id, "vehicle_id")?,
            purpose: required_text(self.purpose.as_deref(), "purpose")?,
            destination: required_text(self.destination.as_deref(), "destination")?,
            departure_date: required(self.departure_date, "departure_date")?,
        };

        for (km, field) in [
            (self.distance_km, "distance_km"),
            (self.start_odometer_km, "start_odometer_km"),
            (self.return_odometer_km, "return_odometer_km"),
        ] {
            if matches!(km, Some(km) if !km.is_finite() || km < 0.0) {
                return Err(FleetError::validation(format!(
                    "{field} must be zero or positive"
                )));
            }
        }
        for (point, field) in [
            (self.origin, "origin"),
            (self.destination_coords, "destination_coords"),
        ] {
            if matches!(point, Some(p) if !p.is_valid()) {
                return Err(FleetError::validation(format!(
                    "{field} is not a valid latitude/longitude"
                )));
            }
        }
        Ok(checked)
    }

    fn touches_route(&self) -> bool {
        self.distance_km.is_some() || self.origin.is_some() || self.destination_coords.is_some()
    }
}

/// Ordering rules between fields, checked on the mission about to be stored.
fn check_order(mission: &Mission) -> Result<()> {
    if matches!(mission.return_date, Some(r) if r < mission.departure_date) {
        return Err(FleetError::validation(
            "return_date must not precede departure_date",
        ));
    }
    if let (Some(start), Some(back)) = (mission.start_odometer_km, mission.return_odometer_km) {
        if back < start {
            return Err(FleetError::validation(
                "return_odometer_km must not be below start_odometer_km",
            ));
        }
    }
    Ok(())
}

/// A mission as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionDetails {
    /// The stored mission
    #[serde(flatten)]
    pub mission: Mission,

    /// Name of the assigned vehicle
    pub vehicle_name: Option<String>,

    /// Licence plate of the assigned vehicle
    pub registration: Option<String>,

    /// Google Maps link for the route
    pub maps_link: Option<String>,

    /// Return minus start odometer reading, km
    pub travelled_km: Option<f64>,
}

impl MissionDetails {
    fn new(mission: Mission, vehicle: Option<&Vehicle>) -> Self {
        let maps_link = maps_link(mission.origin, mission.destination_coords);
        Self {
            travelled_km: mission.travelled_km(),
            vehicle_name: vehicle.map(|v| v.name.clone()),
            registration: vehicle.map(|v| v.registration.clone()),
            maps_link,
            mission,
        }
    }
}

/// Mission lifecycle service.
#[derive(Clone)]
pub struct MissionService {
    storage: Arc<dyn Storage>,
    resolver: DistanceResolver,
    depot: Coordinates,
}

impl MissionService {
    /// Create a service using the default depot as fallback origin.
    pub fn new(storage: Arc<dyn Storage>, resolver: DistanceResolver) -> Self {
        Self {
            storage,
            resolver,
            depot: DEFAULT_DEPOT,
        }
    }

    /// Override the fallback origin.
    pub fn with_depot(mut self, depot: Coordinates) -> Self {
        self.depot = depot;
        self
    }

    /// Create a mission and, if it starts completed with a distance, credit
    /// the vehicle odometer.
    pub async fn create(&self, request: MissionRequest, responsible: &User) -> Result<MissionDetails> {
        let checked = request.check()?;
        let vehicle = self.require_vehicle(checked.vehicle_id).await?;
        self.require_driver(request.driver_id).await?;

        let origin = match (request.origin, request.destination_coords) {
            (None, Some(_)) => Some(self.depot),
            (origin, _) => origin,
        };
        let route = self
            .resolver
            .resolve(&RouteRequest {
                distance_km: request.distance_km,
                duration_min: request.duration_min,
                origin,
                destination: request.destination_coords,
            })
            .await;

        let now = chrono::Utc::now();
        let mut mission = Mission {
            id: MissionId::new(),
            vehicle_id: checked.vehicle_id,
            driver_id: request.driver_id,
            purpose: checked.purpose,
            destination: checked.destination,
            departure_date: checked.departure_date,
            return_date: request.return_date,
            personnel: request.personnel.unwrap_or_default(),
            status: request.status.unwrap_or_default(),
            origin,
            destination_coords: request.destination_coords,
            distance_km: route.map(|r| r.distance_km),
            duration_min: route.map_or(request.duration_min, |r| r.duration_min),
            distance_source: route.map(|r| r.source),
            distance_applied: false,
            start_odometer_km: request.start_odometer_km,
            return_odometer_km: request.return_odometer_km,
            notes: request.notes.unwrap_or_default(),
            responsible_id: responsible.id,
            created_at: now,
            updated_at: now,
        };
        check_order(&mission)?;

        self.storage.save_mission(&mission).await?;
        info!(
            "Created mission {} for vehicle {} ({})",
            mission.id, mission.vehicle_id, mission.status
        );

        self.credit_odometer(&mut mission, None).await?;
        Ok(MissionDetails::new(mission, Some(&vehicle)))
    }

    /// Update a mission. Entering `completed` credits the odometer once;
    /// later edits never adjust it again.
    ///
    /// Required fields are required again. Optional fields left out of the
    /// request keep their stored value; an empty string clears a text field.
    pub async fn update(
        &self,
        id: MissionId,
        request: MissionRequest,
        responsible: &User,
    ) -> Result<MissionDetails> {
        let checked = request.check()?;
        let existing = self.load(id).await?;
        let vehicle = self.require_vehicle(checked.vehicle_id).await?;
        self.require_driver(request.driver_id).await?;

        let previous = existing.status;
        let mut mission = Mission {
            vehicle_id: checked.vehicle_id,
            driver_id: request.driver_id.or(existing.driver_id),
            purpose: checked.purpose,
            destination: checked.destination,
            departure_date: checked.departure_date,
            return_date: request.return_date.or(existing.return_date),
            personnel: request.personnel.clone().unwrap_or(existing.personnel),
            status: request.status.unwrap_or(previous),
            start_odometer_km: request.start_odometer_km.or(existing.start_odometer_km),
            return_odometer_km: request.return_odometer_km.or(existing.return_odometer_km),
            notes: request.notes.clone().unwrap_or(existing.notes),
            responsible_id: responsible.id,
            updated_at: chrono::Utc::now(),
            ..existing
        };

        if request.touches_route() {
            let destination = request.destination_coords.or(mission.destination_coords);
            let origin = match request.origin.or(mission.origin) {
                None if destination.is_some() => Some(self.depot),
                origin => origin,
            };
            let route = self
                .resolver
                .resolve(&RouteRequest {
                    distance_km: request.distance_km,
                    duration_min: request.duration_min,
                    origin,
                    destination,
                })
                .await;

            mission.origin = origin;
            mission.destination_coords = destination;
            if let Some(route) = route {
                mission.distance_km = Some(route.distance_km);
                mission.duration_min = route.duration_min;
                mission.distance_source = Some(route.source);
            }
        } else if request.duration_min.is_some() {
            mission.duration_min = request.duration_min;
        }
        check_order(&mission)?;

        self.storage.save_mission(&mission).await?;
        debug!("Updated mission {} ({} -> {})", mission.id, previous, mission.status);

        self.credit_odometer(&mut mission, Some(previous)).await?;
        Ok(MissionDetails::new(mission, Some(&vehicle)))
    }

    /// Load one mission with its vehicle details.
    pub async fn get(&self, id: MissionId) -> Result<MissionDetails> {
        let mission = self.load(id).await?;
        let vehicle = self.storage.load_vehicle(mission.vehicle_id).await?;
        Ok(MissionDetails::new(mission, vehicle.as_ref()))
    }

    /// Missions matching `filter`, latest departure first.
    pub async fn list(&self, filter: &MissionFilter) -> Result<Vec<MissionDetails>> {
        let missions = self.storage.list_missions(filter).await?;
        let vehicles: HashMap<VehicleId, Vehicle> = self
            .storage
            .list_vehicles()
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        Ok(missions
            .into_iter()
            .map(|m| {
                let vehicle = vehicles.get(&m.vehicle_id);
                MissionDetails::new(m, vehicle)
            })
            .collect())
    }

    /// Missions of one vehicle.
    pub async fn list_by_vehicle(&self, vehicle_id: VehicleId) -> Result<Vec<MissionDetails>> {
        self.require_vehicle(vehicle_id).await?;
        self.list(&MissionFilter {
            vehicle_id: Some(vehicle_id),
            ..Default::default()
        })
        .await
    }

    /// Delete a mission. An odometer credit already applied stays.
    pub async fn delete(&self, id: MissionId) -> Result<()> {
        if !self.storage.delete_mission(id).await? {
            return Err(FleetError::NotFound(format!("mission {id}")));
        }
        info!("Deleted mission {}", id);
        Ok(())
    }

    /// Counters over all missions.
    pub async fn stats(&self) -> Result<MissionStats> {
        let missions = self.storage.list_missions(&MissionFilter::default()).await?;
        Ok(MissionStats::from_missions(&missions))
    }

    async fn credit_odometer(
        &self,
        mission: &mut Mission,
        previous: Option<MissionStatus>,
    ) -> Result<()> {
        let Some(distance) = mission.pending_odometer_credit(previous) else {
            return Ok(());
        };

        let applied = self
            .storage
            .apply_mission_distance(mission.id, mission.vehicle_id, distance)
            .await?;
        if applied {
            info!(
                "Added {} km from mission {} to vehicle {}",
                distance, mission.id, mission.vehicle_id
            );
        } else {
            debug!("Mission {} distance already applied", mission.id);
        }
        mission.distance_applied = true;
        Ok(())
    }

    async fn load(&self, id: MissionId) -> Result<Mission> {
        self.storage
            .load_mission(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("mission {id}")))
    }

    async fn require_vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        self.storage
            .load_vehicle(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {id}")))
    }

    async fn require_driver(&self, id: Option<DriverId>) -> Result<()> {
        if let Some(id) = id {
            if self.storage.load_driver(id).await?.is_none() {
                return Err(FleetError::NotFound(format!("driver {id}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{driver_request, storage, user, vehicle_request, FakeProvider};
    use crate::{DriverService, VehicleService};
    use autoparc_core::{DistanceSource, RouteEstimate};

    struct Fixture {
        missions: MissionService,
        vehicles: VehicleService,
        user: User,
        vehicle_id: VehicleId,
    }

    async fn fixture(provider: Option<RouteEstimate>) -> Fixture {
        let storage = storage().await;
        let vehicles = VehicleService::new(storage.clone());
        let vehicle = vehicles.create(vehicle_request("12345-A-6")).await.unwrap();
        let resolver = DistanceResolver::new(Arc::new(FakeProvider(provider)));
        Fixture {
            missions: MissionService::new(storage.clone(), resolver),
            vehicles,
            user: user(&storage).await,
            vehicle_id: vehicle.id,
        }
    }

    fn request(vehicle_id: VehicleId) -> MissionRequest {
        MissionRequest {
            vehicle_id: Some(vehicle_id),
            purpose: Some("Audit".to_string()),
            destination: Some("Rabat".to_string()),
            departure_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            ..Default::default()
        }
    }

    fn fes() -> Coordinates {
        Coordinates::new(34.0371, -4.9979)
    }

    fn rabat() -> Coordinates {
        Coordinates::new(33.9716, -6.8498)
    }

    fn completed(mut request: MissionRequest) -> MissionRequest {
        request.status = Some(MissionStatus::Completed);
        request
    }

    async fn odometer(f: &Fixture) -> f64 {
        f.vehicles.get(f.vehicle_id).await.unwrap().odometer_km
    }

    #[tokio::test]
    async fn test_routing_distance_used_when_available() {
        let f = fixture(Some(RouteEstimate {
            distance_km: 208.4,
            duration_min: Some(131),
        }))
        .await;
        let mut req = request(f.vehicle_id);
        req.origin = Some(fes());
        req.destination_coords = Some(rabat());

        let created = f.missions.create(req, &f.user).await.unwrap();
        assert_eq!(created.mission.distance_km, Some(208.4));
        assert_eq!(created.mission.duration_min, Some(131));
        assert_eq!(created.mission.distance_source, Some(DistanceSource::Routing));
        assert_eq!(created.mission.status, MissionStatus::Planned);
        assert_eq!(created.registration.as_deref(), Some("12345-A-6"));
        assert!(created.maps_link.unwrap().contains("/maps/dir/"));
    }

    #[tokio::test]
    async fn test_haversine_fallback_without_duration() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.origin = Some(fes());
        req.destination_coords = Some(rabat());

        let created = f.missions.create(req, &f.user).await.unwrap();
        assert_eq!(created.mission.distance_km, Some(170.86));
        assert_eq!(created.mission.duration_min, None);
        assert_eq!(created.mission.distance_source, Some(DistanceSource::GreatCircle));
    }

    #[tokio::test]
    async fn test_depot_is_default_origin() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.destination_coords = Some(rabat());

        let created = f.missions.create(req, &f.user).await.unwrap();
        assert_eq!(created.mission.origin, Some(DEFAULT_DEPOT));
        assert!(created.mission.distance_km.is_some());
    }

    #[tokio::test]
    async fn test_completion_credits_odometer_once() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.distance_km = Some(50.0);
        let created = f.missions.create(req.clone(), &f.user).await.unwrap();
        assert_eq!(odometer(&f).await, 1000.0);

        let id = created.mission.id;
        let done = f
            .missions
            .update(id, completed(req.clone()), &f.user)
            .await
            .unwrap();
        assert!(done.mission.distance_applied);
        assert_eq!(odometer(&f).await, 1050.0);

        // Same completed update again
        f.missions
            .update(id, completed(req.clone()), &f.user)
            .await
            .unwrap();
        assert_eq!(odometer(&f).await, 1050.0);

        // Leaving and re-entering completed does not credit again
        let mut back = req.clone();
        back.status = Some(MissionStatus::InProgress);
        f.missions.update(id, back, &f.user).await.unwrap();
        f.missions.update(id, completed(req), &f.user).await.unwrap();
        assert_eq!(odometer(&f).await, 1050.0);
    }

    #[tokio::test]
    async fn test_created_completed_credits_immediately() {
        let f = fixture(None).await;
        let mut req = completed(request(f.vehicle_id));
        req.distance_km = Some(12.345);

        let created = f.missions.create(req, &f.user).await.unwrap();
        assert!(created.mission.distance_applied);
        assert_eq!(odometer(&f).await, 1012.35);

        let stored = f.missions.get(created.mission.id).await.unwrap();
        assert!(stored.mission.distance_applied);
    }

    #[tokio::test]
    async fn test_no_route_never_touches_odometer() {
        let f = fixture(None).await;
        let created = f
            .missions
            .create(completed(request(f.vehicle_id)), &f.user)
            .await
            .unwrap();
        assert_eq!(created.mission.distance_km, None);
        assert!(!created.mission.distance_applied);
        assert!(created.maps_link.is_none());

        f.missions
            .update(created.mission.id, completed(request(f.vehicle_id)), &f.user)
            .await
            .unwrap();
        assert_eq!(odometer(&f).await, 1000.0);
    }

    #[tokio::test]
    async fn test_distance_edit_after_completion_is_not_reapplied() {
        let f = fixture(None).await;
        let mut req = completed(request(f.vehicle_id));
        req.distance_km = Some(40.0);
        let created = f.missions.create(req.clone(), &f.user).await.unwrap();
        assert_eq!(odometer(&f).await, 1040.0);

        req.distance_km = Some(90.0);
        let edited = f
            .missions
            .update(created.mission.id, req, &f.user)
            .await
            .unwrap();
        assert_eq!(edited.mission.distance_km, Some(90.0));
        assert_eq!(odometer(&f).await, 1040.0);
    }

    #[tokio::test]
    async fn test_concurrent_completion_credits_once() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.distance_km = Some(50.0);
        let id = f.missions.create(req.clone(), &f.user).await.unwrap().mission.id;

        let (a, b) = tokio::join!(
            f.missions.update(id, completed(req.clone()), &f.user),
            f.missions.update(id, completed(req), &f.user),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(odometer(&f).await, 1050.0);
        assert!(f.missions.get(id).await.unwrap().mission.distance_applied);
    }

    #[tokio::test]
    async fn test_unknown_vehicle_rejected_without_row() {
        let f = fixture(None).await;
        let err = f
            .missions
            .create(request(VehicleId::new()), &f.user)
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::NotFound(_)));
        assert!(f.missions.list(&MissionFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let f = fixture(None).await;

        let mut missing = request(f.vehicle_id);
        missing.purpose = None;
        let err = f.missions.create(missing, &f.user).await.unwrap_err();
        assert_eq!(err.to_string(), "purpose is required");

        let mut bad_dates = request(f.vehicle_id);
        bad_dates.return_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        assert!(matches!(
            f.missions.create(bad_dates, &f.user).await,
            Err(FleetError::Validation(_))
        ));

        let mut bad_point = request(f.vehicle_id);
        bad_point.destination_coords = Some(Coordinates::new(95.0, 0.0));
        assert!(matches!(
            f.missions.create(bad_point, &f.user).await,
            Err(FleetError::Validation(_))
        ));

        let mut unknown_driver = request(f.vehicle_id);
        unknown_driver.driver_id = Some(DriverId::new());
        assert!(matches!(
            f.missions.create(unknown_driver, &f.user).await,
            Err(FleetError::NotFound(_))
        ));
    }

    #[test]
    fn test_alias_fields_rejected() {
        let parsed: std::result::Result<MissionRequest, _> = serde_json::from_value(
            serde_json::json!({"vehicule_id": VehicleId::new(), "purpose": "x"}),
        );
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_update_keeps_status_and_route_when_absent() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.status = Some(MissionStatus::InProgress);
        req.origin = Some(fes());
        req.destination_coords = Some(rabat());
        let created = f.missions.create(req, &f.user).await.unwrap();

        let mut edit = request(f.vehicle_id);
        edit.notes = Some("Fuel card".to_string());
        let updated = f
            .missions
            .update(created.mission.id, edit, &f.user)
            .await
            .unwrap();
        assert_eq!(updated.mission.status, MissionStatus::InProgress);
        assert_eq!(updated.mission.distance_km, Some(170.86));
        assert_eq!(updated.mission.destination_coords, Some(rabat()));
        assert_eq!(updated.mission.notes, "Fuel card");
    }

    #[tokio::test]
    async fn test_update_keeps_absent_optional_fields() {
        let f = fixture(None).await;
        let drivers = DriverService::new(f.missions.storage.clone());
        let driver = drivers.create(driver_request("D-200")).await.unwrap();

        let mut req = request(f.vehicle_id);
        req.driver_id = Some(driver.id);
        req.return_date = NaiveDate::from_ymd_opt(2026, 3, 4);
        req.personnel = Some("2 agents".to_string());
        req.notes = Some("Fuel card".to_string());
        let created = f.missions.create(req, &f.user).await.unwrap();

        let mut edit = request(f.vehicle_id);
        edit.purpose = Some("Inspection".to_string());
        edit.notes = Some(String::new());
        let updated = f
            .missions
            .update(created.mission.id, edit, &f.user)
            .await
            .unwrap();
        assert_eq!(updated.mission.purpose, "Inspection");
        assert_eq!(updated.mission.driver_id, Some(driver.id));
        assert_eq!(updated.mission.return_date, NaiveDate::from_ymd_opt(2026, 3, 4));
        assert_eq!(updated.mission.personnel, "2 agents");
        assert_eq!(updated.mission.notes, "");

        // A stored return date still has to follow a moved departure
        let mut late = request(f.vehicle_id);
        late.departure_date = NaiveDate::from_ymd_opt(2026, 3, 9);
        assert!(matches!(
            f.missions.update(created.mission.id, late, &f.user).await,
            Err(FleetError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_odometer_readings_give_travelled_distance() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.start_odometer_km = Some(15200.0);
        let created = f.missions.create(req, &f.user).await.unwrap();
        assert_eq!(created.travelled_km, None);

        let mut back = request(f.vehicle_id);
        back.return_odometer_km = Some(15371.0);
        let updated = f
            .missions
            .update(created.mission.id, back, &f.user)
            .await
            .unwrap();
        assert_eq!(updated.mission.start_odometer_km, Some(15200.0));
        assert_eq!(updated.travelled_km, Some(171.0));
        // Readings are informational; the vehicle odometer only moves on completion
        assert_eq!(odometer(&f).await, 1000.0);

        let mut below = request(f.vehicle_id);
        below.return_odometer_km = Some(15100.0);
        assert!(matches!(
            f.missions.update(created.mission.id, below, &f.user).await,
            Err(FleetError::Validation(_))
        ));

        let mut negative = request(f.vehicle_id);
        negative.start_odometer_km = Some(-1.0);
        let err = f.missions.create(negative, &f.user).await.unwrap_err();
        assert_eq!(err.to_string(), "start_odometer_km must be zero or positive");
    }

    #[tokio::test]
    async fn test_new_destination_recomputes_distance_from_stored_origin() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.origin = Some(fes());
        req.destination_coords = Some(Coordinates::new(34.0371, -5.9979));
        let created = f.missions.create(req, &f.user).await.unwrap();
        assert_eq!(created.mission.distance_km, Some(92.14));

        let mut edit = request(f.vehicle_id);
        edit.destination_coords = Some(rabat());
        let updated = f
            .missions
            .update(created.mission.id, edit, &f.user)
            .await
            .unwrap();
        assert_eq!(updated.mission.origin, Some(fes()));
        assert_eq!(updated.mission.destination_coords, Some(rabat()));
        assert_eq!(updated.mission.distance_km, Some(170.86));
        assert_eq!(updated.mission.distance_source, Some(DistanceSource::GreatCircle));
    }

    #[tokio::test]
    async fn test_completion_without_route_fields_credits_stored_distance() {
        let f = fixture(None).await;
        let mut req = request(f.vehicle_id);
        req.origin = Some(fes());
        req.destination_coords = Some(rabat());
        let created = f.missions.create(req, &f.user).await.unwrap();
        assert_eq!(odometer(&f).await, 1000.0);

        let done = f
            .missions
            .update(created.mission.id, completed(request(f.vehicle_id)), &f.user)
            .await
            .unwrap();
        assert_eq!(done.mission.distance_km, Some(170.86));
        assert!(done.mission.distance_applied);
        assert_eq!(odometer(&f).await, 1170.86);
    }

    #[tokio::test]
    async fn test_list_stats_and_delete() {
        let f = fixture(None).await;
        let drivers = DriverService::new(f.missions.storage.clone());
        let driver = drivers.create(driver_request("D-100")).await.unwrap();

        let mut first = completed(request(f.vehicle_id));
        first.distance_km = Some(30.0);
        first.driver_id = Some(driver.id);
        let first = f.missions.create(first, &f.user).await.unwrap();
        f.missions.create(request(f.vehicle_id), &f.user).await.unwrap();

        let stats = f.missions.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.planned, 1);
        assert_eq!(stats.completed_distance_km, 30.0);

        let completed_only = f
            .missions
            .list(&MissionFilter {
                status: Some(MissionStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(completed_only.len(), 1);
        assert_eq!(completed_only[0].vehicle_name.as_deref(), Some("Partner"));
        assert_eq!(f.missions.list_by_vehicle(f.vehicle_id).await.unwrap().len(), 2);

        // Driver is referenced, vehicle too
        assert!(matches!(
            drivers.delete(driver.id).await,
            Err(FleetError::Conflict(_))
        ));
        assert!(matches!(
            f.vehicles.delete(f.vehicle_id).await,
            Err(FleetError::Conflict(_))
        ));

        f.missions.delete(first.mission.id).await.unwrap();
        assert_eq!(odometer(&f).await, 1030.0);
        assert!(matches!(
            f.missions.delete(first.mission.id).await,
            Err(FleetError::NotFound(_))
        ));
        drivers.delete(driver.id).await.unwrap();
    }
}
