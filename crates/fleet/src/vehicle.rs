//! Vehicle records.

use std::sync::Arc;

use autoparc_core::{
    FuelType, MechanicalCondition, Transmission, Vehicle, VehicleId, VehicleStats,
};
use autoparc_storage::Storage;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::{in_range, required_text, FleetError, Result};

/// Body of a vehicle create or update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleRequest {
    /// Display name
    pub name: Option<String>,
    /// Manufacturer
    pub brand: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Licence plate
    pub registration: Option<String>,
    /// First registration date
    pub first_registration: Option<NaiveDate>,
    /// Fuel type, petrol when absent on create
    pub fuel: Option<FuelType>,
    /// Gearbox
    pub transmission: Option<Transmission>,
    /// Number of doors
    pub doors: Option<u8>,
    /// Mechanical condition, good when absent on create
    pub condition: Option<MechanicalCondition>,
    /// Fiscal horsepower, 1..=50
    pub fiscal_power: Option<u8>,
    /// Tank capacity, 10..=200 litres
    pub tank_capacity_l: Option<f64>,
    /// Odometer reading, kept unchanged when absent on update
    pub odometer_km: Option<f64>,
    /// Consumption, 3..=25 L/100km
    pub consumption_l_per_100km: Option<f64>,
    /// Free text
    pub description: Option<String>,
}

struct CheckedVehicle {
    name: String,
    brand: String,
    model: String,
    registration: String,
}

impl VehicleRequest {
    fn check(&self) -> Result<CheckedVehicle> {
        let checked = CheckedVehicle {
            name: required_text(self.name.as_deref(), "name")?,
            brand: required_text(self.brand.as_deref(), "brand")?,
            model: required_text(self.model.as_deref(), "model")?,
            registration: required_text(self.registration.as_deref(), "registration")?,
        };

        in_range(self.consumption_l_per_100km, 3.0, 25.0, "consumption_l_per_100km")?;
        in_range(self.fiscal_power, 1, 50, "fiscal_power")?;
        in_range(self.tank_capacity_l, 10.0, 200.0, "tank_capacity_l")?;
        if let Some(km) = self.odometer_km {
            if !km.is_finite() || km < 0.0 {
                return Err(FleetError::validation("odometer_km must be zero or positive"));
            }
        }
        Ok(checked)
    }
}

/// Vehicle CRUD and statistics.
#[derive(Clone)]
pub struct VehicleService {
    storage: Arc<dyn Storage>,
}

impl VehicleService {
    /// Create a service over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Register a new vehicle.
    pub async fn create(&self, request: VehicleRequest) -> Result<Vehicle> {
        let checked = request.check()?;
        self.ensure_unique_registration(&checked.registration, None)
            .await?;

        let now = chrono::Utc::now();
        let vehicle = Vehicle {
            id: VehicleId::new(),
            name: checked.name,
            brand: checked.brand,
            model: checked.model,
            registration: checked.registration,
            first_registration: request.first_registration,
            fuel: request.fuel.unwrap_or(FuelType::Petrol),
            transmission: request.transmission,
            doors: request.doors,
            condition: request.condition.unwrap_or(MechanicalCondition::Good),
            fiscal_power: request.fiscal_power,
            tank_capacity_l: request.tank_capacity_l,
            odometer_km: request.odometer_km.unwrap_or(0.0),
            consumption_l_per_100km: request.consumption_l_per_100km,
            description: request.description.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.storage.save_vehicle(&vehicle).await?;
        info!("Created vehicle {} ({})", vehicle.id, vehicle.registration);
        Ok(vehicle)
    }

    /// Replace a vehicle's attributes.
    pub async fn update(&self, id: VehicleId, request: VehicleRequest) -> Result<Vehicle> {
        let checked = request.check()?;
        let existing = self.get(id).await?;
        self.ensure_unique_registration(&checked.registration, Some(id))
            .await?;

        let vehicle = Vehicle {
            name: checked.name,
            brand: checked.brand,
            model: checked.model,
            registration: checked.registration,
            first_registration: request.first_registration,
            fuel: request.fuel.unwrap_or(existing.fuel),
            transmission: request.transmission,
            doors: request.doors,
            condition: request.condition.unwrap_or(existing.condition),
            fiscal_power: request.fiscal_power,
            tank_capacity_l: request.tank_capacity_l,
            odometer_km: request.odometer_km.unwrap_or(existing.odometer_km),
            consumption_l_per_100km: request.consumption_l_per_100km,
            description: request.description.unwrap_or(existing.description),
            updated_at: chrono::Utc::now(),
            ..existing
        };

        self.storage.save_vehicle(&vehicle).await?;
        info!("Updated vehicle {}", vehicle.id);
        Ok(vehicle)
    }

    /// Load one vehicle.
    pub async fn get(&self, id: VehicleId) -> Result<Vehicle> {
        self.storage
            .load_vehicle(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {id}")))
    }

    /// All vehicles, newest first.
    pub async fn list(&self) -> Result<Vec<Vehicle>> {
        Ok(self.storage.list_vehicles().await?)
    }

    /// Delete a vehicle that no mission references.
    pub async fn delete(&self, id: VehicleId) -> Result<()> {
        let missions = self.storage.count_missions_for_vehicle(id).await?;
        if missions > 0 {
            return Err(FleetError::Conflict(format!(
                "vehicle {id} is used by {missions} mission(s)"
            )));
        }
        if !self.storage.delete_vehicle(id).await? {
            return Err(FleetError::NotFound(format!("vehicle {id}")));
        }
        info!("Deleted vehicle {}", id);
        Ok(())
    }

    /// Fleet counters.
    pub async fn stats(&self) -> Result<VehicleStats> {
        let vehicles = self.storage.list_vehicles().await?;
        Ok(VehicleStats::from_vehicles(&vehicles))
    }

    async fn ensure_unique_registration(
        &self,
        registration: &str,
        current: Option<VehicleId>,
    ) -> Result<()> {
        match self.storage.find_vehicle_by_registration(registration).await? {
            Some(other) if Some(other.id) != current => Err(FleetError::Conflict(format!(
                "registration {registration} is already used"
            ))),
            _ => Ok(()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{storage, vehicle_request};

    #[tokio::test]
    async fn test_create_defaults_and_ranges() {
        let service = VehicleService::new(storage().await);
        let vehicle = service.create(vehicle_request("1-A-1")).await.unwrap();
        assert_eq!(vehicle.fuel, FuelType::Petrol);
        assert_eq!(vehicle.condition, MechanicalCondition::Good);
        assert_eq!(vehicle.odometer_km, 1000.0);

        let mut thirsty = vehicle_request("2-A-2");
        thirsty.consumption_l_per_100km = Some(30.0);
        assert!(matches!(service.create(thirsty).await, Err(FleetError::Validation(_))));

        let mut tiny_tank = vehicle_request("3-A-3");
        tiny_tank.tank_capacity_l = Some(5.0);
        assert!(matches!(service.create(tiny_tank).await, Err(FleetError::Validation(_))));

        let mut no_brand = vehicle_request("4-A-4");
        no_brand.brand = Some(" ".to_string());
        let err = service.create(no_brand).await.unwrap_err();
        assert_eq!(err.to_string(), "brand is required");
    }

    #[tokio::test]
    async fn test_registration_unique() {
        let service = VehicleService::new(storage().await);
        let first = service.create(vehicle_request("9-B-9")).await.unwrap();
        assert!(matches!(
            service.create(vehicle_request("9-B-9")).await,
            Err(FleetError::Conflict(_))
        ));

        // Saving a vehicle under its own plate is fine
        let mut edit = vehicle_request("9-B-9");
        edit.condition = Some(MechanicalCondition::Excellent);
        edit.odometer_km = None;
        let updated = service.update(first.id, edit).await.unwrap();
        assert_eq!(updated.condition, MechanicalCondition::Excellent);
        assert_eq!(updated.odometer_km, 1000.0);
    }

    #[tokio::test]
    async fn test_stats_and_delete() {
        let service = VehicleService::new(storage().await);
        let a = service.create(vehicle_request("5-C-5")).await.unwrap();
        let mut diesel = vehicle_request("6-C-6");
        diesel.fuel = Some(FuelType::Diesel);
        diesel.condition = Some(MechanicalCondition::Poor);
        service.create(diesel).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.diesel, 1);
        assert_eq!(stats.poor, 1);

        service.delete(a.id).await.unwrap();
        assert!(matches!(service.get(a.id).await, Err(FleetError::NotFound(_))));
        assert!(matches!(service.delete(a.id).await, Err(FleetError::NotFound(_))));
    }
}
