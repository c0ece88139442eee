//! Storage trait abstraction.

use async_trait::async_trait;
use autoparc_core::{
    Driver, DriverId, Mission, MissionFilter, MissionId, User, UserId, Vehicle, VehicleId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be mapped back to a record
    #[error("Corrupt record {id}: {reason}")]
    Corrupt {
        /// Record id
        id: String,
        /// What was wrong
        reason: String,
    },

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Storage abstraction for fleet records.
///
/// Methods take `&self`; backends handle their own interior synchronization so
/// one instance can be shared across concurrent requests.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Vehicle operations ===

    /// Save a vehicle (create or update), including its odometer.
    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<()>;

    /// Load a vehicle by ID.
    async fn load_vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>>;

    /// Find a vehicle by licence plate.
    async fn find_vehicle_by_registration(&self, registration: &str) -> Result<Option<Vehicle>>;

    /// List vehicles, newest first.
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>>;

    /// Delete a vehicle. Returns whether it existed.
    async fn delete_vehicle(&self, id: VehicleId) -> Result<bool>;

    // === Driver operations ===

    /// Save a driver (create or update).
    async fn save_driver(&self, driver: &Driver) -> Result<()>;

    /// Load a driver by ID.
    async fn load_driver(&self, id: DriverId) -> Result<Option<Driver>>;

    /// Find a driver by licence number.
    async fn find_driver_by_license(&self, license_number: &str) -> Result<Option<Driver>>;

    /// List drivers ordered by last then first name.
    async fn list_drivers(&self) -> Result<Vec<Driver>>;

    /// Delete a driver. Returns whether it existed.
    async fn delete_driver(&self, id: DriverId) -> Result<bool>;

    // === Mission operations ===

    /// Save a mission (create or update).
    ///
    /// On an existing mission the stored `distance_applied` flag is left
    /// untouched; only [`Storage::apply_mission_distance`] sets it.
    async fn save_mission(&self, mission: &Mission) -> Result<()>;

    /// Load a mission by ID.
    async fn load_mission(&self, id: MissionId) -> Result<Option<Mission>>;

    /// List missions matching the filter, latest departure first.
    async fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>>;

    /// Delete a mission. Returns whether it existed.
    async fn delete_mission(&self, id: MissionId) -> Result<bool>;

    /// Number of missions assigned to a vehicle.
    async fn count_missions_for_vehicle(&self, id: VehicleId) -> Result<usize>;

    /// Number of missions assigned to a driver.
    async fn count_missions_for_driver(&self, id: DriverId) -> Result<usize>;

    /// Credit a mission's distance to its vehicle, at most once.
    ///
    /// Atomically sets the mission's `distance_applied` flag if it is still
    /// false and, only in that case, adds `distance_km` to the vehicle's
    /// odometer. Returns `true` when the credit was applied by this call.
    async fn apply_mission_distance(
        &self,
        mission_id: MissionId,
        vehicle_id: VehicleId,
        distance_km: f64,
    ) -> Result<bool>;

    // === User operations ===

    /// Save a user (create or update).
    async fn save_user(&self, user: &User) -> Result<()>;

    /// Load a user by ID.
    async fn load_user(&self, id: UserId) -> Result<Option<User>>;

    /// Find a user by bearer token.
    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>>;

    /// List users.
    async fn list_users(&self) -> Result<Vec<User>>;

    // === Health ===

    /// Check that the backend is reachable.
    async fn health_check(&self) -> bool;
}
