//! JSON file storage implementation.
//!
//! Stores each record as a pretty-printed JSON file under a data directory:
//! `vehicles/`, `drivers/`, `missions/` and `users/`. Suitable for a single
//! process; all writes go through one async lock so read-modify-write
//! sequences such as the odometer credit are atomic with respect to each other.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use autoparc_core::{
    round_km, Driver, DriverId, Mission, MissionFilter, MissionId, User, UserId, Vehicle,
    VehicleId,
};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Result, Storage, StorageError};

const VEHICLES: &str = "vehicles";
const DRIVERS: &str = "drivers";
const MISSIONS: &str = "missions";
const USERS: &str = "users";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the record directories.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in [VEHICLES, DRIVERS, MISSIONS, USERS] {
            fs::create_dir_all(root.join(kind)).await?;
        }
        info!("Opened JSON storage at {}", root.display());

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn record_path(&self, kind: &str, id: impl std::fmt::Display) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    async fn write_record<T: serde::Serialize>(&self, kind: &str, id: impl std::fmt::Display, value: &T) -> Result<()> {
        let path = self.record_path(kind, id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_record(&self, kind: &str, id: impl std::fmt::Display) -> Result<bool> {
        match fs::remove_file(self.record_path(kind, id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn missions_matching(&self, filter: &MissionFilter) -> Result<Vec<Mission>> {
        let all: Vec<Mission> = list_dir(&self.root.join(MISSIONS)).await?;
        Ok(all.into_iter().filter(|m| filter.matches(m)).collect())
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_record(VEHICLES, vehicle.id, vehicle).await
    }

    async fn load_vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>> {
        read_json(&self.record_path(VEHICLES, id)).await
    }

    async fn find_vehicle_by_registration(&self, registration: &str) -> Result<Option<Vehicle>> {
        let all: Vec<Vehicle> = list_dir(&self.root.join(VEHICLES)).await?;
        Ok(all.into_iter().find(|v| v.registration == registration))
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = list_dir(&self.root.join(VEHICLES)).await?;
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn delete_vehicle(&self, id: VehicleId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.remove_record(VEHICLES, id).await
    }

    async fn save_driver(&self, driver: &Driver) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_record(DRIVERS, driver.id, driver).await
    }

    async fn load_driver(&self, id: DriverId) -> Result<Option<Driver>> {
        read_json(&self.record_path(DRIVERS, id)).await
    }

    async fn find_driver_by_license(&self, license_number: &str) -> Result<Option<Driver>> {
        let all: Vec<Driver> = list_dir(&self.root.join(DRIVERS)).await?;
        Ok(all.into_iter().find(|d| d.license_number == license_number))
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>> {
        let mut drivers: Vec<Driver> = list_dir(&self.root.join(DRIVERS)).await?;
        drivers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(drivers)
    }

    async fn delete_driver(&self, id: DriverId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.remove_record(DRIVERS, id).await
    }

    async fn save_mission(&self, mission: &Mission) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(MISSIONS, mission.id);

        let mut record = mission.clone();
        if let Some(stored) = read_json::<Mission>(&path).await? {
            record.distance_applied = stored.distance_applied;
            record.created_at = stored.created_at;
        }
        self.write_record(MISSIONS, mission.id, &record).await
    }

    async fn load_mission(&self, id: MissionId) -> Result<Option<Mission>> {
        read_json(&self.record_path(MISSIONS, id)).await
    }

    async fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>> {
        let mut missions = self.missions_matching(filter).await?;
        missions.sort_by(|a, b| {
            b.departure_date
                .cmp(&a.departure_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(missions)
    }

    async fn delete_mission(&self, id: MissionId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.remove_record(MISSIONS, id).await
    }

    async fn count_missions_for_vehicle(&self, id: VehicleId) -> Result<usize> {
        let filter = MissionFilter {
            vehicle_id: Some(id),
            ..Default::default()
        };
        Ok(self.missions_matching(&filter).await?.len())
    }

    async fn count_missions_for_driver(&self, id: DriverId) -> Result<usize> {
        let all: Vec<Mission> = list_dir(&self.root.join(MISSIONS)).await?;
        Ok(all.iter().filter(|m| m.driver_id == Some(id)).count())
    }

    async fn apply_mission_distance(
        &self,
        mission_id: MissionId,
        vehicle_id: VehicleId,
        distance_km: f64,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let Some(mut mission) =
            read_json::<Mission>(&self.record_path(MISSIONS, mission_id)).await?
        else {
            return Err(StorageError::NotFound(format!("mission {mission_id}")));
        };
        if mission.distance_applied {
            debug!("Distance of mission {} already credited", mission_id);
            return Ok(false);
        }
        let Some(mut vehicle) =
            read_json::<Vehicle>(&self.record_path(VEHICLES, vehicle_id)).await?
        else {
            return Err(StorageError::NotFound(format!("vehicle {vehicle_id}")));
        };

        vehicle.odometer_km = round_km(vehicle.odometer_km + distance_km);
        vehicle.updated_at = chrono::Utc::now();
        mission.distance_applied = true;

        // Vehicle first; the flag is never set without the credit.
        self.write_record(VEHICLES, vehicle_id, &vehicle).await?;
        self.write_record(MISSIONS, mission_id, &mission).await?;
        Ok(true)
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_record(USERS, user.id, user).await
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        read_json(&self.record_path(USERS, id)).await
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let all: Vec<User> = list_dir(&self.root.join(USERS)).await?;
        Ok(all.into_iter().find(|u| u.api_token == token))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = list_dir(&self.root.join(USERS)).await?;
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn health_check(&self) -> bool {
        fs::metadata(&self.root).await.map(|m| m.is_dir()).unwrap_or(false)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable record {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_driver, sample_mission, sample_user, sample_vehicle};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_vehicle_and_driver_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let vehicle = sample_vehicle("77-B-2");
        storage.save_vehicle(&vehicle).await.unwrap();
        assert!(dir
            .path()
            .join("vehicles")
            .join(format!("{}.json", vehicle.id))
            .exists());
        assert_eq!(
            storage.find_vehicle_by_registration("77-B-2").await.unwrap().map(|v| v.id),
            Some(vehicle.id)
        );

        let driver = sample_driver("P-9");
        storage.save_driver(&driver).await.unwrap();
        assert_eq!(storage.load_driver(driver.id).await.unwrap(), Some(driver.clone()));
        assert!(storage.delete_driver(driver.id).await.unwrap());
        assert!(!storage.delete_driver(driver.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missions_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();

        let early = sample_mission(vehicle.id);
        let mut late = sample_mission(vehicle.id);
        late.departure_date = early.departure_date + chrono::Duration::days(3);
        let other = sample_mission(VehicleId::new());
        for m in [&early, &late, &other] {
            storage.save_mission(m).await.unwrap();
        }

        let filter = MissionFilter {
            vehicle_id: Some(vehicle.id),
            ..Default::default()
        };
        let listed = storage.list_missions(&filter).await.unwrap();
        assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![late.id, early.id]);
        assert_eq!(storage.count_missions_for_vehicle(vehicle.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_apply_distance_once_and_flag_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(JsonStorage::new(dir.path()).await.unwrap());
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();
        let mission = sample_mission(vehicle.id);
        storage.save_mission(&mission).await.unwrap();

        let (a, b) = tokio::join!(
            storage.apply_mission_distance(mission.id, vehicle.id, 42.5),
            storage.apply_mission_distance(mission.id, vehicle.id, 42.5),
        );
        assert_eq!([a.unwrap(), b.unwrap()].iter().filter(|x| **x).count(), 1);

        storage.save_mission(&mission).await.unwrap();
        let loaded = storage.load_mission(mission.id).await.unwrap().unwrap();
        assert!(loaded.distance_applied);

        let vehicle_after = storage.load_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(vehicle_after.odometer_km, vehicle.odometer_km + 42.5);
    }

    #[tokio::test]
    async fn test_apply_distance_rounds_odometer() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let mut vehicle = sample_vehicle("1-A-1");
        vehicle.odometer_km = 1000.1;
        storage.save_vehicle(&vehicle).await.unwrap();
        let mut mission = sample_mission(vehicle.id);
        mission.start_odometer_km = Some(1000.0);
        mission.return_odometer_km = Some(1171.0);
        storage.save_mission(&mission).await.unwrap();

        assert!(storage.apply_mission_distance(mission.id, vehicle.id, 170.86).await.unwrap());

        let vehicle_after = storage.load_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(vehicle_after.odometer_km, 1170.96);
        let loaded = storage.load_mission(mission.id).await.unwrap().unwrap();
        assert_eq!(loaded.travelled_km(), Some(171.0));
    }

    #[tokio::test]
    async fn test_users_by_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = sample_user("secret");
        storage.save_user(&user).await.unwrap();

        assert_eq!(
            storage.find_user_by_token("secret").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert_eq!(storage.list_users().await.unwrap().len(), 1);
        assert!(storage.health_check().await);
    }
}
