//! SQLite storage backend for Auto Parc.
//!
//! Records live in typed tables (`vehicles`, `drivers`, `missions`, `users`)
//! so that the odometer credit can run as a single conditional update inside
//! a transaction. This is the recommended backend for production use.

use std::str::FromStr;

use async_trait::async_trait;
use autoparc_core::{
    Coordinates, DistanceSource, Driver, DriverId, Mission, MissionFilter, MissionId,
    MissionStatus, Transmission, User, UserId, Vehicle, VehicleId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::trait_::{Result, Storage, StorageError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS vehicles (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        brand TEXT NOT NULL,
        model TEXT NOT NULL,
        registration TEXT NOT NULL UNIQUE,
        first_registration TEXT,
        fuel TEXT NOT NULL,
        transmission TEXT,
        doors INTEGER,
        condition TEXT NOT NULL,
        fiscal_power INTEGER,
        tank_capacity_l REAL,
        odometer_km REAL NOT NULL DEFAULT 0,
        consumption_l_per_100km REAL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS drivers (
        id TEXT PRIMARY KEY,
        last_name TEXT NOT NULL,
        first_name TEXT NOT NULL,
        license_number TEXT NOT NULL UNIQUE,
        license_category TEXT NOT NULL,
        license_expiry TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT,
        address TEXT,
        birth_date TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS missions (
        id TEXT PRIMARY KEY,
        vehicle_id TEXT NOT NULL REFERENCES vehicles(id),
        driver_id TEXT REFERENCES drivers(id),
        purpose TEXT NOT NULL,
        destination TEXT NOT NULL,
        departure_date TEXT NOT NULL,
        return_date TEXT,
        personnel TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        origin_lat REAL,
        origin_lng REAL,
        dest_lat REAL,
        dest_lng REAL,
        distance_km REAL,
        duration_min INTEGER,
        distance_source TEXT,
        distance_applied INTEGER NOT NULL DEFAULT 0,
        start_odometer_km REAL,
        return_odometer_km REAL,
        notes TEXT NOT NULL DEFAULT '',
        responsible_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        role TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        api_token TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_missions_vehicle ON missions(vehicle_id)",
    "CREATE INDEX IF NOT EXISTS idx_missions_departure ON missions(departure_date)",
    "CREATE INDEX IF NOT EXISTS idx_missions_status ON missions(status)",
];

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `url`, e.g.
    /// `sqlite://autoparc.db`.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        info!("Opened SQLite storage at {}", url);

        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// every connection to `:memory:` sees its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA.iter().copied() {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn parse_id<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T> {
        let raw: String = row.try_get(column)?;
        raw.parse().map_err(|_| StorageError::Corrupt {
            id: raw.clone(),
            reason: format!("invalid {column}"),
        })
    }

    fn parse_enum<T>(row: &SqliteRow, column: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw: String = row.try_get(column)?;
        raw.parse().map_err(|e: T::Err| StorageError::Corrupt {
            id: Self::row_id(row),
            reason: e.to_string(),
        })
    }

    fn row_id(row: &SqliteRow) -> String {
        row.try_get("id").unwrap_or_default()
    }

    fn small_int<T: TryFrom<i64>>(row: &SqliteRow, column: &str) -> Result<Option<T>> {
        let raw: Option<i64> = row.try_get(column)?;
        raw.map(|v| {
            T::try_from(v).map_err(|_| StorageError::Corrupt {
                id: Self::row_id(row),
                reason: format!("{column} out of range: {v}"),
            })
        })
        .transpose()
    }

    fn coordinates(row: &SqliteRow, lat: &str, lng: &str) -> Result<Option<Coordinates>> {
        let lat: Option<f64> = row.try_get(lat)?;
        let lng: Option<f64> = row.try_get(lng)?;
        Ok(match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        })
    }

    fn vehicle_from_row(row: &SqliteRow) -> Result<Vehicle> {
        let transmission: Option<String> = row.try_get("transmission")?;
        Ok(Vehicle {
            id: Self::parse_id(row, "id")?,
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            model: row.try_get("model")?,
            registration: row.try_get("registration")?,
            first_registration: row.try_get("first_registration")?,
            fuel: Self::parse_enum(row, "fuel")?,
            transmission: transmission
                .map(|t| t.parse::<Transmission>())
                .transpose()
                .map_err(|e| StorageError::Corrupt {
                    id: Self::row_id(row),
                    reason: e.to_string(),
                })?,
            doors: Self::small_int(row, "doors")?,
            condition: Self::parse_enum(row, "condition")?,
            fiscal_power: Self::small_int(row, "fiscal_power")?,
            tank_capacity_l: row.try_get("tank_capacity_l")?,
            odometer_km: row.try_get("odometer_km")?,
            consumption_l_per_100km: row.try_get("consumption_l_per_100km")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn driver_from_row(row: &SqliteRow) -> Result<Driver> {
        Ok(Driver {
            id: Self::parse_id(row, "id")?,
            last_name: row.try_get("last_name")?,
            first_name: row.try_get("first_name")?,
            license_number: row.try_get("license_number")?,
            license_category: row.try_get("license_category")?,
            license_expiry: row.try_get("license_expiry")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            birth_date: row.try_get("birth_date")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn mission_from_row(row: &SqliteRow) -> Result<Mission> {
        let driver_id: Option<String> = row.try_get("driver_id")?;
        let driver_id = driver_id
            .map(|raw| {
                raw.parse::<DriverId>().map_err(|_| StorageError::Corrupt {
                    id: Self::row_id(row),
                    reason: format!("invalid driver_id {raw}"),
                })
            })
            .transpose()?;
        let source: Option<String> = row.try_get("distance_source")?;
        let distance_source = source
            .map(|raw| match raw.as_str() {
                "explicit" => Ok(DistanceSource::Explicit),
                "routing" => Ok(DistanceSource::Routing),
                "great_circle" => Ok(DistanceSource::GreatCircle),
                other => Err(StorageError::Corrupt {
                    id: Self::row_id(row),
                    reason: format!("unknown distance source {other}"),
                }),
            })
            .transpose()?;

        Ok(Mission {
            id: Self::parse_id(row, "id")?,
            vehicle_id: Self::parse_id(row, "vehicle_id")?,
            driver_id,
            purpose: row.try_get("purpose")?,
            destination: row.try_get("destination")?,
            departure_date: row.try_get("departure_date")?,
            return_date: row.try_get("return_date")?,
            personnel: row.try_get("personnel")?,
            status: Self::parse_enum::<MissionStatus>(row, "status")?,
            origin: Self::coordinates(row, "origin_lat", "origin_lng")?,
            destination_coords: Self::coordinates(row, "dest_lat", "dest_lng")?,
            distance_km: row.try_get("distance_km")?,
            duration_min: Self::small_int(row, "duration_min")?,
            distance_source,
            distance_applied: row.try_get("distance_applied")?,
            start_odometer_km: row.try_get("start_odometer_km")?,
            return_odometer_km: row.try_get("return_odometer_km")?,
            notes: row.try_get("notes")?,
            responsible_id: Self::parse_id(row, "responsible_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn user_from_row(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: Self::parse_id(row, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: Self::parse_enum(row, "role")?,
            active: row.try_get("active")?,
            api_token: row.try_get("api_token")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn distance_source_str(source: DistanceSource) -> &'static str {
    match source {
        DistanceSource::Explicit => "explicit",
        DistanceSource::Routing => "routing",
        DistanceSource::GreatCircle => "great_circle",
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    // === Vehicle operations ===

    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        sqlx::query(
            "INSERT INTO vehicles (id, name, brand, model, registration, first_registration, fuel,
                transmission, doors, condition, fiscal_power, tank_capacity_l, odometer_km,
                consumption_l_per_100km, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand,
                model = excluded.model,
                registration = excluded.registration,
                first_registration = excluded.first_registration,
                fuel = excluded.fuel,
                transmission = excluded.transmission,
                doors = excluded.doors,
                condition = excluded.condition,
                fiscal_power = excluded.fiscal_power,
                tank_capacity_l = excluded.tank_capacity_l,
                odometer_km = excluded.odometer_km,
                consumption_l_per_100km = excluded.consumption_l_per_100km,
                description = excluded.description,
                updated_at = excluded.updated_at",
        )
        .bind(vehicle.id.to_string())
        .bind(&vehicle.name)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(&vehicle.registration)
        .bind(vehicle.first_registration)
        .bind(vehicle.fuel.as_str())
        .bind(vehicle.transmission.map(|t| t.as_str()))
        .bind(vehicle.doors.map(i64::from))
        .bind(vehicle.condition.as_str())
        .bind(vehicle.fiscal_power.map(i64::from))
        .bind(vehicle.tank_capacity_l)
        .bind(vehicle.odometer_km)
        .bind(vehicle.consumption_l_per_100km)
        .bind(&vehicle.description)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>> {
        let row = sqlx::query("SELECT * FROM vehicles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::vehicle_from_row).transpose()
    }

    async fn find_vehicle_by_registration(&self, registration: &str) -> Result<Option<Vehicle>> {
        let row = sqlx::query("SELECT * FROM vehicles WHERE registration = ?")
            .bind(registration)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::vehicle_from_row).transpose()
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let rows = sqlx::query("SELECT * FROM vehicles ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::vehicle_from_row).collect()
    }

    async fn delete_vehicle(&self, id: VehicleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Driver operations ===

    async fn save_driver(&self, driver: &Driver) -> Result<()> {
        sqlx::query(
            "INSERT INTO drivers (id, last_name, first_name, license_number, license_category,
                license_expiry, phone, email, address, birth_date, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                last_name = excluded.last_name,
                first_name = excluded.first_name,
                license_number = excluded.license_number,
                license_category = excluded.license_category,
                license_expiry = excluded.license_expiry,
                phone = excluded.phone,
                email = excluded.email,
                address = excluded.address,
                birth_date = excluded.birth_date,
                active = excluded.active,
                updated_at = excluded.updated_at",
        )
        .bind(driver.id.to_string())
        .bind(&driver.last_name)
        .bind(&driver.first_name)
        .bind(&driver.license_number)
        .bind(&driver.license_category)
        .bind(driver.license_expiry)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.address)
        .bind(driver.birth_date)
        .bind(driver.active)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_driver(&self, id: DriverId) -> Result<Option<Driver>> {
        let row = sqlx::query("SELECT * FROM drivers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::driver_from_row).transpose()
    }

    async fn find_driver_by_license(&self, license_number: &str) -> Result<Option<Driver>> {
        let row = sqlx::query("SELECT * FROM drivers WHERE license_number = ?")
            .bind(license_number)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::driver_from_row).transpose()
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>> {
        let rows = sqlx::query("SELECT * FROM drivers ORDER BY last_name ASC, first_name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::driver_from_row).collect()
    }

    async fn delete_driver(&self, id: DriverId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Mission operations ===

    async fn save_mission(&self, mission: &Mission) -> Result<()> {
        // distance_applied is only written on insert
        sqlx::query(
            "INSERT INTO missions (id, vehicle_id, driver_id, purpose, destination, departure_date,
                return_date, personnel, status, origin_lat, origin_lng, dest_lat, dest_lng,
                distance_km, duration_min, distance_source, distance_applied, start_odometer_km,
                return_odometer_km, notes, responsible_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                vehicle_id = excluded.vehicle_id,
                driver_id = excluded.driver_id,
                purpose = excluded.purpose,
                destination = excluded.destination,
                departure_date = excluded.departure_date,
                return_date = excluded.return_date,
                personnel = excluded.personnel,
                status = excluded.status,
                origin_lat = excluded.origin_lat,
                origin_lng = excluded.origin_lng,
                dest_lat = excluded.dest_lat,
                dest_lng = excluded.dest_lng,
                distance_km = excluded.distance_km,
                duration_min = excluded.duration_min,
                distance_source = excluded.distance_source,
                start_odometer_km = excluded.start_odometer_km,
                return_odometer_km = excluded.return_odometer_km,
                notes = excluded.notes,
                responsible_id = excluded.responsible_id,
                updated_at = excluded.updated_at",
        )
        .bind(mission.id.to_string())
        .bind(mission.vehicle_id.to_string())
        .bind(mission.driver_id.map(|d| d.to_string()))
        .bind(&mission.purpose)
        .bind(&mission.destination)
        .bind(mission.departure_date)
        .bind(mission.return_date)
        .bind(&mission.personnel)
        .bind(mission.status.as_str())
        .bind(mission.origin.map(|c| c.lat))
        .bind(mission.origin.map(|c| c.lng))
        .bind(mission.destination_coords.map(|c| c.lat))
        .bind(mission.destination_coords.map(|c| c.lng))
        .bind(mission.distance_km)
        .bind(mission.duration_min.map(i64::from))
        .bind(mission.distance_source.map(distance_source_str))
        .bind(mission.distance_applied)
        .bind(mission.start_odometer_km)
        .bind(mission.return_odometer_km)
        .bind(&mission.notes)
        .bind(mission.responsible_id.to_string())
        .bind(mission.created_at)
        .bind(mission.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_mission(&self, id: MissionId) -> Result<Option<Mission>> {
        let row = sqlx::query("SELECT * FROM missions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::mission_from_row).transpose()
    }

    async fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>> {
        let rows = sqlx::query(
            "SELECT * FROM missions
            WHERE (? IS NULL OR status = ?) AND (? IS NULL OR vehicle_id = ?)
            ORDER BY departure_date DESC, created_at DESC",
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.vehicle_id.map(|v| v.to_string()))
        .bind(filter.vehicle_id.map(|v| v.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::mission_from_row).collect()
    }

    async fn delete_mission(&self, id: MissionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM missions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_missions_for_vehicle(&self, id: VehicleId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM missions WHERE vehicle_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    async fn count_missions_for_driver(&self, id: DriverId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM missions WHERE driver_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    async fn apply_mission_distance(
        &self,
        mission_id: MissionId,
        vehicle_id: VehicleId,
        distance_km: f64,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            "UPDATE missions SET distance_applied = 1 WHERE id = ? AND distance_applied = 0",
        )
        .bind(mission_id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !flipped {
            tx.rollback().await?;
            debug!("Distance of mission {} already credited", mission_id);
            return Ok(false);
        }

        let credited = sqlx::query(
            "UPDATE vehicles SET odometer_km = ROUND(odometer_km + ?, 2), updated_at = ? WHERE id = ?",
        )
        .bind(distance_km)
        .bind(chrono::Utc::now())
        .bind(vehicle_id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if credited == 0 {
            tx.rollback().await?;
            return Err(StorageError::NotFound(format!("vehicle {vehicle_id}")));
        }

        tx.commit().await?;
        Ok(true)
    }

    // === User operations ===

    async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, active, api_token, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                active = excluded.active,
                api_token = excluded.api_token",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(&user.api_token)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE api_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::user_from_row).collect()
    }

    // === Health ===

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_driver, sample_mission, sample_user, sample_vehicle};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_vehicle_operations() {
        let storage = SqliteStorage::in_memory().await.unwrap();

        let vehicle = sample_vehicle("1234-A-6");
        storage.save_vehicle(&vehicle).await.unwrap();

        let loaded = storage.load_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(loaded.registration, "1234-A-6");
        assert_eq!(loaded.odometer_km, vehicle.odometer_km);
        assert_eq!(loaded.transmission, vehicle.transmission);

        let by_plate = storage.find_vehicle_by_registration("1234-A-6").await.unwrap();
        assert_eq!(by_plate.map(|v| v.id), Some(vehicle.id));

        assert_eq!(storage.list_vehicles().await.unwrap().len(), 1);
        assert!(storage.delete_vehicle(vehicle.id).await.unwrap());
        assert!(!storage.delete_vehicle(vehicle.id).await.unwrap());
        assert!(storage.load_vehicle(vehicle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_driver_operations() {
        let storage = SqliteStorage::in_memory().await.unwrap();

        let mut b = sample_driver("L-2");
        b.last_name = "Bennani".to_string();
        let mut a = sample_driver("L-1");
        a.last_name = "Amrani".to_string();
        storage.save_driver(&b).await.unwrap();
        storage.save_driver(&a).await.unwrap();

        let drivers = storage.list_drivers().await.unwrap();
        assert_eq!(drivers[0].last_name, "Amrani");
        assert_eq!(
            storage.find_driver_by_license("L-2").await.unwrap().map(|d| d.id),
            Some(b.id)
        );
    }

    #[tokio::test]
    async fn test_mission_round_trip_and_filter() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();

        let mut mission = sample_mission(vehicle.id);
        mission.origin = Some(Coordinates::new(34.0371, -4.9979));
        mission.destination_coords = Some(Coordinates::new(33.9716, -6.8498));
        mission.distance_km = Some(170.86);
        mission.distance_source = Some(DistanceSource::GreatCircle);
        storage.save_mission(&mission).await.unwrap();

        let loaded = storage.load_mission(mission.id).await.unwrap().unwrap();
        assert_eq!(loaded.vehicle_id, vehicle.id);
        assert_eq!(loaded.status, MissionStatus::Planned);
        assert_eq!(loaded.origin, mission.origin);
        assert_eq!(loaded.destination_coords, mission.destination_coords);
        assert_eq!(loaded.distance_km, Some(170.86));
        assert_eq!(loaded.distance_source, Some(DistanceSource::GreatCircle));
        assert_eq!(loaded.departure_date, mission.departure_date);
        assert!(!loaded.distance_applied);
        assert_eq!(loaded.start_odometer_km, None);

        let completed = MissionFilter {
            status: Some(MissionStatus::Completed),
            ..Default::default()
        };
        assert!(storage.list_missions(&completed).await.unwrap().is_empty());

        let by_vehicle = MissionFilter {
            vehicle_id: Some(vehicle.id),
            ..Default::default()
        };
        assert_eq!(storage.list_missions(&by_vehicle).await.unwrap().len(), 1);
        assert_eq!(storage.count_missions_for_vehicle(vehicle.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_mission_keeps_applied_flag() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();

        let mut mission = sample_mission(vehicle.id);
        mission.distance_km = Some(50.0);
        storage.save_mission(&mission).await.unwrap();
        assert!(storage
            .apply_mission_distance(mission.id, vehicle.id, 50.0)
            .await
            .unwrap());

        // A stale copy still says false
        mission.notes = "edited".to_string();
        storage.save_mission(&mission).await.unwrap();

        let loaded = storage.load_mission(mission.id).await.unwrap().unwrap();
        assert!(loaded.distance_applied);
        assert_eq!(loaded.notes, "edited");
    }

    #[tokio::test]
    async fn test_apply_distance_once() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();
        let mission = sample_mission(vehicle.id);
        storage.save_mission(&mission).await.unwrap();

        assert!(storage.apply_mission_distance(mission.id, vehicle.id, 50.0).await.unwrap());
        assert!(!storage.apply_mission_distance(mission.id, vehicle.id, 50.0).await.unwrap());

        let loaded = storage.load_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(loaded.odometer_km, vehicle.odometer_km + 50.0);
    }

    #[tokio::test]
    async fn test_odometer_readings_round_trip() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();

        let mut mission = sample_mission(vehicle.id);
        mission.start_odometer_km = Some(12000.0);
        mission.return_odometer_km = Some(12171.5);
        storage.save_mission(&mission).await.unwrap();

        let loaded = storage.load_mission(mission.id).await.unwrap().unwrap();
        assert_eq!(loaded.start_odometer_km, Some(12000.0));
        assert_eq!(loaded.return_odometer_km, Some(12171.5));
        assert_eq!(loaded.travelled_km(), Some(171.5));
    }

    #[tokio::test]
    async fn test_apply_distance_rounds_odometer() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let mut vehicle = sample_vehicle("1-A-1");
        vehicle.odometer_km = 1000.1;
        storage.save_vehicle(&vehicle).await.unwrap();
        let mission = sample_mission(vehicle.id);
        storage.save_mission(&mission).await.unwrap();

        assert!(storage.apply_mission_distance(mission.id, vehicle.id, 170.86).await.unwrap());

        let loaded = storage.load_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(loaded.odometer_km, 1170.96);
    }

    #[tokio::test]
    async fn test_concurrent_apply_credits_once() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();
        let mission = sample_mission(vehicle.id);
        storage.save_mission(&mission).await.unwrap();

        let (a, b) = tokio::join!(
            storage.apply_mission_distance(mission.id, vehicle.id, 50.0),
            storage.apply_mission_distance(mission.id, vehicle.id, 50.0),
        );
        assert_eq!([a.unwrap(), b.unwrap()].iter().filter(|x| **x).count(), 1);

        let loaded = storage.load_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(loaded.odometer_km, vehicle.odometer_km + 50.0);
    }

    #[tokio::test]
    async fn test_apply_distance_missing_vehicle_rolls_back() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let vehicle = sample_vehicle("1-A-1");
        storage.save_vehicle(&vehicle).await.unwrap();
        let mission = sample_mission(vehicle.id);
        storage.save_mission(&mission).await.unwrap();

        let err = storage
            .apply_mission_distance(mission.id, VehicleId::new(), 10.0)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        let loaded = storage.load_mission(mission.id).await.unwrap().unwrap();
        assert!(!loaded.distance_applied);
    }

    #[tokio::test]
    async fn test_user_token_lookup() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let user = sample_user("tok-1");
        storage.save_user(&user).await.unwrap();

        let found = storage.find_user_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(storage.find_user_by_token("nope").await.unwrap().is_none());
        assert!(storage.health_check().await);
    }
}
