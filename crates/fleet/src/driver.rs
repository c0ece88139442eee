//! Driver records.

use std::sync::Arc;

use autoparc_core::{Driver, DriverId, DriverStats, LicenseCheck};
use autoparc_storage::Storage;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::{optional_text, required, required_text, FleetError, Result};

/// Body of a driver create or update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverRequest {
    /// Family name
    pub last_name: Option<String>,
    /// Given name
    pub first_name: Option<String>,
    /// Licence number
    pub license_number: Option<String>,
    /// Licence category
    pub license_category: Option<String>,
    /// Licence expiry date
    pub license_expiry: Option<NaiveDate>,
    /// Phone number
    pub phone: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Active flag, true when absent on create
    pub active: Option<bool>,
}

/// Driver CRUD and statistics.
#[derive(Clone)]
pub struct DriverService {
    storage: Arc<dyn Storage>,
}

impl DriverService {
    /// Create a service over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn build(request: DriverRequest, base: Option<Driver>) -> Result<Driver> {
        let last_name = required_text(request.last_name.as_deref(), "last_name")?;
        let first_name = required_text(request.first_name.as_deref(), "first_name")?;
        let license_number = required_text(request.license_number.as_deref(), "license_number")?;
        let license_category =
            required_text(request.license_category.as_deref(), "license_category")?;
        let license_expiry = required(request.license_expiry, "license_expiry")?;
        let phone = required_text(request.phone.as_deref(), "phone")?;

        let now = chrono::Utc::now();
        let (id, created_at, active) = match &base {
            Some(b) => (b.id, b.created_at, request.active.unwrap_or(b.active)),
            None => (DriverId::new(), now, request.active.unwrap_or(true)),
        };

        Ok(Driver {
            id,
            last_name,
            first_name,
            license_number,
            license_category,
            license_expiry,
            phone,
            email: optional_text(request.email),
            address: optional_text(request.address),
            birth_date: request.birth_date,
            active,
            created_at,
            updated_at: now,
        })
    }

    /// Register a driver.
    pub async fn create(&self, request: DriverRequest) -> Result<Driver> {
        let driver = Self::build(request, None)?;
        self.ensure_unique_license(&driver.license_number, None)
            .await?;

        self.storage.save_driver(&driver).await?;
        info!("Created driver {} ({})", driver.id, driver.full_name());
        Ok(driver)
    }

    /// Replace a driver's attributes.
    pub async fn update(&self, id: DriverId, request: DriverRequest) -> Result<Driver> {
        let existing = self.get(id).await?;
        let driver = Self::build(request, Some(existing))?;
        self.ensure_unique_license(&driver.license_number, Some(id))
            .await?;

        self.storage.save_driver(&driver).await?;
        info!("Updated driver {}", driver.id);
        Ok(driver)
    }

    /// Load one driver.
    pub async fn get(&self, id: DriverId) -> Result<Driver> {
        self.storage
            .load_driver(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("driver {id}")))
    }

    /// Licence details of one driver as of today.
    pub async fn license(&self, id: DriverId) -> Result<LicenseCheck> {
        self.license_on(id, chrono::Utc::now().date_naive()).await
    }

    /// Licence details of one driver as of `today`.
    pub async fn license_on(&self, id: DriverId, today: NaiveDate) -> Result<LicenseCheck> {
        Ok(self.get(id).await?.license_check(today))
    }

    /// All drivers by name.
    pub async fn list(&self) -> Result<Vec<Driver>> {
        Ok(self.storage.list_drivers().await?)
    }

    /// Active drivers by name.
    pub async fn list_active(&self) -> Result<Vec<Driver>> {
        let mut drivers = self.storage.list_drivers().await?;
        drivers.retain(|d| d.active);
        Ok(drivers)
    }

    /// Delete a driver that no mission references.
    pub async fn delete(&self, id: DriverId) -> Result<()> {
        let missions = self.storage.count_missions_for_driver(id).await?;
        if missions > 0 {
            return Err(FleetError::Conflict(format!(
                "driver {id} is assigned to {missions} mission(s)"
            )));
        }
        if !self.storage.delete_driver(id).await? {
            return Err(FleetError::NotFound(format!("driver {id}")));
        }
        info!("Deleted driver {}", id);
        Ok(())
    }

    /// Driver counters as of today.
    pub async fn stats(&self) -> Result<DriverStats> {
        self.stats_on(chrono::Utc::now().date_naive()).await
    }

    /// Driver counters as of `today`.
    pub async fn stats_on(&self, today: NaiveDate) -> Result<DriverStats> {
        let drivers = self.storage.list_drivers().await?;
        Ok(DriverStats::from_drivers(&drivers, today))
    }

    async fn ensure_unique_license(
        &self,
        license_number: &str,
        current: Option<DriverId>,
    ) -> Result<()> {
        match self.storage.find_driver_by_license(license_number).await? {
            Some(other) if Some(other.id) != current => Err(FleetError::Conflict(format!(
                "license number {license_number} is already used"
            ))),
            _ => Ok(()),
        }
    }
}
