//! Driver model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::DriverId;
use crate::Time;

/// A licensed driver who can be assigned to missions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Unique identifier
    pub id: DriverId,

    /// Family name
    pub last_name: String,

    /// Given name
    pub first_name: String,

    /// Driving licence number, unique
    pub license_number: String,

    /// Licence category (B, C, D...)
    pub license_category: String,

    /// Licence expiry date
    pub license_expiry: NaiveDate,

    /// Phone number
    pub phone: String,

    /// Email address
    pub email: Option<String>,

    /// Postal address
    pub address: Option<String>,

    /// Date of birth
    pub birth_date: Option<NaiveDate>,

    /// Whether the driver can currently be assigned
    pub active: bool,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

/// Number of days ahead a licence counts as expiring soon.
pub const LICENSE_EXPIRY_WARNING_DAYS: i64 = 30;

impl Driver {
    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Licence expired strictly before `today`.
    pub fn license_expired(&self, today: NaiveDate) -> bool {
        self.license_expiry < today
    }

    /// Licence still valid but expiring within the warning window.
    pub fn license_expiring_soon(&self, today: NaiveDate) -> bool {
        let horizon = today + chrono::Duration::days(LICENSE_EXPIRY_WARNING_DAYS);
        self.license_expiry >= today && self.license_expiry <= horizon
    }

    /// Licence standing as of `today`.
    pub fn license_status(&self, today: NaiveDate) -> LicenseStatus {
        if self.license_expired(today) {
            LicenseStatus::Expired
        } else if self.license_expiring_soon(today) {
            LicenseStatus::Expiring
        } else {
            LicenseStatus::Valid
        }
    }

    /// Licence fields with their standing as of `today`.
    pub fn license_check(&self, today: NaiveDate) -> LicenseCheck {
        LicenseCheck {
            license_number: self.license_number.clone(),
            license_category: self.license_category.clone(),
            license_expiry: self.license_expiry,
            status: self.license_status(today),
        }
    }
}

/// Standing of a driving licence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Expiry date is in the past
    Expired,
    /// Expires within the warning window
    Expiring,
    /// Valid beyond the warning window
    Valid,
}

/// A driver's licence and its standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseCheck {
    pub license_number: String,
    pub license_category: String,
    pub license_expiry: NaiveDate,
    pub status: LicenseStatus,
}

/// Driver counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStats {
    /// All drivers
    pub total: usize,
    /// Active drivers
    pub active: usize,
    /// Active drivers whose licence is expired
    pub expired_licenses: usize,
    /// Active drivers whose licence expires within the warning window
    pub expiring_soon: usize,
}

impl DriverStats {
    /// Tally a set of drivers as of `today`.
    pub fn from_drivers(drivers: &[Driver], today: NaiveDate) -> Self {
        let active: Vec<&Driver> = drivers.iter().filter(|d| d.active).collect();
        Self {
            total: drivers.len(),
            active: active.len(),
            expired_licenses: active.iter().filter(|d| d.license_expired(today)).count(),
            expiring_soon: active.iter().filter(|d| d.license_expiring_soon(today)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(expiry: NaiveDate, active: bool) -> Driver {
        let now = chrono::Utc::now();
        Driver {
            id: DriverId::new(),
            last_name: "Alaoui".to_string(),
            first_name: "Youssef".to_string(),
            license_number: format!("L-{}", DriverId::new()),
            license_category: "B".to_string(),
            license_expiry: expiry,
            phone: "0600000000".to_string(),
            email: None,
            address: None,
            birth_date: None,
            active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_license_windows() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let expired = driver(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(), true);
        let soon = driver(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(), true);
        let later = driver(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(), true);

        assert!(expired.license_expired(today));
        assert!(!expired.license_expiring_soon(today));
        assert!(soon.license_expiring_soon(today));
        assert!(!later.license_expiring_soon(today));

        assert_eq!(expired.license_status(today), LicenseStatus::Expired);
        assert_eq!(soon.license_status(today), LicenseStatus::Expiring);
        assert_eq!(later.license_status(today), LicenseStatus::Valid);
        // Expiring today still counts as expiring
        assert_eq!(
            driver(today, true).license_status(today),
            LicenseStatus::Expiring
        );
    }

    #[test]
    fn test_stats_ignore_inactive_for_licences() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let drivers = vec![
            driver(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), true),
            driver(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), false),
            driver(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(), true),
        ];
        let stats = DriverStats::from_drivers(&drivers, today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.expired_licenses, 1);
        assert_eq!(stats.expiring_soon, 1);
        assert_eq!(drivers[0].full_name(), "Youssef Alaoui");
    }
}
