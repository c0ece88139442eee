//! Auto Parc core data models.
//!
//! This crate defines the records of the fleet (vehicles, drivers, missions,
//! users) and the small amount of logic that belongs to them, such as the
//! mission status lifecycle. It performs no I/O.

#![warn(missing_docs)]

// Core identities
mod id;

// Fleet records
mod driver;
mod mission;
mod user;
mod vehicle;

// Geography
mod geo;

// Re-exports
pub use id::*;

pub use driver::{
    Driver, DriverStats, LicenseCheck, LicenseStatus, LICENSE_EXPIRY_WARNING_DAYS,
};
pub use geo::{round_km, Coordinates, DistanceSource, RouteEstimate};
pub use mission::{Mission, MissionFilter, MissionStats, MissionStatus};
pub use user::{User, UserRole};
pub use vehicle::{FuelType, MechanicalCondition, Transmission, Vehicle, VehicleStats};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// A string did not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
