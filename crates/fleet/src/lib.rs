//! Record services for Auto Parc.
//!
//! Validation, referential checks and the mission lifecycle live here, on
//! top of any [`autoparc_storage::Storage`] backend.

#![warn(missing_docs)]

pub mod driver;
pub mod error;
pub mod mission;
pub mod user;
pub mod vehicle;

pub use driver::{DriverRequest, DriverService};
pub use error::{FleetError, Result};
pub use mission::{MissionDetails, MissionRequest, MissionService, DEFAULT_DEPOT};
pub use user::UserService;
pub use vehicle::{VehicleRequest, VehicleService};
