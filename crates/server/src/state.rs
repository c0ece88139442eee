//! Shared handler state.

use std::sync::Arc;

use autoparc_core::Coordinates;
use autoparc_fleet::{DriverService, MissionService, UserService, VehicleService};
use autoparc_geo::{DistanceResolver, GoogleDistanceMatrix};
use autoparc_storage::Storage;
use tracing::info;

use crate::config::Config;

/// Services shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backend, for health checks
    pub storage: Arc<dyn Storage>,
    /// Missions
    pub missions: MissionService,
    /// Vehicles
    pub vehicles: VehicleService,
    /// Drivers
    pub drivers: DriverService,
    /// Users and tokens
    pub users: UserService,
}

impl AppState {
    /// Wire services over `storage`.
    pub fn new(storage: Arc<dyn Storage>, resolver: DistanceResolver, depot: Coordinates) -> Self {
        Self {
            missions: MissionService::new(storage.clone(), resolver).with_depot(depot),
            vehicles: VehicleService::new(storage.clone()),
            drivers: DriverService::new(storage.clone()),
            users: UserService::new(storage.clone()),
            storage,
        }
    }

    /// Wire services the way `config` asks.
    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        let resolver = match &config.google_maps_api_key {
            Some(key) => {
                let client = GoogleDistanceMatrix::new(Some(key.clone()))
                    .with_base_url(config.maps_base_url.clone());
                DistanceResolver::new(Arc::new(client))
            }
            None => {
                info!("GOOGLE_MAPS_API_KEY not set, mission distances use the great-circle estimate");
                DistanceResolver::offline()
            }
        };
        Self::new(storage, resolver, config.depot)
    }
}
