//! Trip distance estimation for Auto Parc missions.
//!
//! A [`DistanceResolver`] tries an explicit value, then a routing
//! [`DistanceProvider`] (Google Distance Matrix in production), then the
//! haversine great-circle distance.

#![warn(missing_docs)]

pub mod google;
pub mod haversine;
pub mod links;
pub mod provider;
pub mod resolver;

pub use google::GoogleDistanceMatrix;
pub use haversine::{haversine_km, EARTH_RADIUS_KM};
pub use links::maps_link;
pub use provider::{DistanceProvider, GeoError};
pub use resolver::{DistanceResolver, ResolvedRoute, RouteRequest};
