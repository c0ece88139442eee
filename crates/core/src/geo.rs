//! Geographic primitives shared by missions and the distance resolver.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coordinates {
    /// Latitude, -90..=90
    pub lat: f64,

    /// Longitude, -180..=180
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Distance and travel time between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    /// Distance in kilometres, two decimals
    pub distance_km: f64,

    /// Travel time in minutes, when known
    pub duration_min: Option<u32>,
}

/// Where a mission's distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    /// Supplied by the caller
    Explicit,
    /// Returned by the external routing service
    Routing,
    /// Straight-line haversine estimate
    GreatCircle,
}

/// Round a kilometre value to two decimals.
pub fn round_km(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
