//! Three-tier distance resolution.

use std::sync::Arc;

use autoparc_core::{round_km, Coordinates, DistanceSource};
use tracing::{debug, warn};

use crate::haversine::haversine_km;
use crate::provider::DistanceProvider;

/// What the caller knows about a route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteRequest {
    /// Caller-supplied distance in km
    pub distance_km: Option<f64>,

    /// Caller-supplied duration in minutes
    pub duration_min: Option<u32>,

    /// Start point
    pub origin: Option<Coordinates>,

    /// End point
    pub destination: Option<Coordinates>,
}

/// A resolved distance and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRoute {
    /// Distance in km, two decimals
    pub distance_km: f64,

    /// Duration in minutes, when known
    pub duration_min: Option<u32>,

    /// Tier that produced the distance
    pub source: DistanceSource,
}

/// Resolves a trip distance: explicit value first, then the routing
/// provider, then the haversine estimate. Provider failures never reach the
/// caller.
#[derive(Clone, Default)]
pub struct DistanceResolver {
    provider: Option<Arc<dyn DistanceProvider>>,
}

impl DistanceResolver {
    /// Resolver backed by a routing provider.
    pub fn new(provider: Arc<dyn DistanceProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Resolver that only uses explicit values and the haversine estimate.
    pub fn offline() -> Self {
        Self { provider: None }
    }

    /// Resolve a route. Returns `None` when no distance is supplied and one of
    /// the two points is unknown.
    pub async fn resolve(&self, request: &RouteRequest) -> Option<ResolvedRoute> {
        if let Some(distance) = request.distance_km {
            return Some(ResolvedRoute {
                distance_km: round_km(distance),
                duration_min: request.duration_min,
                source: DistanceSource::Explicit,
            });
        }

        let (origin, destination) = (request.origin?, request.destination?);

        if let Some(provider) = &self.provider {
            match provider.route(origin, destination).await {
                Ok(estimate) => {
                    debug!(
                        "{} resolved {} -> {}: {} km",
                        provider.name(),
                        origin,
                        destination,
                        estimate.distance_km
                    );
                    return Some(ResolvedRoute {
                        distance_km: round_km(estimate.distance_km),
                        duration_min: request.duration_min.or(estimate.duration_min),
                        source: DistanceSource::Routing,
                    });
                }
                Err(e) => {
                    warn!(
                        "{} unavailable ({}), using great-circle distance",
                        provider.name(),
                        e
                    );
                }
            }
        }

        Some(ResolvedRoute {
            distance_km: haversine_km(origin, destination),
            duration_min: request.duration_min,
            source: DistanceSource::GreatCircle,
        })
    }
}
