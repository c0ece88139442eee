//! Routing provider abstraction.

use async_trait::async_trait;
use autoparc_core::{Coordinates, RouteEstimate};

/// Errors a routing provider can report. The resolver never surfaces them to
/// callers; they only decide whether to fall back.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// No API credential configured
    #[error("routing API key not configured")]
    MissingApiKey,

    /// Transport failure
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-OK status
    #[error("routing service returned status {0}")]
    Status(String),

    /// Provider answered with an unexpected body
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

/// A service able to estimate road distance and travel time.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Estimate the route between two points.
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, GeoError>;
}
