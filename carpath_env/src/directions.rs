//! Directions service abstraction for carpath.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EnvError;
use crate::types::{Coordinate, Route, TransportType};

/// A single route lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub transport_type: TransportType,
}

impl DirectionsRequest {
    /// Creates a driving request between two points.
    pub fn driving(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            transport_type: TransportType::Automobile,
        }
    }
}

/// Abstraction for an external directions provider.
///
/// A lookup is a single asynchronous call: no retry, and no timeout other than
/// what the provider applies itself.
#[async_trait]
pub trait DirectionsService: Send + Sync + 'static {
    /// Calculates candidate routes for the request.
    ///
    /// # Returns
    /// * `Ok(routes)` - Zero or more candidates, best first
    /// * `Err(EnvError::DirectionsError)` - The provider failed
    async fn calculate(&self, request: &DirectionsRequest) -> Result<Vec<Route>, EnvError>;
}
