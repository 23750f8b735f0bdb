//! Route provider - one driving-directions lookup per journey.

use std::sync::Arc;

use carpath_env::{Coordinate, DirectionsRequest, DirectionsService, EnvError, Route, TransportType};
use thiserror::Error;
use tracing::debug;

/// Why a journey's route could not be obtained.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// The service answered but offered no candidate
    #[error("directions service returned no routes")]
    NoRoutes,

    /// The service call itself failed
    #[error(transparent)]
    Directions(#[from] EnvError),
}

/// Fetches routes from a [`DirectionsService`].
///
/// Single call, first candidate wins, no retry.
pub struct RouteProvider<D: DirectionsService> {
    directions: Arc<D>,
    transport_type: TransportType,
}

impl<D: DirectionsService> RouteProvider<D> {
    pub fn new(directions: Arc<D>) -> Self {
        Self {
            directions,
            transport_type: TransportType::Automobile,
        }
    }

    /// Sets the travel mode sent with every lookup.
    pub fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = transport_type;
        self
    }

    /// Requests a route and selects the first candidate.
    pub async fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, RouteError> {
        let request = DirectionsRequest {
            origin,
            destination,
            transport_type: self.transport_type,
        };

        let candidates = self.directions.calculate(&request).await?;
        debug!("Directions returned {} candidate(s)", candidates.len());

        candidates.into_iter().next().ok_or(RouteError::NoRoutes)
    }
}

impl<D: DirectionsService> Clone for RouteProvider<D> {
    fn clone(&self) -> Self {
        Self {
            directions: Arc::clone(&self.directions),
            transport_type: self.transport_type,
        }
    }
}
