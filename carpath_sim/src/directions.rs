//! Synthetic directions service with fault injection.
//!
//! Routes are straight-line interpolations between origin and destination
//! with seeded lateral jitter on the interior points, so a run is
//! reproducible from its seed.

use async_trait::async_trait;
use carpath_core::geodesy::{interpolate, path_length_meters};
use carpath_env::{Coordinate, DirectionsRequest, DirectionsService, EnvError, Route};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Mutex;
use std::time::Duration;

/// Meters per degree of latitude (mean).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Speed used to derive the travel time estimate (50 km/h).
const CRUISE_SPEED_MPS: f64 = 13.9;

/// How the next lookups should behave.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectionsFault {
    /// Answer normally
    None,
    /// Answer with zero candidates
    Empty,
    /// Fail with the given message
    Fail(String),
}

/// Directions service producing deterministic synthetic routes.
pub struct SimDirectionsService {
    /// RNG for route jitter
    rng: Mutex<ChaCha8Rng>,

    /// Points per generated route (minimum 2)
    route_points: Mutex<usize>,

    /// Lateral jitter standard deviation in meters
    jitter_meters: f64,

    /// Candidates returned per successful lookup
    alternatives: usize,

    /// Injected fault for subsequent lookups
    fault: Mutex<DirectionsFault>,

    /// Lookups served so far
    requests: Mutex<u64>,
}

impl SimDirectionsService {
    /// Creates a service generating `route_points`-point routes.
    pub fn new(seed: u64, route_points: usize, jitter_meters: f64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            route_points: Mutex::new(route_points.max(2)),
            jitter_meters: jitter_meters.max(0.0),
            alternatives: 1,
            fault: Mutex::new(DirectionsFault::None),
            requests: Mutex::new(0),
        }
    }

    /// Returns `count` candidates per lookup instead of one.
    pub fn with_alternatives(mut self, count: usize) -> Self {
        self.alternatives = count.max(1);
        self
    }

    /// Injects a fault for subsequent lookups.
    pub fn set_fault(&self, fault: DirectionsFault) {
        *self.fault.lock().unwrap() = fault;
    }

    /// Changes the size of routes generated from now on.
    pub fn set_route_points(&self, points: usize) {
        *self.route_points.lock().unwrap() = points.max(2);
    }

    /// Number of lookups served.
    pub fn request_count(&self) -> u64 {
        *self.requests.lock().unwrap()
    }

    fn generate(&self, request: &DirectionsRequest) -> Result<Route, EnvError> {
        let n = *self.route_points.lock().unwrap();
        let noise = Normal::new(0.0, self.jitter_meters / METERS_PER_DEGREE)
            .map_err(|e| EnvError::directions(e.to_string()))?;
        let mut rng = self.rng.lock().unwrap();

        let points: Vec<Coordinate> = (0..n)
            .map(|i| {
                let fraction = i as f64 / (n - 1) as f64;
                let base = interpolate(request.origin, request.destination, fraction);
                if i == 0 || i == n - 1 {
                    base
                } else {
                    Coordinate::new(
                        base.latitude + noise.sample(&mut *rng),
                        base.longitude + noise.sample(&mut *rng),
                    )
                }
            })
            .collect();

        let distance = path_length_meters(&points);
        let route = Route::new(points)
            .ok_or_else(|| EnvError::directions("generated an empty route"))?
            .with_metadata(distance, Duration::from_secs_f64(distance / CRUISE_SPEED_MPS));
        Ok(route)
    }
}

#[async_trait]
impl DirectionsService for SimDirectionsService {
    async fn calculate(&self, request: &DirectionsRequest) -> Result<Vec<Route>, EnvError> {
        *self.requests.lock().unwrap() += 1;

        let fault = self.fault.lock().unwrap().clone();
        match fault {
            DirectionsFault::None => {}
            DirectionsFault::Empty => return Ok(Vec::new()),
            DirectionsFault::Fail(msg) => return Err(EnvError::directions(msg)),
        }

        (0..self.alternatives).map(|_| self.generate(request)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn request() -> DirectionsRequest {
        DirectionsRequest::driving(Coordinate::new(37.3349, -122.0090), Coordinate::new(37.3230, -122.0322))
    }

    #[tokio::test]
    async fn test_route_spans_origin_to_destination() {
        let service = SimDirectionsService::new(42, 20, 5.0);
        let routes = service.calculate(&request()).await.unwrap();

        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.len(), 20);
        assert_eq!(route.first(), request().origin);
        assert_eq!(route.last(), request().destination);
        assert!(route.distance_meters > 2000.0);
        assert_relative_eq!(
            route.expected_travel_time.as_secs_f64(),
            route.distance_meters / CRUISE_SPEED_MPS,
            epsilon = 1e-6
        );
    }

    #[tokio::test]
    async fn test_same_seed_same_route() {
        let a = SimDirectionsService::new(7, 10, 15.0);
        let b = SimDirectionsService::new(7, 10, 15.0);

        assert_eq!(
            a.calculate(&request()).await.unwrap(),
            b.calculate(&request()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_faults() {
        let service = SimDirectionsService::new(1, 5, 0.0);

        service.set_fault(DirectionsFault::Empty);
        assert!(service.calculate(&request()).await.unwrap().is_empty());

        service.set_fault(DirectionsFault::Fail("offline".into()));
        assert_eq!(
            service.calculate(&request()).await.unwrap_err(),
            EnvError::directions("offline")
        );

        service.set_fault(DirectionsFault::None);
        assert_eq!(service.calculate(&request()).await.unwrap().len(), 1);
        assert_eq!(service.request_count(), 3);
    }

    #[tokio::test]
    async fn test_alternatives_and_minimum_points() {
        let service = SimDirectionsService::new(3, 0, 0.0).with_alternatives(3);
        let routes = service.calculate(&request()).await.unwrap();

        assert_eq!(routes.len(), 3);
        assert!(routes.iter().all(|r| r.len() == 2));
    }
}
