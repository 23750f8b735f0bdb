//! Common types for the carpath environment abstraction.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// A geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north
    pub latitude: f64,

    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude/longitude degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// One fix pushed by the location service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationUpdate {
    pub coordinate: Coordinate,
    pub timestamp: SystemTime,
}

impl LocationUpdate {
    pub fn new(coordinate: Coordinate, timestamp: SystemTime) -> Self {
        Self { coordinate, timestamp }
    }
}

/// Travel mode passed to the directions service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    #[default]
    Automobile,
    Walking,
}

/// An ordered, non-empty path of coordinates returned by a directions service.
///
/// Routes are immutable once built: a new journey replaces the whole value.
/// Not `Deserialize`: the only way in is [`Route::new`], which rejects empty paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    points: Vec<Coordinate>,

    /// Total path length reported by the service (meters)
    pub distance_meters: f64,

    /// Travel time estimate reported by the service
    pub expected_travel_time: Duration,
}

impl Route {
    /// Builds a route from its points. Returns `None` for an empty path.
    pub fn new(points: Vec<Coordinate>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self {
            points,
            distance_meters: 0.0,
            expected_travel_time: Duration::ZERO,
        })
    }

    /// Attaches the service-provided distance/time metadata.
    pub fn with_metadata(mut self, distance_meters: f64, expected_travel_time: Duration) -> Self {
        self.distance_meters = distance_meters;
        self.expected_travel_time = expected_travel_time;
        self
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.points.get(index).copied()
    }

    pub fn first(&self) -> Coordinate {
        self.points[0]
    }

    pub fn last(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    pub fn last_index(&self) -> usize {
        self.points.len() - 1
    }
}

/// A map viewport: center plus latitude/longitude span in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub span_lat: f64,
    pub span_lon: f64,
}

impl Region {
    pub fn new(center: Coordinate, span_lat: f64, span_lon: f64) -> Self {
        Self { center, span_lat, span_lon }
    }

    /// True if the coordinate falls inside the viewport.
    pub fn contains(&self, c: Coordinate) -> bool {
        (c.latitude - self.center.latitude).abs() <= self.span_lat / 2.0
            && (c.longitude - self.center.longitude).abs() <= self.span_lon / 2.0
    }
}

/// Identifies one "Start Journey" request.
///
/// Uses UUID v4 for uniqueness; simulation derives ids from a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JourneyId(pub Uuid);

impl JourneyId {
    /// Creates a new random JourneyId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic JourneyId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JourneyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JourneyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 8 chars are enough to tell journeys apart in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}
