//! carpath Core - Route-Following Vehicle Simulation
//!
//! Animates a car marker along a driving route:
//! 1. **Geodesy**: great-circle bearing for marker rotation, haversine lengths, map framing
//! 2. **Simulation**: one route point per tick, terminal at the last point
//! 3. **Routing**: first candidate from the directions service, errors as values
//! 4. **Runtime**: a single owner of state fed by location, timer and route events

pub mod geodesy;
pub mod journey_runtime;
pub mod location_bridge;
pub mod presentation;
pub mod route_provider;
pub mod simulation;

// Re-export key types for convenience
pub use geodesy::{bearing, distance_meters};
pub use journey_runtime::{
    run_journey, JourneyConfig, JourneyController, JourneyError, JourneyEvent, RouteRequest,
};
pub use location_bridge::LocationBridge;
pub use presentation::SceneBuilder;
pub use route_provider::{RouteError, RouteProvider};
pub use simulation::SimulationState;
