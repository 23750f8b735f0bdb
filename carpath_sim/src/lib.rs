//! carpath Deterministic Simulation Harness
//!
//! Runs the journey logic from `carpath_core` against simulated
//! collaborators so every run is reproducible from a seed.
//!
//! # Core Principle
//!
//! Everything outside the journey owner is scripted:
//! - **Time**: a virtual clock advanced one tick at a time
//! - **Location**: authorization answers and fixes chosen by the scenario
//! - **Directions**: synthetic routes with seeded jitter, latency in ticks, fault injection
//! - **Map**: a headless surface that records every scene
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          SimWorld                            │
//! │  ┌────────────┐    ┌────────────────────┐    ┌────────────┐  │
//! │  │ SimContext │    │ JourneyController  │───►│ Recording  │  │
//! │  │ (v-clock)  │    │ (SimulationState)  │    │ MapSurface │  │
//! │  └────────────┘    └──▲──────────────▲──┘    └────────────┘  │
//! │                       │              │                       │
//! │  ┌────────────────────┴─┐   ┌────────┴──────────────┐        │
//! │  │ SimLocationService   │   │ SimDirectionsService  │        │
//! │  │ (via LocationBridge) │   │ (via RouteProvider)   │        │
//! │  └──────────────────────┘   └───────────────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use carpath_sim::{ScenarioRunner, SimConfig};
//! use carpath_sim::scenarios::ScenarioId;
//!
//! let runner = ScenarioRunner::new(SimConfig { seed: 42, ..Default::default() });
//! let result = runner.run(ScenarioId::NominalDrive);
//! assert!(result.passed);
//! ```

mod context;
mod directions;
mod error;
mod exporter;
mod location;
mod map;
mod runner;
mod world;
pub mod scenarios;

pub use context::SimContext;
pub use directions::{DirectionsFault, SimDirectionsService};
pub use error::SimError;
pub use exporter::{SimEvent, SimExport, SimFrame};
pub use location::SimLocationService;
pub use map::RecordingMapSurface;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld, WorldStats};
