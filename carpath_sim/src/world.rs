//! SimWorld - The simulation harness container.

use crate::context::SimContext;
use crate::directions::SimDirectionsService;
use crate::error::SimError;
use crate::location::SimLocationService;
use crate::map::RecordingMapSurface;

use carpath_core::{
    JourneyConfig, JourneyController, JourneyError, JourneyEvent, LocationBridge, RouteError,
    RouteProvider, RouteRequest,
};
use carpath_env::{DriveContext, EnvError, LocationUpdate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Yields granted to spawned relay tasks before draining events.
const SETTLE_YIELDS: usize = 4;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Maximum simulated duration in seconds
    pub duration_secs: f64,

    /// Points per synthetic route
    pub route_points: usize,

    /// Lateral jitter of interior route points (meters, std dev)
    pub jitter_meters: f64,

    /// Ticks between a "Start Journey" and its route arriving
    pub directions_latency_ticks: u64,

    /// Candidate routes offered per lookup; the journey takes the first
    pub route_alternatives: usize,

    /// Journey under test
    pub journey: JourneyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_secs: 30.0,
            route_points: 12,
            jitter_meters: 15.0,
            directions_latency_ticks: 1,
            route_alternatives: 2,
            journey: JourneyConfig::default(),
        }
    }
}

impl SimConfig {
    /// Loads a config from a JSON file; absent fields use defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Number of ticks that fit into `duration_secs`.
    pub fn total_ticks(&self) -> u64 {
        let tick_secs = self.journey.tick_interval().as_secs_f64();
        if tick_secs <= 0.0 {
            return 0;
        }
        (self.duration_secs / tick_secs).floor() as u64
    }
}

/// Counters and observations gathered while the world runs.
#[derive(Debug, Clone, Default)]
pub struct WorldStats {
    pub ticks: u64,
    pub ticks_advanced: u64,
    pub location_updates: u64,
    pub location_errors: Vec<EnvError>,
    pub route_errors: Vec<RouteError>,
    pub routes_loaded: u64,

    /// Ticks where the vehicle was not on its route point
    pub off_route_ticks: u64,

    /// Headings outside `[0, 360)`
    pub bad_headings: u64,
}

/// A route lookup waiting for its simulated latency to elapse.
#[derive(Debug, Clone, Copy)]
struct PendingFetch {
    request: RouteRequest,
    ready_at_tick: u64,
}

/// The SimWorld - container for the entire simulation.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Shared simulation context (virtual clock)
    pub context: Arc<SimContext>,

    /// Scripted device location
    pub location: Arc<SimLocationService>,

    /// Synthetic directions provider
    pub directions: Arc<SimDirectionsService>,

    /// Headless map
    pub map: Arc<RecordingMapSurface>,

    controller: JourneyController<RecordingMapSurface>,
    provider: RouteProvider<SimDirectionsService>,
    events_tx: mpsc::Sender<JourneyEvent>,
    events_rx: mpsc::Receiver<JourneyEvent>,
    pending: Vec<PendingFetch>,
    stats: WorldStats,
}

impl SimWorld {
    /// Creates a world whose user grants location access.
    pub fn new(config: SimConfig) -> Self {
        Self::with_location(config, SimLocationService::granting())
    }

    /// Creates a world with a specific location script.
    pub fn with_location(config: SimConfig, location: SimLocationService) -> Self {
        // Separate seeds so route shape does not depend on journey numbering
        let context_seed = config.seed;
        let route_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);

        let context = SimContext::shared(context_seed);
        let directions = Arc::new(SimDirectionsService::new(
            route_seed,
            config.route_points,
            config.jitter_meters,
        )
        .with_alternatives(config.route_alternatives));
        let map = Arc::new(RecordingMapSurface::new());
        let controller =
            JourneyController::new(config.journey.clone(), map.clone()).with_seeded_ids(context_seed);
        let provider = RouteProvider::new(directions.clone())
            .with_transport_type(config.journey.transport_type);
        let (events_tx, events_rx) = mpsc::channel(1024);

        Self {
            config,
            context,
            location: Arc::new(location),
            directions,
            map,
            controller,
            provider,
            events_tx,
            events_rx,
            pending: Vec::new(),
            stats: WorldStats::default(),
        }
    }

    /// Runs the location authorization handshake and starts forwarding fixes.
    ///
    /// A refusal is recorded and returned; the journey still works without
    /// device location.
    pub async fn connect_location(&mut self) -> Result<(), EnvError> {
        let bridge = LocationBridge::new(self.location.clone());
        let result = bridge.start(&*self.context, self.events_tx.clone()).await;
        if let Err(e) = &result {
            warn!("Location bridge not started: {}", e);
            self.stats.location_errors.push(e.clone());
        }
        result
    }

    /// "Start Journey" with the configured directions latency.
    pub fn press_start(&mut self) -> RouteRequest {
        self.press_start_with_latency(self.config.directions_latency_ticks)
    }

    /// "Start Journey" whose route arrives `latency_ticks` ticks from now.
    pub fn press_start_with_latency(&mut self, latency_ticks: u64) -> RouteRequest {
        let request = self.controller.start_journey();
        self.pending.push(PendingFetch {
            request,
            ready_at_tick: self.stats.ticks + latency_ticks,
        });
        request
    }

    /// Pushes a device fix at the current virtual time.
    pub fn push_device_fix(&self, coordinate: carpath_env::Coordinate) -> bool {
        self.location
            .push_fix(LocationUpdate::new(coordinate, self.context.system_time()))
    }

    /// Advances the world by one tick.
    ///
    /// Order: clock, simulator step, queued location events, due route
    /// lookups. A route that lands this tick is shown at its first point.
    pub async fn tick(&mut self) {
        self.context.advance_time(self.config.journey.tick_interval());
        self.stats.ticks += 1;

        if self.controller.on_tick() {
            self.stats.ticks_advanced += 1;
        }

        self.drain_events().await;
        self.complete_due_fetches().await;
        self.check_invariants();
    }

    async fn drain_events(&mut self) {
        for _ in 0..SETTLE_YIELDS {
            tokio::task::yield_now().await;
        }

        while let Ok(event) = self.events_rx.try_recv() {
            if let JourneyEvent::Location(Ok(_)) = &event {
                self.stats.location_updates += 1;
            }
            match self.controller.apply(event) {
                Ok(_) => {}
                Err(JourneyError::Location(e)) => {
                    warn!("Location error: {}", e);
                    self.stats.location_errors.push(e);
                }
                Err(e) => warn!("{}", e),
            }
        }
    }

    async fn complete_due_fetches(&mut self) {
        let now = self.stats.ticks;
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.ready_at_tick <= now);
        self.pending = waiting;

        for fetch in due {
            let request = fetch.request;
            let result = self
                .provider
                .fetch_route(request.origin, request.destination)
                .await;

            match self.controller.on_route_fetched(request.journey, result) {
                Ok(true) => self.stats.routes_loaded += 1,
                Ok(false) => debug!("Journey {} superseded", request.journey),
                Err(JourneyError::Route { source, .. }) => {
                    warn!("Journey {} never started: {}", request.journey, source);
                    self.stats.route_errors.push(source);
                }
                Err(e) => warn!("{}", e),
            }
        }
    }

    fn check_invariants(&mut self) {
        let state = self.controller.state();
        let Some(route) = state.route() else {
            return;
        };

        if state.current_coordinate() != route.get(state.current_index()) {
            self.stats.off_route_ticks += 1;
        }
        if let Some(heading) = state.heading() {
            if !(0.0..360.0).contains(&heading) {
                self.stats.bad_headings += 1;
            }
        }
    }

    /// Returns the current simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.context.now().as_secs_f64()
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.stats.ticks
    }

    pub fn controller(&self) -> &JourneyController<RecordingMapSurface> {
        &self.controller
    }

    pub fn stats(&self) -> &WorldStats {
        &self.stats
    }

    /// Lookups still waiting on simulated latency.
    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }
}
