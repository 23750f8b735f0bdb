//! Journey Runtime - the single owner of simulation state.
//!
//! This module ties the pure pieces (simulator, route provider, scene
//! projection) to the environment abstraction. Every mutation of
//! [`SimulationState`] goes through [`JourneyController`]; other tasks only
//! talk to it by sending [`JourneyEvent`]s.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐  Location   ┌───────────────────────────┐  MapScene  ┌────────────┐
//!  │ LocationBridge├───────────►│                           ├───────────►│ MapSurface │
//!  └──────────────┘             │     JourneyController     │            └────────────┘
//!  ┌──────────────┐  Tick       │  (owns SimulationState)   │
//!  │    ticker    ├────────────►│                           │
//!  └──────────────┘             └──────┬────────────▲───────┘
//!  ┌──────────────┐ StartJourney       │ RouteRequest│ RouteFetched
//!  │     user     ├────────────►       ▼             │
//!  └──────────────┘             ┌──────────────────────────┐
//!                               │  RouteProvider (spawned) │
//!                               └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let ctx = TokioContext::shared();
//! let controller = JourneyController::new(JourneyConfig::default(), map);
//! let (tx, rx) = mpsc::channel(64);
//!
//! tx.send(JourneyEvent::StartJourney).await?;
//! let controller = run_journey(ctx, controller, provider, tx, rx).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use carpath_env::{
    Coordinate, DirectionsService, DriveContext, EnvError, JourneyId, LocationUpdate, MapSurface,
    Route, TransportType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::presentation::SceneBuilder;
use crate::route_provider::{RouteError, RouteProvider};
use crate::simulation::SimulationState;

/// Shortest tick period the ticker will run at.
pub const MIN_TICK_INTERVAL_MS: u64 = 1;

/// Configuration for a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyConfig {
    /// Logical name (for logging and marker title)
    pub name: String,

    /// Fixed journey start
    pub origin: Coordinate,

    /// Fixed journey end
    pub destination: Coordinate,

    /// Simulator cadence in milliseconds (default: 1000)
    pub tick_interval_ms: u64,

    /// Travel mode requested from the directions service
    pub transport_type: TransportType,

    /// Route bounding box multiplier for the initial framing
    pub region_padding: f64,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            name: "carpath".to_string(),
            origin: Coordinate::new(37.334_900, -122.009_020),
            destination: Coordinate::new(37.323_000, -122.032_200),
            tick_interval_ms: 1000,
            transport_type: TransportType::Automobile,
            region_padding: 1.2,
        }
    }
}

impl JourneyConfig {
    /// Tick period, never shorter than [`MIN_TICK_INTERVAL_MS`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }

    /// Parses a JSON document; absent fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Everything that can change journey state.
#[derive(Debug)]
pub enum JourneyEvent {
    /// Periodic timer fired
    Tick,

    /// Location service pushed a fix or an error
    Location(Result<LocationUpdate, EnvError>),

    /// The user pressed "Start Journey"
    StartJourney,

    /// A route lookup finished
    RouteFetched {
        journey: JourneyId,
        result: Result<Route, RouteError>,
    },

    /// Stop the event loop
    Shutdown,
}

/// A route lookup the owner wants performed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub journey: JourneyId,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// Errors surfaced by the journey owner. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JourneyError {
    #[error("journey {journey} has no route: {source}")]
    Route {
        journey: JourneyId,
        #[source]
        source: RouteError,
    },

    #[error("location update failed: {0}")]
    Location(#[from] EnvError),
}

/// Where journey ids come from.
#[derive(Debug, Clone)]
enum JourneyIds {
    Random,
    Seeded { next: u64 },
}

/// Single writer of [`SimulationState`].
///
/// Re-renders the map surface after every change.
pub struct JourneyController<M: MapSurface> {
    config: JourneyConfig,
    state: SimulationState,
    map: Arc<M>,
    scenes: SceneBuilder,
    ids: JourneyIds,

    /// Most recent "Start Journey"; completions for older ones are dropped
    latest_journey: Option<JourneyId>,

    tick_count: u64,
    stale_completions: u64,
}

impl<M: MapSurface> JourneyController<M> {
    pub fn new(config: JourneyConfig, map: Arc<M>) -> Self {
        let scenes = SceneBuilder::new(config.name.clone(), config.region_padding);
        Self {
            config,
            state: SimulationState::new(),
            map,
            scenes,
            ids: JourneyIds::Random,
            latest_journey: None,
            tick_count: 0,
            stale_completions: 0,
        }
    }

    /// Derives journey ids from `seed` instead of UUID v4 (for simulation).
    pub fn with_seeded_ids(mut self, seed: u64) -> Self {
        self.ids = JourneyIds::Seeded { next: seed };
        self
    }

    pub fn config(&self) -> &JourneyConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn latest_journey(&self) -> Option<JourneyId> {
        self.latest_journey
    }

    /// Number of route completions discarded because a newer journey started.
    pub fn stale_completions(&self) -> u64 {
        self.stale_completions
    }

    fn next_journey_id(&mut self) -> JourneyId {
        match &mut self.ids {
            JourneyIds::Random => JourneyId::new(),
            JourneyIds::Seeded { next } => {
                let id = JourneyId::from_seed(*next);
                *next = next.wrapping_add(1);
                id
            }
        }
    }

    /// Handles "Start Journey": returns the lookup the caller must perform.
    pub fn start_journey(&mut self) -> RouteRequest {
        let journey = self.next_journey_id();
        self.latest_journey = Some(journey);
        info!(
            "[{}] Journey {} requested: {} -> {}",
            self.config.name, journey, self.config.origin, self.config.destination
        );

        RouteRequest {
            journey,
            origin: self.config.origin,
            destination: self.config.destination,
        }
    }

    /// Applies a finished route lookup.
    ///
    /// Returns `Ok(true)` when the route was loaded, `Ok(false)` when the
    /// completion belonged to a superseded journey.
    pub fn on_route_fetched(
        &mut self,
        journey: JourneyId,
        result: Result<Route, RouteError>,
    ) -> Result<bool, JourneyError> {
        if self.latest_journey != Some(journey) {
            self.stale_completions += 1;
            debug!("[{}] Dropping stale completion for journey {}", self.config.name, journey);
            return Ok(false);
        }

        let route = result.map_err(|source| JourneyError::Route { journey, source })?;
        info!(
            "[{}] Journey {} loaded route: {} points, {:.0} m",
            self.config.name,
            journey,
            route.len(),
            route.distance_meters
        );

        self.state.load_route(route);
        self.refresh(true);
        Ok(true)
    }

    /// Advances the vehicle one route point. Returns true if it moved.
    pub fn on_tick(&mut self) -> bool {
        self.tick_count += 1;
        let moved = self.state.advance();
        if moved {
            debug!(
                "[{}] tick {} -> index {}",
                self.config.name,
                self.tick_count,
                self.state.current_index()
            );
            self.refresh(false);
        }
        moved
    }

    /// Applies a location fix, or reports the location error.
    pub fn on_location(&mut self, update: Result<LocationUpdate, EnvError>) -> Result<(), JourneyError> {
        let update = update?;
        let first_fix = self.state.current_coordinate().is_none();
        if self.state.set_device_location(update.coordinate) {
            self.refresh(first_fix);
        }
        Ok(())
    }

    /// Dispatches one event.
    ///
    /// Returns the route lookup to perform, if the event asked for one.
    pub fn apply(&mut self, event: JourneyEvent) -> Result<Option<RouteRequest>, JourneyError> {
        match event {
            JourneyEvent::Tick => {
                self.on_tick();
                Ok(None)
            }
            JourneyEvent::Location(update) => self.on_location(update).map(|_| None),
            JourneyEvent::StartJourney => Ok(Some(self.start_journey())),
            JourneyEvent::RouteFetched { journey, result } => {
                self.on_route_fetched(journey, result).map(|_| None)
            }
            JourneyEvent::Shutdown => Ok(None),
        }
    }

    /// Rebuilds the scene and pushes it to the map surface.
    pub fn refresh(&self, reframe: bool) {
        let scene = self.scenes.build(&self.state, reframe);
        self.map.render(&scene);
    }
}

/// Spawns the periodic `Tick` source.
///
/// Stops once the event channel closes.
pub fn spawn_ticker<Ctx: DriveContext>(
    ctx: Arc<Ctx>,
    interval: Duration,
    events: mpsc::Sender<JourneyEvent>,
) {
    let clock = Arc::clone(&ctx);
    ctx.spawn("ticker", async move {
        loop {
            clock.sleep(interval).await;
            if events.send(JourneyEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Runs the journey event loop until `Shutdown` or channel close.
///
/// Route lookups run as spawned tasks and report back through `events_tx`.
/// Errors are logged and otherwise ignored. Returns the controller so the
/// caller can inspect the final state.
pub async fn run_journey<Ctx, D, M>(
    ctx: Arc<Ctx>,
    mut controller: JourneyController<M>,
    provider: RouteProvider<D>,
    events_tx: mpsc::Sender<JourneyEvent>,
    mut events_rx: mpsc::Receiver<JourneyEvent>,
) -> JourneyController<M>
where
    Ctx: DriveContext,
    D: DirectionsService,
    M: MapSurface,
{
    spawn_ticker(Arc::clone(&ctx), controller.config().tick_interval(), events_tx.clone());
    controller.refresh(true);

    while let Some(event) = events_rx.recv().await {
        if matches!(event, JourneyEvent::Shutdown) {
            info!("[{}] Journey loop shutting down", controller.config().name);
            break;
        }

        match controller.apply(event) {
            Ok(Some(request)) => {
                let provider = provider.clone();
                let tx = events_tx.clone();
                ctx.spawn("route-fetch", async move {
                    let result = provider.fetch_route(request.origin, request.destination).await;
                    let _ = tx
                        .send(JourneyEvent::RouteFetched {
                            journey: request.journey,
                            result,
                        })
                        .await;
                });
            }
            Ok(None) => {}
            Err(JourneyError::Location(EnvError::PermissionDenied)) => {
                warn!("[{}] Location permission denied", controller.config().name);
            }
            Err(e) => warn!("[{}] {}", controller.config().name, e),
        }
    }

    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carpath_env::{DirectionsRequest, MapScene, TokioContext};
    use std::sync::Mutex;
    use std::time::SystemTime;

    #[derive(Default)]
    struct RecordingMap {
        scenes: Mutex<Vec<MapScene>>,
    }

    impl MapSurface for RecordingMap {
        fn render(&self, scene: &MapScene) {
            self.scenes.lock().unwrap().push(scene.clone());
        }
    }

    struct StraightDirections;

    #[async_trait]
    impl DirectionsService for StraightDirections {
        async fn calculate(&self, request: &DirectionsRequest) -> Result<Vec<Route>, EnvError> {
            let mid = crate::geodesy::interpolate(request.origin, request.destination, 0.5);
            Ok(vec![Route::new(vec![request.origin, mid, request.destination]).unwrap()])
        }
    }

    fn three_points() -> Route {
        Route::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 2.0),
        ])
        .unwrap()
    }

    fn controller() -> (JourneyController<RecordingMap>, Arc<RecordingMap>) {
        let map = Arc::new(RecordingMap::default());
        let controller = JourneyController::new(JourneyConfig::default(), map.clone()).with_seeded_ids(1);
        (controller, map)
    }

    #[test]
    fn test_journey_config_default() {
        let config = JourneyConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.transport_type, TransportType::Automobile);
    }

    #[test]
    fn test_journey_config_partial_json() {
        let config = JourneyConfig::from_json_str(r#"{ "tick_interval_ms": 250, "name": "demo" }"#).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.name, "demo");
        assert_eq!(config.origin, JourneyConfig::default().origin);
    }

    #[test]
    fn test_zero_tick_interval_is_clamped() {
        let config = JourneyConfig::from_json_str(r#"{ "tick_interval_ms": 0 }"#).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(MIN_TICK_INTERVAL_MS));
    }

    #[test]
    fn test_location_error_reaches_owner_untouched() {
        let (mut controller, map) = controller();

        let err = controller
            .apply(JourneyEvent::Location(Err(EnvError::location("no fix"))))
            .unwrap_err();

        assert_eq!(err, JourneyError::Location(EnvError::location("no fix")));
        assert_eq!(controller.state(), &SimulationState::new());
        assert!(map.scenes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ticks_without_route_are_noops() {
        let (mut controller, map) = controller();

        assert!(!controller.on_tick());
        assert_eq!(controller.tick_count(), 1);
        assert_eq!(controller.state(), &SimulationState::new());
        assert!(map.scenes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_route_load_then_drive_to_end() {
        let (mut controller, map) = controller();
        let request = controller.start_journey();

        assert!(controller.on_route_fetched(request.journey, Ok(three_points())).unwrap());
        assert!(controller.on_tick());
        assert!(controller.on_tick());
        assert!(!controller.on_tick());

        assert_eq!(controller.state().current_index(), 2);
        assert!(controller.state().is_finished());

        let scenes = map.scenes.lock().unwrap();
        // load + two moves
        assert_eq!(scenes.len(), 3);
        assert!(scenes[0].region.is_some());
        assert!(scenes[1].region.is_none());
        assert_eq!(scenes[2].vehicle().unwrap().heading_degrees, None);
    }

    #[test]
    fn test_failed_fetch_leaves_state_unchanged() {
        let (mut controller, _map) = controller();
        let request = controller.start_journey();

        let err = controller
            .on_route_fetched(request.journey, Err(RouteError::NoRoutes))
            .unwrap_err();

        assert_eq!(
            err,
            JourneyError::Route {
                journey: request.journey,
                source: RouteError::NoRoutes
            }
        );
        assert!(!controller.state().has_route());
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let (mut controller, _map) = controller();
        let first = controller.start_journey();
        let second = controller.start_journey();
        assert_ne!(first.journey, second.journey);

        let superseded = Route::new(vec![Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 2.0)]).unwrap();

        assert!(controller.on_route_fetched(second.journey, Ok(three_points())).unwrap());
        assert!(!controller.on_route_fetched(first.journey, Ok(superseded)).unwrap());

        assert_eq!(controller.state().route(), Some(&three_points()));
        assert_eq!(controller.stale_completions(), 1);
    }

    #[test]
    fn test_location_applies_before_journey_only() {
        let (mut controller, _map) = controller();
        let fix = LocationUpdate::new(Coordinate::new(5.0, 5.0), SystemTime::UNIX_EPOCH);

        controller.on_location(Ok(fix)).unwrap();
        assert_eq!(controller.state().current_coordinate(), Some(Coordinate::new(5.0, 5.0)));

        let request = controller.start_journey();
        controller.on_route_fetched(request.journey, Ok(three_points())).unwrap();
        controller.on_location(Ok(fix)).unwrap();
        assert_eq!(controller.state().current_coordinate(), Some(Coordinate::new(0.0, 0.0)));

        let err = controller.on_location(Err(EnvError::PermissionDenied)).unwrap_err();
        assert_eq!(err, JourneyError::Location(EnvError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_journey_drives_route_on_timer() {
        let ctx = TokioContext::shared();
        let (controller, map) = controller();
        let provider = RouteProvider::new(Arc::new(StraightDirections));
        let (tx, rx) = mpsc::channel(64);

        let handle = tokio::spawn(run_journey(ctx, controller, provider, tx.clone(), rx));

        tx.send(JourneyEvent::StartJourney).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(JourneyEvent::Shutdown).await.unwrap();

        let controller = handle.await.unwrap();
        let state = controller.state();

        assert!(state.has_route());
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.current_coordinate(), Some(JourneyConfig::default().destination));
        assert!(controller.tick_count() >= 4);
        assert!(!map.scenes.lock().unwrap().is_empty());
    }
}
