//! Scenario runner - executes scripted journeys inside a SimWorld.

use crate::directions::DirectionsFault;
use crate::error::SimError;
use crate::exporter::{SimEvent, SimExport, SimFrame};
use crate::location::SimLocationService;
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld};

use carpath_core::RouteError;
use carpath_env::EnvError;
use std::path::Path;
use tracing::{debug, info, warn};

/// Route size used for the second journey in `restart_journey`.
const RESTART_ROUTE_POINTS: usize = 4;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Vehicle route index at the end
    pub final_index: usize,

    /// Points in the loaded route (0 if none)
    pub route_len: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    pub ticks_advanced: u64,
    pub location_updates: u64,
    pub location_errors: u64,
    pub route_errors: u64,
    pub routes_loaded: u64,
    pub stale_completions: u64,
    pub directions_requests: u64,
    pub scenes_rendered: usize,
}

/// Runs journey scenarios.
pub struct ScenarioRunner {
    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.duration_secs = secs;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.block_on_scenario(scenario, None)
    }

    /// Runs a scenario and writes a frame-by-frame export to `path`.
    pub fn run_with_export(
        &self,
        scenario: ScenarioId,
        path: impl AsRef<Path>,
    ) -> Result<ScenarioResult, SimError> {
        let mut export = SimExport::new(scenario.name(), self.config.seed);
        let result = self.block_on_scenario(scenario, Some(&mut export));
        export.write_to_file(path)?;
        Ok(result)
    }

    fn block_on_scenario(&self, scenario: ScenarioId, export: Option<&mut SimExport>) -> ScenarioResult {
        let runtime = match tokio::runtime::Builder::new_current_thread().build() {
            Ok(rt) => rt,
            Err(e) => {
                return self.aborted(scenario, SimError::Runtime(e.to_string()));
            }
        };
        runtime.block_on(self.run_scenario(scenario, export))
    }

    fn aborted(&self, scenario: ScenarioId, error: SimError) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.config.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            final_index: 0,
            route_len: 0,
            failure_reason: Some(error.to_string()),
            metrics: ScenarioMetrics::default(),
        }
    }

    async fn run_scenario(
        &self,
        scenario: ScenarioId,
        mut export: Option<&mut SimExport>,
    ) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.config.seed);
        debug!("  {}", scenario.description());

        let location = match scenario {
            ScenarioId::PermissionDenied => SimLocationService::denying(),
            _ => SimLocationService::granting(),
        };
        let mut world = SimWorld::with_location(self.config.clone(), location);

        if let Err(e) = world.connect_location().await {
            info!("Location unavailable for this run: {}", e);
        }

        match scenario {
            ScenarioId::EmptyDirections => world.directions.set_fault(DirectionsFault::Empty),
            ScenarioId::DirectionsFailure => {
                world.directions.set_fault(DirectionsFault::Fail("network unreachable".into()))
            }
            _ => {}
        }

        let total_ticks = self.config.total_ticks();
        let restart_at = 2 + self.config.directions_latency_ticks + self.config.route_points as u64 / 2;
        let mut reset_violations = 0u64;

        for tick in 0..total_ticks {
            let mut events = Vec::new();
            self.script(scenario, &mut world, tick, restart_at, &mut events);

            let loaded_before = world.stats().routes_loaded;
            let errors_before = world.stats().route_errors.len();
            world.tick().await;

            if world.stats().routes_loaded > loaded_before {
                let state = world.controller().state();
                events.push(SimEvent::info(format!(
                    "route loaded ({} points)",
                    state.route().map(|r| r.len()).unwrap_or(0)
                )));
                if state.current_index() != 0 {
                    reset_violations += 1;
                }
            }
            for e in &world.stats().route_errors[errors_before..] {
                events.push(SimEvent::warn(e.to_string()));
            }

            if let Some(export) = export.as_deref_mut() {
                export.add_frame(SimFrame {
                    tick: world.tick_count(),
                    time_sec: world.time(),
                    index: world.controller().state().current_index(),
                    vehicle: world.map.last_scene().and_then(|s| s.vehicle().cloned()),
                    events,
                });
            }
        }

        let failure_reason = self.evaluate(scenario, &world, reset_violations);
        let passed = failure_reason.is_none();
        if !passed {
            warn!("{} failed: {}", scenario.name(), failure_reason.as_deref().unwrap_or(""));
        }

        let state = world.controller().state();
        let route_points = state.route().map(|r| r.points().to_vec()).unwrap_or_default();
        if let Some(export) = export {
            export.finalize(route_points.clone(), passed, failure_reason.clone());
        }

        let stats = world.stats();
        ScenarioResult {
            scenario,
            seed: self.config.seed,
            passed,
            total_ticks,
            final_time_secs: world.time(),
            final_index: state.current_index(),
            route_len: route_points.len(),
            failure_reason,
            metrics: ScenarioMetrics {
                ticks_advanced: stats.ticks_advanced,
                location_updates: stats.location_updates,
                location_errors: stats.location_errors.len() as u64,
                route_errors: stats.route_errors.len() as u64,
                routes_loaded: stats.routes_loaded,
                stale_completions: world.controller().stale_completions(),
                directions_requests: world.directions.request_count(),
                scenes_rendered: world.map.render_count(),
            },
        }
    }

    /// Scripted inputs applied before tick `tick`.
    fn script(
        &self,
        scenario: ScenarioId,
        world: &mut SimWorld,
        tick: u64,
        restart_at: u64,
        events: &mut Vec<SimEvent>,
    ) {
        let origin = self.config.journey.origin;

        // Device sits at the origin until the journey takes over
        if scenario == ScenarioId::SignalLoss && tick % 3 == 2 {
            world
                .location
                .push_error(EnvError::location("signal lost"));
        } else {
            world.push_device_fix(origin);
        }

        match (scenario, tick) {
            (ScenarioId::StaleCompletion, 1) => {
                world.press_start_with_latency(self.config.directions_latency_ticks + 5);
                events.push(SimEvent::info("start journey (slow lookup)"));
            }
            (ScenarioId::StaleCompletion, 2) => {
                world.press_start_with_latency(1);
                events.push(SimEvent::info("start journey (fast lookup)"));
            }
            (ScenarioId::StaleCompletion, 4) => {
                // Makes the superseded route distinguishable if it were applied
                world.directions.set_route_points(self.config.route_points + 8);
            }
            (_, 1) => {
                world.press_start();
                events.push(SimEvent::info("start journey"));
            }
            (ScenarioId::RestartJourney, t) if t == restart_at => {
                world.directions.set_route_points(RESTART_ROUTE_POINTS);
                world.press_start();
                events.push(SimEvent::info("restart journey"));
            }
            _ => {}
        }
    }

    /// Checks the scenario's assertions. Returns the first failure.
    fn evaluate(&self, scenario: ScenarioId, world: &SimWorld, reset_violations: u64) -> Option<String> {
        let stats = world.stats();
        let controller = world.controller();
        let state = controller.state();

        if stats.off_route_ticks > 0 {
            return Some(format!("vehicle left its route point on {} tick(s)", stats.off_route_ticks));
        }
        if stats.bad_headings > 0 {
            return Some(format!("{} heading(s) outside [0, 360)", stats.bad_headings));
        }
        if reset_violations > 0 {
            return Some("route loaded without resetting the index".to_string());
        }

        if scenario.expects_route() {
            let Some(route) = state.route() else {
                return Some("no route was loaded".to_string());
            };
            if !state.is_finished() {
                return Some(format!(
                    "journey unfinished at index {}/{}",
                    state.current_index(),
                    route.last_index()
                ));
            }
            if state.heading().is_some() {
                return Some("heading defined at end of route".to_string());
            }
        }

        match scenario {
            ScenarioId::NominalDrive => {
                let len = state.route().map(|r| r.len() as u64).unwrap_or(0);
                if stats.ticks_advanced != len.saturating_sub(1) {
                    return Some(format!(
                        "expected {} advancing ticks, saw {}",
                        len.saturating_sub(1),
                        stats.ticks_advanced
                    ));
                }
                if stats.location_updates == 0 || !stats.location_errors.is_empty() {
                    return Some("device fixes were not forwarded cleanly".to_string());
                }
            }
            ScenarioId::PermissionDenied => {
                if stats.location_errors.first() != Some(&EnvError::PermissionDenied) {
                    return Some("permission denial was not reported".to_string());
                }
                if stats.location_updates > 0 {
                    return Some("location updates arrived without permission".to_string());
                }
            }
            ScenarioId::EmptyDirections => {
                if stats.route_errors != [RouteError::NoRoutes] {
                    return Some(format!("expected one NoRoutes error, saw {:?}", stats.route_errors));
                }
                if state.has_route() || stats.ticks_advanced > 0 {
                    return Some("journey started without a route".to_string());
                }
            }
            ScenarioId::DirectionsFailure => {
                if !matches!(stats.route_errors.as_slice(), [RouteError::Directions(_)]) {
                    return Some(format!("expected one directions error, saw {:?}", stats.route_errors));
                }
                if state.has_route() || stats.ticks_advanced > 0 {
                    return Some("journey started without a route".to_string());
                }
            }
            ScenarioId::RestartJourney => {
                if stats.routes_loaded != 2 {
                    return Some(format!("expected 2 routes loaded, saw {}", stats.routes_loaded));
                }
                if state.route().map(|r| r.len()) != Some(RESTART_ROUTE_POINTS) {
                    return Some("second route did not replace the first".to_string());
                }
            }
            ScenarioId::StaleCompletion => {
                if controller.stale_completions() != 1 || stats.routes_loaded != 1 {
                    return Some(format!(
                        "expected 1 stale completion and 1 load, saw {} and {}",
                        controller.stale_completions(),
                        stats.routes_loaded
                    ));
                }
                if state.route().map(|r| r.len()) != Some(self.config.route_points.max(2)) {
                    return Some("superseded route was applied".to_string());
                }
            }
            ScenarioId::SignalLoss => {
                if stats.location_errors.is_empty() || stats.location_updates == 0 {
                    return Some("expected both fixes and errors from the location stream".to_string());
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(SimConfig::default())
    }

    #[test]
    fn test_all_scenarios_pass_with_defaults() {
        for scenario in ScenarioId::all() {
            let result = runner().run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
        }
    }

    #[test]
    fn test_nominal_drive_metrics() {
        let result = runner().run(ScenarioId::NominalDrive);

        assert_eq!(result.route_len, SimConfig::default().route_points);
        assert_eq!(result.final_index, result.route_len - 1);
        assert_eq!(result.metrics.ticks_advanced, result.route_len as u64 - 1);
        assert_eq!(result.metrics.directions_requests, 1);
        assert_eq!(result.total_ticks, 30);
    }

    #[test]
    fn test_too_short_duration_fails() {
        let result = runner().with_duration(3.0).run(ScenarioId::NominalDrive);
        assert!(!result.passed);
        assert!(result.failure_reason.unwrap().contains("unfinished"));
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = runner().with_seed(9).run(ScenarioId::RestartJourney);
        let b = runner().with_seed(9).run(ScenarioId::RestartJourney);

        assert_eq!(a.final_index, b.final_index);
        assert_eq!(a.metrics.scenes_rendered, b.metrics.scenes_rendered);
        assert_eq!(a.metrics.ticks_advanced, b.metrics.ticks_advanced);
    }

    #[test]
    fn test_run_with_export_writes_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nominal.json");

        let result = runner().run_with_export(ScenarioId::NominalDrive, &path).unwrap();
        assert!(result.passed);

        let export: SimExport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(export.frames.len(), 30);
        assert_eq!(export.route.len(), result.route_len);
        assert!(export.frames.iter().any(|f| !f.events.is_empty()));
    }
}
