//! Presentation - projects simulation state onto a map scene.

use carpath_env::{MapScene, Overlay, Region, VehicleMarker};

use crate::geodesy::bounding_region;
use crate::simulation::SimulationState;

/// Span (degrees) used when centering on a lone vehicle position.
pub const DEFAULT_SPAN_DEGREES: f64 = 0.02;

/// Builds [`MapScene`]s from [`SimulationState`].
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    /// Annotation title for the car marker
    pub vehicle_title: String,

    /// Multiplier applied to the route bounding box when framing
    pub route_padding: f64,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            vehicle_title: "Vehicle".to_string(),
            route_padding: 1.2,
        }
    }
}

impl SceneBuilder {
    pub fn new(vehicle_title: impl Into<String>, route_padding: f64) -> Self {
        Self {
            vehicle_title: vehicle_title.into(),
            route_padding,
        }
    }

    /// Projects the state into a fresh scene.
    ///
    /// With `reframe` set, the scene carries a region: the route's bounding
    /// region when a route is loaded, otherwise a default span around the
    /// vehicle. Without it the surface keeps its current viewport.
    pub fn build(&self, state: &SimulationState, reframe: bool) -> MapScene {
        let overlays = state
            .route()
            .map(|route| {
                vec![Overlay::Polyline {
                    points: route.points().to_vec(),
                }]
            })
            .unwrap_or_default();

        let annotations = state
            .current_coordinate()
            .map(|coordinate| {
                vec![VehicleMarker {
                    coordinate,
                    heading_degrees: state.heading(),
                    title: self.vehicle_title.clone(),
                }]
            })
            .unwrap_or_default();

        let region = if reframe { self.frame(state) } else { None };

        MapScene {
            overlays,
            annotations,
            region,
        }
    }

    fn frame(&self, state: &SimulationState) -> Option<Region> {
        if let Some(route) = state.route() {
            return bounding_region(route.points(), self.route_padding);
        }
        state
            .current_coordinate()
            .map(|center| Region::new(center, DEFAULT_SPAN_DEGREES, DEFAULT_SPAN_DEGREES))
    }
}
