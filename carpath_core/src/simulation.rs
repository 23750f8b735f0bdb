//! Position simulator - steps a vehicle along a precomputed route.
//!
//! One tick moves the vehicle exactly one route point forward, no matter how
//! far apart consecutive points are. Simulated speed is therefore constant in
//! points per tick, not in meters per second.

use carpath_env::{Coordinate, Route};

use crate::geodesy::bearing;

/// Route, current index and current coordinate of the simulated vehicle.
///
/// Invariants:
/// - `current_index < route.len()` whenever a route is loaded
/// - once a route is loaded, `current_coordinate == route[current_index]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    route: Option<Route>,
    current_coordinate: Option<Coordinate>,
    current_index: usize,
}

impl SimulationState {
    /// Creates an empty state (no route, no position).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn current_coordinate(&self) -> Option<Coordinate> {
        self.current_coordinate
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Replaces any previous route and restarts at its first point.
    pub fn load_route(&mut self, route: Route) {
        self.current_index = 0;
        self.current_coordinate = Some(route.first());
        self.route = Some(route);
    }

    /// Records a device fix.
    ///
    /// Only applies while no route is loaded; once a journey is running the
    /// simulator owns the vehicle position. Returns true if applied.
    pub fn set_device_location(&mut self, coordinate: Coordinate) -> bool {
        if self.route.is_some() {
            return false;
        }
        self.current_coordinate = Some(coordinate);
        true
    }

    /// Advances one route point.
    ///
    /// No-op without a route or at the last point. Returns true if the index
    /// moved.
    pub fn advance(&mut self) -> bool {
        let Some(route) = &self.route else {
            return false;
        };
        let next = self.current_index + 1;
        match route.get(next) {
            Some(coordinate) => {
                self.current_index = next;
                self.current_coordinate = Some(coordinate);
                true
            }
            None => false,
        }
    }

    /// Value-returning form of [`advance`](Self::advance).
    pub fn advanced(&self) -> Self {
        let mut next = self.clone();
        next.advance();
        next
    }

    /// The route point after the current one, if any.
    pub fn next_coordinate(&self) -> Option<Coordinate> {
        self.route.as_ref()?.get(self.current_index + 1)
    }

    /// Bearing from the current point to the next one.
    ///
    /// `None` at the end of the route or when no route is loaded.
    pub fn heading(&self) -> Option<f64> {
        let current = self.current_coordinate?;
        let next = self.next_coordinate()?;
        Some(bearing(current, next))
    }

    /// True once the vehicle sits on the last route point.
    pub fn is_finished(&self) -> bool {
        self.route
            .as_ref()
            .map(|r| self.current_index == r.last_index())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn straight_route() -> Route {
        Route::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 2.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_advance_without_route_is_noop() {
        let mut state = SimulationState::new();
        let before = state.clone();

        assert!(!state.advance());
        assert_eq!(state, before);
        assert_eq!(state.heading(), None);
    }

    #[test]
    fn test_three_point_scenario() {
        let mut state = SimulationState::new();
        state.load_route(straight_route());

        // t0
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(0.0, 0.0)));

        // t1
        assert!(state.advance());
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(0.0, 1.0)));

        // t2
        assert!(state.advance());
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(0.0, 2.0)));

        // t3: terminal
        assert!(!state.advance());
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(0.0, 2.0)));
        assert!(state.is_finished());
    }

    #[test]
    fn test_heading_faces_next_point() {
        let mut state = SimulationState::new();
        state.load_route(straight_route());

        assert_relative_eq!(state.heading().unwrap(), 90.0, epsilon = 1e-9);
        state.advance();
        state.advance();
        assert_eq!(state.heading(), None);
    }

    #[test]
    fn test_load_route_resets_progress() {
        let mut state = SimulationState::new();
        state.load_route(straight_route());
        state.advance();
        state.advance();

        let short = Route::new(vec![Coordinate::new(5.0, 5.0), Coordinate::new(5.0, 6.0)]).unwrap();
        state.load_route(short);

        assert_eq!(state.current_index(), 0);
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(5.0, 5.0)));
    }

    #[test]
    fn test_device_location_ignored_during_journey() {
        let mut state = SimulationState::new();
        assert!(state.set_device_location(Coordinate::new(1.0, 1.0)));
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(1.0, 1.0)));

        state.load_route(straight_route());
        assert!(!state.set_device_location(Coordinate::new(9.0, 9.0)));
        assert_eq!(state.current_coordinate(), Some(Coordinate::new(0.0, 0.0)));
    }

    #[test]
    fn test_advanced_leaves_original_untouched() {
        let mut state = SimulationState::new();
        state.load_route(straight_route());

        let next = state.advanced();
        assert_eq!(state.current_index(), 0);
        assert_eq!(next.current_index(), 1);
    }

    fn route_strategy() -> impl Strategy<Value = Route> {
        prop::collection::vec((-80.0f64..80.0, -179.0f64..179.0), 1..64).prop_map(|pts| {
            Route::new(pts.into_iter().map(|(lat, lon)| Coordinate::new(lat, lon)).collect()).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_reaches_last_index_then_stays(route in route_strategy(), extra in 0usize..10) {
            let n = route.len();
            let mut state = SimulationState::new();
            state.load_route(route.clone());

            for _ in 0..n - 1 {
                prop_assert!(state.advance());
            }
            prop_assert_eq!(state.current_index(), n - 1);

            for _ in 0..extra {
                prop_assert!(!state.advance());
                prop_assert_eq!(state.current_index(), n - 1);
            }
        }

        #[test]
        fn prop_coordinate_always_on_route(route in route_strategy(), ticks in 0usize..100) {
            let mut state = SimulationState::new();
            state.load_route(route.clone());

            for _ in 0..ticks {
                state.advance();
                let current = state.current_coordinate().unwrap();
                prop_assert!(route.points().contains(&current));
                prop_assert_eq!(Some(current), route.get(state.current_index()));
            }
        }
    }
}
