//! Map rendering surface abstraction.

use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, Region};

/// A drawable overlay on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    Polyline { points: Vec<Coordinate> },
}

/// The car annotation, rotated to face the direction of travel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleMarker {
    pub coordinate: Coordinate,

    /// Bearing toward the next route point; `None` when there is no next point
    pub heading_degrees: Option<f64>,

    pub title: String,
}

/// Everything the surface should show after one refresh.
///
/// Scenes are rebuilt wholesale; the surface replaces its overlays and
/// annotations with the new ones instead of moving existing ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapScene {
    pub overlays: Vec<Overlay>,
    pub annotations: Vec<VehicleMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl MapScene {
    /// The single vehicle marker, if any.
    pub fn vehicle(&self) -> Option<&VehicleMarker> {
        self.annotations.first()
    }
}

/// A surface that can draw a [`MapScene`].
///
/// Rendering is synchronous: the journey owner calls it after each change.
pub trait MapSurface: Send + Sync + 'static {
    fn render(&self, scene: &MapScene);
}
