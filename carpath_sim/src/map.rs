//! Map surface that records every scene it is asked to draw.

use carpath_env::{MapScene, MapSurface};
use std::sync::Mutex;

/// Headless map surface for simulation runs.
#[derive(Default)]
pub struct RecordingMapSurface {
    scenes: Mutex<Vec<MapScene>>,
}

impl RecordingMapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refreshes received.
    pub fn render_count(&self) -> usize {
        self.scenes.lock().unwrap().len()
    }

    /// The most recent scene, if any.
    pub fn last_scene(&self) -> Option<MapScene> {
        self.scenes.lock().unwrap().last().cloned()
    }

    /// Removes and returns all recorded scenes.
    #[cfg(test)]
    pub fn drain(&self) -> Vec<MapScene> {
        std::mem::take(&mut *self.scenes.lock().unwrap())
    }
}

impl MapSurface for RecordingMapSurface {
    fn render(&self, scene: &MapScene) {
        self.scenes.lock().unwrap().push(scene.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_and_drains() {
        let map = RecordingMapSurface::new();
        map.render(&MapScene::default());
        map.render(&MapScene::default());

        assert_eq!(map.render_count(), 2);
        assert_eq!(map.last_scene(), Some(MapScene::default()));
        assert_eq!(map.drain().len(), 2);
        assert_eq!(map.render_count(), 0);
    }
}
