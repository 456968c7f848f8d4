mod sync;
pub use sync::*;

use crate::shared::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

pub const PICKUP_TO_DROPOFF: &str = "pickup-to-dropoff";
pub const DRIVER_TO_PICKUP: &str = "driver-to-pickup";

pub const PICKUP_MARKER: &str = "pickup";
pub const DROPOFF_MARKER: &str = "dropoff";
pub const DRIVER_MARKER: &str = "driver";

pub const ACTIVE_COLOR: &str = "#8FD14F";
pub const DRIVER_COLOR: &str = "#FF5733";
pub const PENDING_COLOR: &str = "#808080";

/// Id and tint a route layer is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub id: &'static str,
    pub color: &'static str,
}

impl LineStyle {
    pub const PICKUP_TO_DROPOFF: LineStyle = LineStyle {
        id: PICKUP_TO_DROPOFF,
        color: ACTIVE_COLOR,
    };
    pub const DRIVER_TO_PICKUP: LineStyle = LineStyle {
        id: DRIVER_TO_PICKUP,
        color: DRIVER_COLOR,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLayer {
    pub id: String,
    pub color: String,
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub color: String,
    pub coordinate: Coordinate,
}

/// Map rendering collaborator. Every call is an idempotent upsert or removal
/// keyed by id; operating on an unknown id is a no-op.
pub trait MapLayers: Send + Sync {
    fn upsert_line_layer(&self, id: &str, color: &str, coordinates: &[Coordinate]);
    fn remove_layer(&self, id: &str);
    fn recolor_layer(&self, id: &str, color: &str);
    fn has_layer(&self, id: &str) -> bool;
    fn upsert_marker(&self, id: &str, color: &str, coordinate: Coordinate);
    fn remove_marker(&self, id: &str);
}

#[derive(Debug, Default)]
struct Scene {
    layers: BTreeMap<String, LineLayer>,
    markers: BTreeMap<String, Marker>,
}

/// In-memory map scene, read back by the HTTP surface and by tests.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    scene: Arc<Mutex<Scene>>,
}

impl LayerStore {
    pub fn new() -> Self {
        Default::default()
    }

    fn scene(&self) -> MutexGuard<'_, Scene> {
        // Every mutation is a single map operation, a poisoned scene is still whole.
        self.scene.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn layer(&self, id: &str) -> Option<LineLayer> {
        self.scene().layers.get(id).cloned()
    }

    pub fn layers(&self) -> Vec<LineLayer> {
        self.scene().layers.values().cloned().collect()
    }

    pub fn marker(&self, id: &str) -> Option<Marker> {
        self.scene().markers.get(id).cloned()
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.scene().markers.values().cloned().collect()
    }
}

impl MapLayers for LayerStore {
    fn upsert_line_layer(&self, id: &str, color: &str, coordinates: &[Coordinate]) {
        let mut scene = self.scene();
        match scene.layers.get_mut(id) {
            // Existing layers keep their paint, only the geometry is replaced
            Some(layer) => layer.coordinates = coordinates.to_vec(),
            None => {
                scene.layers.insert(
                    id.to_string(),
                    LineLayer {
                        id: id.to_string(),
                        color: color.to_string(),
                        coordinates: coordinates.to_vec(),
                    },
                );
            }
        }
    }

    fn remove_layer(&self, id: &str) {
        self.scene().layers.remove(id);
    }

    fn recolor_layer(&self, id: &str, color: &str) {
        if let Some(layer) = self.scene().layers.get_mut(id) {
            layer.color = color.to_string();
        }
    }

    fn has_layer(&self, id: &str) -> bool {
        self.scene().layers.contains_key(id)
    }

    fn upsert_marker(&self, id: &str, color: &str, coordinate: Coordinate) {
        self.scene().markers.insert(
            id.to_string(),
            Marker {
                id: id.to_string(),
                color: color.to_string(),
                coordinate,
            },
        );
    }

    fn remove_marker(&self, id: &str) {
        self.scene().markers.remove(id);
    }
}

#[test]
fn upsert_keeps_existing_paint() {
    let store = LayerStore::new();
    let line = [Coordinate::new(10.0, 106.0), Coordinate::new(10.1, 106.1)];
    store.upsert_line_layer(PICKUP_TO_DROPOFF, ACTIVE_COLOR, &line);
    store.recolor_layer(PICKUP_TO_DROPOFF, PENDING_COLOR);
    store.upsert_line_layer(PICKUP_TO_DROPOFF, ACTIVE_COLOR, &line[1..]);

    let layer = store.layer(PICKUP_TO_DROPOFF).unwrap();
    assert_eq!(layer.color, PENDING_COLOR);
    assert_eq!(layer.coordinates.len(), 1);
}

#[test]
fn recolor_unknown_layer_is_noop() {
    let store = LayerStore::new();
    store.recolor_layer(DRIVER_TO_PICKUP, PENDING_COLOR);
    assert!(!store.has_layer(DRIVER_TO_PICKUP));
}
