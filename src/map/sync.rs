use crate::{
    map::{DRIVER_MARKER, DROPOFF_MARKER, MapLayers, PICKUP_MARKER},
    trip::{Location, TripState, TripStore},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

const PICKUP_MARKER_COLOR: &str = "blue";
const DROPOFF_MARKER_COLOR: &str = "green";
const DRIVER_MARKER_COLOR: &str = "car";

/// Mirrors the trip store into pickup, dropoff and driver markers.
pub struct MapSync {
    layers: Arc<dyn MapLayers>,
}

impl MapSync {
    pub fn new(layers: Arc<dyn MapLayers>) -> Self {
        Self { layers }
    }

    /// Follows the store until every handle to it is dropped.
    pub fn spawn(self, store: &TripStore) -> JoinHandle<()> {
        let mut rx = store.subscribe();
        tokio::spawn(async move {
            loop {
                let state = rx.borrow_and_update().clone();
                self.apply(&state);
                if rx.changed().await.is_err() {
                    debug!("Trip store closed, map sync stopped");
                    break;
                }
            }
        })
    }

    pub fn apply(&self, state: &TripState) {
        self.marker(PICKUP_MARKER, PICKUP_MARKER_COLOR, state.pickup_location.as_ref());
        self.marker(DROPOFF_MARKER, DROPOFF_MARKER_COLOR, state.dropoff_location.as_ref());
        self.marker(DRIVER_MARKER, DRIVER_MARKER_COLOR, state.driver_location.as_ref());
    }

    fn marker(&self, id: &str, color: &str, location: Option<&Location>) {
        match location {
            Some(location) => self.layers.upsert_marker(id, color, location.coordinate()),
            None => self.layers.remove_marker(id),
        }
    }
}
