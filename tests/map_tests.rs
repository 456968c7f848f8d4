use ridesim::{
    map::{DRIVER_MARKER, DROPOFF_MARKER, PICKUP_MARKER},
    prelude::*,
};
use std::{sync::Arc, time::Duration};

#[test]
fn markers_follow_trip_state() {
    let layers = LayerStore::new();
    let sync = MapSync::new(Arc::new(layers.clone()));
    let store = TripStore::new();

    store.set_pickup_location(Location::new(10.0, 106.0));
    store.set_driver_location(Location::new(10.01, 106.01));
    sync.apply(&store.snapshot());
    assert_eq!(
        layers.marker(PICKUP_MARKER).unwrap().coordinate,
        Coordinate::new(10.0, 106.0)
    );
    assert!(layers.marker(DROPOFF_MARKER).is_none());
    assert!(layers.marker(DRIVER_MARKER).is_some());

    store.reset();
    sync.apply(&store.snapshot());
    assert!(layers.markers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn spawned_sync_tracks_the_driver() {
    let layers = LayerStore::new();
    let store = TripStore::new();
    let _task = MapSync::new(Arc::new(layers.clone())).spawn(&store);

    store.set_driver_location(Location::new(10.02, 106.02));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        layers.marker(DRIVER_MARKER).unwrap().coordinate,
        Coordinate::new(10.02, 106.02)
    );
}
