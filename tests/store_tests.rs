use ridesim::prelude::*;

#[test]
fn starts_selecting_locations() {
    let store = TripStore::new();
    assert_eq!(store.snapshot(), TripState::default());
    assert_eq!(store.stage(), TripStage::SelectLocations);
}

#[test]
fn setters_replace_one_field() {
    let store = TripStore::new();
    store.set_pickup_location(Location::new(10.0, 106.0).with_address("A"));
    store.set_price(12.5);
    store.set_vehicle_type(VehicleType::Bike);

    let state = store.snapshot();
    assert_eq!(state.pickup_location.unwrap().address.as_deref(), Some("A"));
    assert_eq!(state.price, Some(12.5));
    assert_eq!(state.vehicle_type, Some(VehicleType::Bike));
    assert_eq!(state.dropoff_location, None);
}

#[test]
fn try_set_stage_reports_refusing_stage() {
    let store = TripStore::new();
    let to = TripStage::ConfirmRide;
    assert_eq!(
        store.try_set_stage(to, |from| from.can_advance_to(to)),
        Err(TripStage::SelectLocations)
    );
    let to = TripStage::SelectVehicle;
    assert_eq!(
        store.try_set_stage(to, |from| from.can_advance_to(to)),
        Ok(TripStage::SelectLocations)
    );
    assert_eq!(store.stage(), TripStage::SelectVehicle);
}

#[test]
fn reset_restores_initial_state() {
    let store = TripStore::new();
    store.set_dropoff_location(Location::new(10.0, 106.0));
    store.set_driver_location(Location::new(10.1, 106.1));
    store.set_stage(TripStage::Completed);
    store.reset();
    assert_eq!(store.snapshot(), TripState::default());
}

#[tokio::test]
async fn subscribers_see_every_write() {
    let store = TripStore::new();
    let mut rx = store.subscribe();
    store.set_stage(TripStage::SelectVehicle);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().stage, TripStage::SelectVehicle);
}
