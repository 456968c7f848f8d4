#![allow(dead_code)]

use async_trait::async_trait;
use ridesim::{
    api::{
        self, CreateRideRequest, CreateRideResponse, DriverUser, PriceData, PriceQuery, RideApi,
        RideData, RideDriver, StatusUpdate,
    },
    config::Config,
    fare::VehicleType,
    map::LayerStore,
    routing::{Geocoder, Route, RouteProvider},
    shared::geo::Coordinate,
    stage::{Collaborators, StageMachine},
    trip::{Location, TripStage},
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Default)]
pub struct FakeRides {
    pub fail_base: bool,
    pub fail_create: bool,
    pub failing_tier: Option<VehicleType>,
    pub driver_location: Option<Coordinate>,
    pub slow_dropoff: Option<SlowDropoff>,
    pub base_requests: AtomicUsize,
    pub tier_requests: Mutex<Vec<VehicleType>>,
    pub created: Mutex<Vec<CreateRideRequest>>,
    pub status_updates: Mutex<Vec<StatusUpdate>>,
}

/// Requests towards `dropoff` answer after `delay`, with an error if `fail`.
#[derive(Debug, Clone, Copy)]
pub struct SlowDropoff {
    pub dropoff: Coordinate,
    pub delay: Duration,
    pub fail: bool,
}

impl FakeRides {
    pub fn base_requests(&self) -> usize {
        self.base_requests.load(Ordering::SeqCst)
    }

    pub fn tier_requests(&self) -> Vec<VehicleType> {
        self.tier_requests.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<CreateRideRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<StatusUpdate> {
        self.status_updates.lock().unwrap().clone()
    }
}

pub fn tier_price(tier: VehicleType) -> f64 {
    match tier {
        VehicleType::Bike => 10.0,
        VehicleType::Car => 20.0,
        VehicleType::Luxury => 40.0,
    }
}

fn unavailable() -> api::Error {
    api::Error::Status {
        status: 503,
        body: "unavailable".into(),
    }
}

#[async_trait]
impl RideApi for FakeRides {
    async fn price(&self, query: &PriceQuery) -> Result<PriceData, api::Error> {
        let distance = query.pickup.distance(&query.dropoff).as_kilometers();
        match query.vehicle_type {
            None => {
                self.base_requests.fetch_add(1, Ordering::SeqCst);
                if let Some(slow) = self.slow_dropoff
                    && slow.dropoff == query.dropoff
                {
                    tokio::time::sleep(slow.delay).await;
                    if slow.fail {
                        return Err(unavailable());
                    }
                }
                if self.fail_base {
                    return Err(unavailable());
                }
                Ok(PriceData {
                    distance,
                    duration: 21.0,
                    price: None,
                })
            }
            Some(tier) => {
                self.tier_requests.lock().unwrap().push(tier);
                if self.failing_tier == Some(tier) {
                    return Err(unavailable());
                }
                Ok(PriceData {
                    distance,
                    duration: 21.0,
                    price: Some(tier_price(tier)),
                })
            }
        }
    }

    async fn create_ride(
        &self,
        request: &CreateRideRequest,
    ) -> Result<CreateRideResponse, api::Error> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        if self.fail_create {
            return Err(unavailable());
        }
        Ok(CreateRideResponse {
            data: RideData {
                id: Some(format!("ride-{}", created.len())),
                driver: Some(RideDriver {
                    id: Some("driver-1".into()),
                    user: Some(DriverUser {
                        first_name: Some("An".into()),
                        current_location: self.driver_location,
                        ..Default::default()
                    }),
                }),
            },
            driver: None,
        })
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), api::Error> {
        self.status_updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Three point routes through the midpoint, or nothing when unavailable.
pub struct FakeRoutes {
    pub available: AtomicBool,
    pub slow_to: Option<(Coordinate, Duration)>,
    pub calls: AtomicUsize,
}

impl Default for FakeRoutes {
    fn default() -> Self {
        Self {
            available: AtomicBool::new(true),
            slow_to: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeRoutes {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteProvider for FakeRoutes {
    async fn fetch_route(&self, from: Coordinate, to: Coordinate) -> Option<Route> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((slow_to, delay)) = self.slow_to
            && slow_to == to
        {
            tokio::time::sleep(delay).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return None;
        }
        Some(Route::from(vec![from, from.lerp(&to, 0.5), to]))
    }
}

pub struct FakeGeocoder(pub Option<String>);

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse(&self, _: Coordinate) -> Option<String> {
        self.0.clone()
    }
}

pub struct Harness {
    pub machine: StageMachine,
    pub rides: Arc<FakeRides>,
    pub routes: Arc<FakeRoutes>,
    pub layers: LayerStore,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.animation.time_scale = 20.0;
    config
}

pub fn harness(rides: FakeRides) -> Harness {
    harness_with(rides, FakeRoutes::default())
}

pub fn harness_with(rides: FakeRides, routes: FakeRoutes) -> Harness {
    let rides = Arc::new(rides);
    let routes = Arc::new(routes);
    let layers = LayerStore::new();
    let machine = StageMachine::new(
        test_config(),
        Collaborators {
            rides: rides.clone(),
            routes: routes.clone(),
            geocoder: Arc::new(FakeGeocoder(Some("District 1".into()))),
            layers: Arc::new(layers.clone()),
        },
    );
    Harness {
        machine,
        rides,
        routes,
        layers,
    }
}

pub fn pickup() -> Location {
    Location::new(10.0, 106.0).with_address("Pickup Street")
}

pub fn dropoff() -> Location {
    Location::new(10.005, 106.005).with_address("Dropoff Avenue")
}

pub fn near_pickup() -> Coordinate {
    Coordinate::new(10.001, 106.001)
}

pub async fn wait_for_stage(machine: &StageMachine, stage: TripStage) {
    let mut rx = machine.store().subscribe();
    tokio::time::timeout(
        Duration::from_secs(3600),
        rx.wait_for(|state| state.stage == stage),
    )
    .await
    .unwrap_or_else(|_| panic!("stage {stage} was never reached"))
    .expect("trip store closed");
}

/// Lets spawned fire-and-forget tasks run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Selects endpoints, books a car and waits for the booking to settle.
pub async fn book_car(h: &Harness) {
    h.machine.select_pickup(pickup()).await.unwrap();
    h.machine.select_dropoff(dropoff()).await.unwrap();
    h.machine.confirm_locations().unwrap();
    h.machine.select_vehicle(VehicleType::Car).unwrap();
    h.machine.confirm_ride().unwrap();
}

pub async fn ride_to_completion(h: &Harness) {
    book_car(h).await;
    wait_for_stage(&h.machine, TripStage::Completed).await;
    settle().await;
}
