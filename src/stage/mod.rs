use crate::{
    animator::Animator,
    api::{self, CreateRideRequest, RideApi, RideRecord, RideStatus, StatusUpdate},
    config::Config,
    fare::{FareEstimator, PriceQuote, VehicleType},
    map::{
        ACTIVE_COLOR, DRIVER_TO_PICKUP, LineStyle, MapLayers, PENDING_COLOR, PICKUP_TO_DROPOFF,
    },
    notice::Notices,
    routing::{Geocoder, Route, RouteProvider},
    shared::geo::Coordinate,
    trip::{Location, TripStage, TripStore},
};
use rand::Rng;
use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const CURRENT_LOCATION: &str = "Current Location";
const DRIVER_LOCATION: &str = "Driver Location";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: TripStage, to: TripStage },
    #[error("Locations cannot change during {0}")]
    LocationsLocked(TripStage),
    #[error("Both pickup and dropoff locations must be selected")]
    MissingLocations,
    #[error("No price available for {0}")]
    PriceUnavailable(VehicleType),
    #[error("Ride service error: {0}")]
    Api(#[from] api::Error),
}

/// External services the machine drives.
#[derive(Clone)]
pub struct Collaborators {
    pub rides: Arc<dyn RideApi>,
    pub routes: Arc<dyn RouteProvider>,
    pub geocoder: Arc<dyn Geocoder>,
    pub layers: Arc<dyn MapLayers>,
}

/// Everything that lives exactly as long as one trip.
#[derive(Debug, Default)]
struct Session {
    quote: Option<PriceQuote>,
    quote_generation: u64,
    ride: Option<RideRecord>,
    driver_to_pickup: Option<Route>,
    /// Set once the terminal status update went out for this ride.
    completion_sent: bool,
    /// Cancelled on reset, stops every task the trip spawned.
    trip: CancellationToken,
}

struct Inner {
    config: Config,
    store: TripStore,
    rides: Arc<dyn RideApi>,
    routes: Arc<dyn RouteProvider>,
    geocoder: Arc<dyn Geocoder>,
    layers: Arc<dyn MapLayers>,
    animator: Animator,
    estimator: FareEstimator,
    notices: Notices,
    session: Mutex<Session>,
}

/// The trip lifecycle.
///
/// Stages only move through [`StageMachine::transition`], which checks the
/// edge and then runs the entry handler of the new stage exactly once. Entry
/// handlers that need I/O spawn it; the follow-up transition is requested by
/// that task or by the animator's completion callback.
#[derive(Clone)]
pub struct StageMachine {
    inner: Arc<Inner>,
}

impl StageMachine {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let store = TripStore::new();
        let animator = Animator::new(
            store.clone(),
            collaborators.layers.clone(),
            config.animation.clone(),
        );
        let estimator = FareEstimator::new(collaborators.rides.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                rides: collaborators.rides,
                routes: collaborators.routes,
                geocoder: collaborators.geocoder,
                layers: collaborators.layers,
                animator,
                estimator,
                notices: Notices::new(),
                session: Mutex::default(),
            }),
        }
    }

    pub fn store(&self) -> &TripStore {
        &self.inner.store
    }

    pub fn animator(&self) -> &Animator {
        &self.inner.animator
    }

    pub fn notices(&self) -> &Notices {
        &self.inner.notices
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn stage(&self) -> TripStage {
        self.inner.store.stage()
    }

    /// Quote for the current endpoints. `None` while it is being computed.
    pub fn quote(&self) -> Option<PriceQuote> {
        self.session().quote.clone()
    }

    pub fn ride(&self) -> Option<RideRecord> {
        self.session().ride.clone()
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // User actions

    /// Uses the device position as the default pickup. Without a position the
    /// pickup is left for the user to search.
    pub async fn use_current_position(
        &self,
        position: Option<Coordinate>,
    ) -> Result<Option<PriceQuote>, self::Error> {
        let Some(coordinate) = position else {
            warn!("Geolocation unavailable, no default pickup set");
            return Ok(None);
        };
        let address = self
            .inner
            .geocoder
            .reverse(coordinate)
            .await
            .unwrap_or_else(|| CURRENT_LOCATION.into());
        self.select_pickup(Location::from(coordinate).with_address(address))
            .await
    }

    pub async fn select_pickup(
        &self,
        location: Location,
    ) -> Result<Option<PriceQuote>, self::Error> {
        self.ensure_locations_editable()?;
        info!(pickup = %location, "Pickup selected");
        self.inner.store.set_pickup_location(location);
        self.endpoints_changed().await
    }

    pub async fn select_dropoff(
        &self,
        location: Location,
    ) -> Result<Option<PriceQuote>, self::Error> {
        self.ensure_locations_editable()?;
        info!(dropoff = %location, "Dropoff selected");
        self.inner.store.set_dropoff_location(location);
        self.endpoints_changed().await
    }

    pub fn confirm_locations(&self) -> Result<(), self::Error> {
        if self.inner.store.snapshot().endpoints().is_none() {
            self.inner
                .notices
                .error("Please select both pickup and dropoff locations.");
            return Err(Error::MissingLocations);
        }
        self.transition(TripStage::SelectVehicle)
    }

    pub fn select_vehicle(&self, vehicle_type: VehicleType) -> Result<(), self::Error> {
        let stage = self.stage();
        if stage != TripStage::SelectVehicle {
            return Err(Error::InvalidTransition {
                from: stage,
                to: TripStage::ConfirmRide,
            });
        }
        let price = self
            .session()
            .quote
            .as_ref()
            .and_then(|quote| quote.price(vehicle_type));
        let Some(price) = price else {
            self.inner
                .notices
                .error("Error calculating price. Please try again.");
            return Err(Error::PriceUnavailable(vehicle_type));
        };
        info!(%vehicle_type, price, "Vehicle selected");
        self.inner.store.set_vehicle_type(vehicle_type);
        self.inner.store.set_price(price);
        self.transition(TripStage::ConfirmRide)
    }

    /// Books the ride. Driver matching continues in the background; watch the
    /// store for `driverFound` or a revert to `selectLocations`.
    pub fn confirm_ride(&self) -> Result<(), self::Error> {
        if self.inner.store.snapshot().endpoints().is_none() {
            self.inner.notices.error("Location information missing");
            return Err(Error::MissingLocations);
        }
        self.transition(TripStage::FindingDriver)
    }

    /// Abandons the current trip from any stage and starts over.
    pub fn reset(&self) {
        info!(stage = %self.stage(), "Trip reset");
        self.clear_trip();
    }

    /// Drops everything the trip owns and restores the store. Quote
    /// generations keep counting so in-flight quotes of the old trip stay
    /// outdated.
    fn clear_trip(&self) {
        let finished = {
            let mut session = self.session();
            let generation = session.quote_generation + 1;
            let finished = std::mem::take(&mut *session);
            session.quote_generation = generation;
            finished
        };
        finished.trip.cancel();
        self.inner.animator.cancel();
        self.inner.layers.remove_layer(DRIVER_TO_PICKUP);
        self.inner.layers.remove_layer(PICKUP_TO_DROPOFF);
        self.inner.store.reset();
    }

    // Transitions

    /// Requests the edge from the current stage to `to` and runs the entry
    /// handler of `to`. Requesting `completed` while already there re-runs
    /// its handler, which the completion guard turns into a no-op.
    pub fn transition(&self, to: TripStage) -> Result<(), self::Error> {
        let from = self
            .inner
            .store
            .try_set_stage(to, |from| {
                from.can_advance_to(to) || (from == to && to == TripStage::Completed)
            })
            .map_err(|from| {
                warn!(%from, %to, "Rejected stage transition");
                Error::InvalidTransition { from, to }
            })?;
        info!(%from, %to, "Stage transition");
        self.enter(from, to);
        Ok(())
    }

    fn enter(&self, from: TripStage, stage: TripStage) {
        match stage {
            TripStage::SelectLocations => self.enter_select_locations(from),
            TripStage::SelectVehicle | TripStage::ConfirmRide => {}
            TripStage::FindingDriver => self.enter_finding_driver(),
            TripStage::DriverFound => self.enter_driver_found(),
            TripStage::DriverToPickUp => self.enter_driver_to_pickup(),
            TripStage::DriverArrivedPickUp => self.enter_driver_arrived_pickup(),
            TripStage::PickupToDropoff => self.enter_pickup_to_dropoff(),
            TripStage::Completed => self.enter_completed(),
        }
    }

    /// Restarting after completion starts a fresh trip. A failed booking
    /// keeps the endpoints so the user can retry.
    fn enter_select_locations(&self, from: TripStage) {
        if from == TripStage::Completed {
            self.clear_trip();
            return;
        }
        let mut session = self.session();
        session.completion_sent = false;
        session.driver_to_pickup = None;
    }

    fn enter_finding_driver(&self) {
        let machine = self.clone();
        self.spawn_in_trip(async move { machine.create_ride().await });
    }

    fn enter_driver_found(&self) {
        if self.inner.layers.has_layer(PICKUP_TO_DROPOFF) {
            self.inner.layers.recolor_layer(PICKUP_TO_DROPOFF, PENDING_COLOR);
        }
        let state = self.inner.store.snapshot();
        let (Some(driver), Some(pickup)) = (state.driver_location, state.pickup_location) else {
            error!("Driver found without driver or pickup location");
            return;
        };

        let machine = self.clone();
        self.spawn_in_trip(async move {
            let route = machine
                .inner
                .routes
                .fetch_route(driver.coordinate(), pickup.coordinate())
                .await;
            if let Some(route) = &route {
                let style = LineStyle::DRIVER_TO_PICKUP;
                machine
                    .inner
                    .layers
                    .upsert_line_layer(style.id, style.color, route);
            }
            machine.session().driver_to_pickup = route;
            machine.follow_up(TripStage::DriverToPickUp);
        });
    }

    fn enter_driver_to_pickup(&self) {
        let route = self.session().driver_to_pickup.take();
        let Some(pickup) = self.inner.store.snapshot().pickup_location else {
            error!("Driver heading to pickup without a pickup location");
            return;
        };
        let route = route.unwrap_or_else(|| skipped_leg(&pickup));
        self.animate_leg(
            route,
            LineStyle::DRIVER_TO_PICKUP,
            TripStage::DriverArrivedPickUp,
        );
    }

    fn enter_driver_arrived_pickup(&self) {
        self.inner.layers.remove_layer(DRIVER_TO_PICKUP);
        let dwell = self.inner.config.pickup_dwell;
        let machine = self.clone();
        self.spawn_in_trip(async move {
            tokio::time::sleep(dwell).await;
            machine.inner.layers.recolor_layer(PICKUP_TO_DROPOFF, ACTIVE_COLOR);
            machine.follow_up(TripStage::PickupToDropoff);
        });
    }

    fn enter_pickup_to_dropoff(&self) {
        let Some((pickup, dropoff)) = self
            .inner
            .store
            .snapshot()
            .endpoints()
            .map(|(pickup, dropoff)| (pickup.clone(), dropoff.clone()))
        else {
            error!("Trip started without pickup and dropoff");
            return;
        };

        let machine = self.clone();
        self.spawn_in_trip(async move {
            let style = LineStyle::PICKUP_TO_DROPOFF;
            let route = match machine
                .inner
                .routes
                .fetch_route(pickup.coordinate(), dropoff.coordinate())
                .await
            {
                Some(route) => {
                    machine
                        .inner
                        .layers
                        .upsert_line_layer(style.id, style.color, &route);
                    route
                }
                None => skipped_leg(&dropoff),
            };
            machine.animate_leg(route, style, TripStage::Completed);
        });
    }

    fn enter_completed(&self) {
        self.inner.layers.remove_layer(PICKUP_TO_DROPOFF);

        let ride_id = {
            let mut session = self.session();
            if session.completion_sent {
                debug!("Completion already reported for this ride");
                return;
            }
            let Some(ride_id) = session.ride.as_ref().and_then(|ride| ride.id.clone()) else {
                warn!("Ride has no id, completion not reported");
                return;
            };
            session.completion_sent = true;
            ride_id
        };

        let rides = self.inner.rides.clone();
        let notices = self.inner.notices.clone();
        // Not tied to the trip token, a reset right after arrival must not
        // swallow the report.
        tokio::spawn(async move {
            let update = StatusUpdate {
                ride_id,
                status: RideStatus::Completed,
            };
            match rides.update_status(&update).await {
                Ok(()) => {
                    info!(ride_id = %update.ride_id, status = %update.status, "Ride status updated");
                    notices.success("The trip has been completed!");
                }
                Err(err) => {
                    error!(ride_id = %update.ride_id, "Failed to update ride status: {err}");
                    notices.error("Failed to update ride status on server");
                }
            }
        });
    }

    // Helpers

    fn ensure_locations_editable(&self) -> Result<(), self::Error> {
        match self.stage() {
            TripStage::SelectLocations => Ok(()),
            stage => Err(Error::LocationsLocked(stage)),
        }
    }

    /// Redraws the trip route and recomputes the quote for the current pair.
    /// The previous quote is dropped before anything is fetched, and a quote
    /// that finishes after the endpoints changed again is discarded.
    async fn endpoints_changed(&self) -> Result<Option<PriceQuote>, self::Error> {
        let Some((pickup, dropoff)) = self
            .inner
            .store
            .snapshot()
            .endpoints()
            .map(|(pickup, dropoff)| (pickup.clone(), dropoff.clone()))
        else {
            return Ok(None);
        };

        let generation = {
            let mut session = self.session();
            session.quote = None;
            session.quote_generation += 1;
            session.quote_generation
        };

        let (_, quote) = tokio::join!(
            self.draw_trip_route(&pickup, &dropoff, generation),
            self.inner.estimator.estimate(&pickup, &dropoff)
        );

        {
            let mut session = self.session();
            if session.quote_generation != generation {
                debug!("Discarding quote for outdated endpoints");
                return Ok(None);
            }
            if let Ok(quote) = &quote {
                session.quote = Some(quote.clone());
            }
        }
        match quote {
            Ok(quote) => Ok(Some(quote)),
            Err(err) => {
                error!("Error calculating price: {err}");
                self.inner
                    .notices
                    .error("Error calculating ride price. Please try again.");
                Err(err.into())
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session().quote_generation == generation
    }

    async fn draw_trip_route(&self, pickup: &Location, dropoff: &Location, generation: u64) {
        let layers = &self.inner.layers;
        layers.remove_layer(PICKUP_TO_DROPOFF);
        let Some(route) = self
            .inner
            .routes
            .fetch_route(pickup.coordinate(), dropoff.coordinate())
            .await
        else {
            return;
        };
        if !self.is_current(generation) {
            debug!("Discarding route for outdated endpoints");
            return;
        }
        layers.upsert_line_layer(PICKUP_TO_DROPOFF, ACTIVE_COLOR, &route);
    }

    async fn create_ride(&self) {
        let state = self.inner.store.snapshot();
        let Some((pickup, dropoff)) = state.endpoints() else {
            self.inner.notices.error("Location information missing");
            self.follow_up(TripStage::SelectLocations);
            return;
        };

        let request = CreateRideRequest::new(pickup, dropoff, state.vehicle_type);
        let response = match self.inner.rides.create_ride(&request).await {
            Ok(response) => response,
            Err(err) => {
                error!("Error creating ride: {err}");
                self.inner
                    .notices
                    .error("Error creating ride. Please try again.");
                self.follow_up(TripStage::SelectLocations);
                return;
            }
        };

        let start = response.driver_location().unwrap_or_else(|| {
            debug!("No driver location in response, placing driver near pickup");
            jitter_near(pickup.coordinate(), self.inner.config.driver_jitter_deg)
        });
        self.inner
            .store
            .set_driver_location(Location::from(start).with_address(DRIVER_LOCATION));

        let ride = RideRecord {
            id: response.data.id.clone(),
            driver: response.driver_info(),
        };
        info!(ride_id = ?ride.id, "Ride created");
        self.session().ride = Some(ride);
        self.follow_up(TripStage::DriverFound);
    }

    fn animate_leg(&self, route: Route, style: LineStyle, next: TripStage) {
        let machine = self.clone();
        self.inner.animator.animate(route, style, move || {
            machine.follow_up(next);
        });
    }

    /// Transition requested by a background task. A refusal means the trip
    /// moved on underneath the task, which is logged and otherwise ignored.
    fn follow_up(&self, to: TripStage) {
        if let Err(err) = self.transition(to) {
            debug!("Dropped follow-up transition: {err}");
        }
    }

    fn spawn_in_trip<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.session().trip.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("Trip task cancelled"),
                _ = task => {}
            }
        });
    }
}

/// A leg without a route: a single waypoint at its end, traversed at once.
fn skipped_leg(end: &Location) -> Route {
    warn!("No route for leg, skipping to {end}");
    Route::from(vec![end.coordinate()])
}

/// Uniform offset around `center` within a square `span` degrees wide.
pub fn jitter_near(center: Coordinate, span: f64) -> Coordinate {
    let mut rng = rand::thread_rng();
    let latitude = (rng.r#gen::<f64>() - 0.5) * span;
    let longitude = (rng.r#gen::<f64>() - 0.5) * span;
    center.offset(latitude, longitude)
}

#[test]
fn jitter_stays_inside_span() {
    let center = Coordinate::new(10.0, 106.0);
    for _ in 0..100 {
        let point = jitter_near(center, 0.018);
        assert!((point.latitude - center.latitude).abs() <= 0.009);
        assert!((point.longitude - center.longitude).abs() <= 0.009);
    }
}
