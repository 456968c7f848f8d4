mod stage;
pub use stage::*;

use crate::{fare::VehicleType, shared::geo::Coordinate};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, sync::Arc};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl From<Coordinate> for Location {
    fn from(value: Coordinate) -> Self {
        Self::new(value.latitude, value.longitude)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{address} ({}, {})", self.latitude, self.longitude),
            None => write!(f, "{}, {}", self.latitude, self.longitude),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripState {
    pub pickup_location: Option<Location>,
    pub dropoff_location: Option<Location>,
    pub driver_location: Option<Location>,
    pub vehicle_type: Option<VehicleType>,
    pub price: Option<f64>,
    pub stage: TripStage,
}

impl TripState {
    pub fn endpoints(&self) -> Option<(&Location, &Location)> {
        Some((
            self.pickup_location.as_ref()?,
            self.dropoff_location.as_ref()?,
        ))
    }
}

/// Single source of truth for the trip.
///
/// Every setter swaps one field as a whole inside `send_modify`, so a reader
/// holding a snapshot never sees half of an update. Subscribers are woken on
/// each write.
#[derive(Debug, Clone)]
pub struct TripStore {
    tx: Arc<watch::Sender<TripState>>,
}

impl Default for TripStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TripStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TripState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> TripState {
        self.tx.borrow().clone()
    }

    pub fn stage(&self) -> TripStage {
        self.tx.borrow().stage
    }

    pub fn subscribe(&self) -> watch::Receiver<TripState> {
        self.tx.subscribe()
    }

    pub fn set_pickup_location(&self, location: Location) {
        self.tx.send_modify(|state| state.pickup_location = Some(location));
    }

    pub fn set_dropoff_location(&self, location: Location) {
        self.tx.send_modify(|state| state.dropoff_location = Some(location));
    }

    pub fn set_driver_location(&self, location: Location) {
        self.tx.send_modify(|state| state.driver_location = Some(location));
    }

    pub fn set_vehicle_type(&self, vehicle_type: VehicleType) {
        self.tx
            .send_modify(|state| state.vehicle_type = Some(vehicle_type));
    }

    pub fn set_price(&self, price: f64) {
        self.tx.send_modify(|state| state.price = Some(price));
    }

    pub fn set_stage(&self, stage: TripStage) {
        debug!(%stage, "Stage set");
        self.tx.send_modify(|state| state.stage = stage);
    }

    /// Moves to `to` if `allowed` accepts the current stage, in one write.
    /// Returns the stage that was left, or the stage that refused the move.
    pub fn try_set_stage(
        &self,
        to: TripStage,
        allowed: impl FnOnce(TripStage) -> bool,
    ) -> Result<TripStage, TripStage> {
        let mut result = Err(to);
        self.tx.send_if_modified(|state| {
            let from = state.stage;
            if allowed(from) {
                state.stage = to;
                result = Ok(from);
                true
            } else {
                result = Err(from);
                false
            }
        });
        result
    }

    /// Restores the shape the store had at startup.
    pub fn reset(&self) {
        self.tx.send_replace(TripState::default());
    }
}
