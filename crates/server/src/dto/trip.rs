use ridesim::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDto {
    pub stage: TripStage,
    pub pickup_location: Option<Location>,
    pub dropoff_location: Option<Location>,
    pub driver_location: Option<Location>,
    pub vehicle_type: Option<VehicleType>,
    pub price: Option<f64>,
    /// Live driver speed in km/h while a leg is animated.
    pub speed_kmh: Option<f64>,
    pub ride: Option<RideRecord>,
    pub quote: Option<PriceQuote>,
}

impl TripDto {
    pub fn from(machine: &StageMachine) -> Self {
        let state = machine.store().snapshot();
        Self {
            stage: state.stage,
            pickup_location: state.pickup_location,
            dropoff_location: state.dropoff_location,
            driver_location: state.driver_location,
            vehicle_type: state.vehicle_type,
            price: state.price,
            speed_kmh: machine.animator().speed(),
            ride: machine.ride(),
            quote: machine.quote(),
        }
    }
}
