use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TripStage {
    #[default]
    SelectLocations,
    SelectVehicle,
    ConfirmRide,
    FindingDriver,
    DriverFound,
    DriverToPickUp,
    DriverArrivedPickUp,
    PickupToDropoff,
    Completed,
}

impl TripStage {
    pub const ALL: [TripStage; 9] = [
        TripStage::SelectLocations,
        TripStage::SelectVehicle,
        TripStage::ConfirmRide,
        TripStage::FindingDriver,
        TripStage::DriverFound,
        TripStage::DriverToPickUp,
        TripStage::DriverArrivedPickUp,
        TripStage::PickupToDropoff,
        TripStage::Completed,
    ];

    /// The stage reached by the forward edge out of this one.
    pub const fn next(&self) -> Option<TripStage> {
        match self {
            TripStage::SelectLocations => Some(TripStage::SelectVehicle),
            TripStage::SelectVehicle => Some(TripStage::ConfirmRide),
            TripStage::ConfirmRide => Some(TripStage::FindingDriver),
            TripStage::FindingDriver => Some(TripStage::DriverFound),
            TripStage::DriverFound => Some(TripStage::DriverToPickUp),
            TripStage::DriverToPickUp => Some(TripStage::DriverArrivedPickUp),
            TripStage::DriverArrivedPickUp => Some(TripStage::PickupToDropoff),
            TripStage::PickupToDropoff => Some(TripStage::Completed),
            TripStage::Completed => None,
        }
    }

    /// Forward edges, the ride creation revert and the restart edge.
    /// Everything else would skip or rewind a stage.
    pub fn can_advance_to(&self, to: TripStage) -> bool {
        match (self, to) {
            (TripStage::FindingDriver, TripStage::SelectLocations) => true,
            (TripStage::Completed, TripStage::SelectLocations) => true,
            (from, to) => from.next() == Some(to),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TripStage::SelectLocations => "selectLocations",
            TripStage::SelectVehicle => "selectVehicle",
            TripStage::ConfirmRide => "confirmRide",
            TripStage::FindingDriver => "findingDriver",
            TripStage::DriverFound => "driverFound",
            TripStage::DriverToPickUp => "driverToPickUp",
            TripStage::DriverArrivedPickUp => "driverArrivedPickUp",
            TripStage::PickupToDropoff => "pickupToDropoff",
            TripStage::Completed => "completed",
        }
    }
}

impl Display for TripStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[test]
fn forward_chain_visits_every_stage() {
    let mut stage = TripStage::SelectLocations;
    let mut visited = vec![stage];
    while let Some(next) = stage.next() {
        assert!(stage.can_advance_to(next));
        visited.push(next);
        stage = next;
    }
    assert_eq!(visited, TripStage::ALL);
}

#[test]
fn skipping_a_stage_is_rejected() {
    assert!(!TripStage::SelectLocations.can_advance_to(TripStage::ConfirmRide));
    assert!(!TripStage::DriverFound.can_advance_to(TripStage::DriverArrivedPickUp));
    assert!(!TripStage::PickupToDropoff.can_advance_to(TripStage::SelectLocations));
}
