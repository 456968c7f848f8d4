use crate::{
    api::{self, PriceQuery, RideApi},
    trip::Location,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr, sync::Arc};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Bike,
    Car,
    Luxury,
}

impl VehicleType {
    /// Supported tiers, in the order they are priced and listed.
    pub const ALL: [VehicleType; 3] = [VehicleType::Bike, VehicleType::Car, VehicleType::Luxury];

    /// Tag understood by the ride service.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Bike => "BIKE",
            VehicleType::Car => "CAR",
            VehicleType::Luxury => "LUXURY",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            VehicleType::Bike => "Bike",
            VehicleType::Car => "Car",
            VehicleType::Luxury => "Luxury",
        }
    }
}

impl Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown vehicle type {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub distance_km: f64,
    pub duration_min: f64,
    /// One entry per supported tier, `None` where that tier failed to price.
    pub per_vehicle: BTreeMap<VehicleType, Option<f64>>,
}

impl PriceQuote {
    pub fn price(&self, vehicle_type: VehicleType) -> Option<f64> {
        self.per_vehicle.get(&vehicle_type).copied().flatten()
    }

    pub fn available(&self) -> impl Iterator<Item = (VehicleType, f64)> + '_ {
        self.per_vehicle
            .iter()
            .filter_map(|(tier, price)| price.map(|price| (*tier, price)))
    }
}

#[derive(Clone)]
pub struct FareEstimator {
    api: Arc<dyn RideApi>,
}

impl FareEstimator {
    pub fn new(api: Arc<dyn RideApi>) -> Self {
        Self { api }
    }

    /// One base request for distance and duration, then one request per tier.
    /// A failed base request fails the quote; a failed tier only blanks that
    /// tier.
    pub async fn estimate(
        &self,
        pickup: &Location,
        dropoff: &Location,
    ) -> Result<PriceQuote, api::Error> {
        let (from, to) = (pickup.coordinate(), dropoff.coordinate());
        let base = self.api.price(&PriceQuery::base(from, to)).await?;
        debug!(
            distance_km = base.distance,
            duration_min = base.duration,
            "Base price computed"
        );

        let mut per_vehicle = BTreeMap::new();
        for tier in VehicleType::ALL {
            let price = match self.api.price(&PriceQuery::tier(from, to, tier)).await {
                Ok(data) => data.price,
                Err(err) => {
                    warn!(%tier, "Failed to price tier: {err}");
                    None
                }
            };
            per_vehicle.insert(tier, price);
        }

        Ok(PriceQuote {
            distance_km: base.distance,
            duration_min: base.duration,
            per_vehicle,
        })
    }
}

#[test]
fn vehicle_type_parses_service_tags() {
    assert_eq!("LUXURY".parse::<VehicleType>(), Ok(VehicleType::Luxury));
    assert_eq!("bike".parse::<VehicleType>(), Ok(VehicleType::Bike));
    assert!("VAN".parse::<VehicleType>().is_err());
}
