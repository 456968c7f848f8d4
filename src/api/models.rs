use crate::{
    fare::VehicleType,
    shared::geo::Coordinate,
    trip::Location,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Every response of the ride service is wrapped in `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
    pub vehicle_type: Option<VehicleType>,
}

impl PriceQuery {
    pub fn base(pickup: Coordinate, dropoff: Coordinate) -> Self {
        Self {
            pickup,
            dropoff,
            vehicle_type: None,
        }
    }

    pub fn tier(pickup: Coordinate, dropoff: Coordinate, vehicle_type: VehicleType) -> Self {
        Self {
            pickup,
            dropoff,
            vehicle_type: Some(vehicle_type),
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pickupLat", self.pickup.latitude.to_string()),
            ("pickupLng", self.pickup.longitude.to_string()),
            ("dropoffLat", self.dropoff.latitude.to_string()),
            ("dropoffLng", self.dropoff.longitude.to_string()),
        ];
        if let Some(vehicle_type) = self.vehicle_type {
            params.push(("vehicleType", vehicle_type.as_str().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    /// Kilometers
    #[serde(default)]
    pub distance: f64,
    /// Minutes
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideRequest {
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub pickup_address: Option<String>,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_address: Option<String>,
    pub vehicle_type: Option<VehicleType>,
}

impl CreateRideRequest {
    pub fn new(pickup: &Location, dropoff: &Location, vehicle_type: Option<VehicleType>) -> Self {
        Self {
            pickup_latitude: pickup.latitude,
            pickup_longitude: pickup.longitude,
            pickup_address: pickup.address.clone(),
            dropoff_latitude: dropoff.latitude,
            dropoff_longitude: dropoff.longitude,
            dropoff_address: dropoff.address.clone(),
            vehicle_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub profile_img: Option<String>,
    pub current_location: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RideDriver {
    pub id: Option<String>,
    pub user: Option<DriverUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RideData {
    pub id: Option<String>,
    pub driver: Option<RideDriver>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRideResponse {
    pub data: RideData,
    /// Some deployments place the assigned driver next to `data`.
    #[serde(default)]
    pub driver: Option<RideDriver>,
}

impl CreateRideResponse {
    /// Where the assigned driver currently is, if the service told us.
    pub fn driver_location(&self) -> Option<Coordinate> {
        [self.data.driver.as_ref(), self.driver.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|driver| driver.user.as_ref()?.current_location)
    }

    pub fn driver_info(&self) -> Option<DriverInfo> {
        let driver = self.data.driver.as_ref()?;
        let user = driver.user.as_ref()?;
        Some(DriverInfo {
            id: driver.id.clone(),
            first_name: user.first_name.clone().unwrap_or_else(|| "Driver".into()),
            last_name: user.last_name.clone().unwrap_or_default(),
            phone: user.phone.clone().unwrap_or_else(|| "Not available".into()),
            profile_img: user.profile_img.clone(),
        })
    }
}

/// Identity of the assigned driver, kept for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub profile_img: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRecord {
    /// Tags the terminal status update.
    pub id: Option<String>,
    pub driver: Option<DriverInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Completed,
}

impl Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RideStatus::Completed => f.write_str("COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub ride_id: String,
    pub status: RideStatus,
}

#[test]
fn create_response_reads_nested_driver_location() {
    let body = r#"{"data":{"id":"r1","driver":{"id":"d1","user":{"firstName":"An","currentLocation":{"latitude":10.01,"longitude":106.01}}}}}"#;
    let response: CreateRideResponse = serde_json::from_str(body).unwrap();
    assert_eq!(
        response.driver_location(),
        Some(Coordinate::new(10.01, 106.01))
    );
    let info = response.driver_info().unwrap();
    assert_eq!(info.first_name, "An");
    assert_eq!(info.phone, "Not available");
}

#[test]
fn create_response_without_driver() {
    let body = r#"{"data":{"id":"r1"}}"#;
    let response: CreateRideResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.driver_location(), None);
    assert_eq!(response.driver_info(), None);
}

#[test]
fn status_update_wire_shape() {
    let update = StatusUpdate {
        ride_id: "r1".into(),
        status: RideStatus::Completed,
    };
    assert_eq!(
        serde_json::to_string(&update).unwrap(),
        r#"{"rideId":"r1","status":"COMPLETED"}"#
    );
}
