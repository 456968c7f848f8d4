mod map;
mod trip;
pub use map::*;
pub use trip::*;

use axum::http::StatusCode;
use ridesim::{shared::geo::Coordinate, stage};
use tracing::{error, warn};

/// Parses `lat,lng`.
pub fn parse_coordinate(value: &str) -> Option<Coordinate> {
    let (latitude, longitude) = value.split_once(',')?;
    Some(Coordinate::new(
        latitude.trim().parse().ok()?,
        longitude.trim().parse().ok()?,
    ))
}

fn status_for(err: stage::Error) -> StatusCode {
    match err {
        stage::Error::InvalidTransition { .. } | stage::Error::LocationsLocked(_) => {
            warn!("Refused: {err}");
            StatusCode::CONFLICT
        }
        stage::Error::MissingLocations | stage::Error::PriceUnavailable(_) => {
            warn!("Refused: {err}");
            StatusCode::BAD_REQUEST
        }
        stage::Error::Api(err) => {
            error!("Ride service failed: {err}");
            StatusCode::BAD_GATEWAY
        }
    }
}
