use crate::{
    api::{parse_coordinate, status_for},
    dto::TripDto,
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ridesim::prelude::*;
use std::{collections::HashMap, sync::Arc};

pub async fn trip(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    Ok(Json(TripDto::from(&state.machine)).into_response())
}

pub async fn pickup(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let location = location_from_params(&params)?;
    let quote = state
        .machine
        .select_pickup(location)
        .await
        .map_err(status_for)?;
    Ok(Json(quote).into_response())
}

pub async fn dropoff(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let location = location_from_params(&params)?;
    let quote = state
        .machine
        .select_dropoff(location)
        .await
        .map_err(status_for)?;
    Ok(Json(quote).into_response())
}

pub async fn confirm_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    state.machine.confirm_locations().map_err(status_for)?;
    Ok(Json(TripDto::from(&state.machine)).into_response())
}

pub async fn quote(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    match state.machine.quote() {
        Some(quote) => Ok(Json(quote).into_response()),
        None => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn vehicle(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let vehicle_type: VehicleType = params
        .get("type")
        .ok_or(StatusCode::BAD_REQUEST)?
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    state
        .machine
        .select_vehicle(vehicle_type)
        .map_err(status_for)?;
    Ok(Json(TripDto::from(&state.machine)).into_response())
}

pub async fn confirm(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    state.machine.confirm_ride().map_err(status_for)?;
    Ok(Json(TripDto::from(&state.machine)).into_response())
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    state.machine.reset();
    Ok(Json(TripDto::from(&state.machine)).into_response())
}

/// `at=lat,lng` plus an optional `address`.
fn location_from_params(params: &HashMap<String, String>) -> Result<Location, StatusCode> {
    let at = params.get("at").ok_or(StatusCode::BAD_REQUEST)?;
    let coordinate = parse_coordinate(at).ok_or(StatusCode::BAD_REQUEST)?;
    let location = Location::from(coordinate);
    Ok(match params.get("address") {
        Some(address) => location.with_address(address.as_str()),
        None => location,
    })
}
