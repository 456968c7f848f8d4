use crate::{
    dto::{LayerDto, MarkerDto},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn layers(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let result: Vec<_> = state.layers.layers().iter().map(LayerDto::from).collect();
    Ok(Json(result).into_response())
}

pub async fn markers(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let result: Vec<_> = state.layers.markers().iter().map(MarkerDto::from).collect();
    Ok(Json(result).into_response())
}

pub async fn notices(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    Ok(Json(state.machine.notices().list()).into_response())
}

pub async fn dismiss_notice(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    if state.machine.notices().dismiss(id) {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
