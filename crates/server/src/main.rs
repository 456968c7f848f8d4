mod api;
mod dto;
mod state;

use crate::state::AppState;
use axum::routing::{delete, get, post};
use ridesim::prelude::*;
use std::sync::Arc;
use tracing::{error, info, warn};

const PORT: u32 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    info!("Starting server...");
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let layers = LayerStore::new();
    let mapbox = Arc::new(MapboxClient::from_config(&config));
    let machine = StageMachine::new(
        config.clone(),
        Collaborators {
            rides: Arc::new(HttpRideApi::new(&config.api_url)),
            routes: mapbox.clone(),
            geocoder: mapbox,
            layers: Arc::new(layers.clone()),
        },
    );
    MapSync::new(Arc::new(layers.clone())).spawn(machine.store());

    // Optional device position as `lat,lng`
    let position = std::env::args().nth(1).and_then(|arg| {
        let position = api::parse_coordinate(&arg);
        if position.is_none() {
            warn!("Ignoring malformed position {arg}");
        }
        position
    });
    if let Err(err) = machine.use_current_position(position).await {
        warn!("No default pickup: {err}");
    }

    let state = Arc::new(AppState::new(machine, layers));
    let app = axum::Router::new()
        .route("/trip", get(api::trip))
        .route("/trip/pickup", post(api::pickup))
        .route("/trip/dropoff", post(api::dropoff))
        .route("/trip/confirm-locations", post(api::confirm_locations))
        .route("/trip/quote", get(api::quote))
        .route("/trip/vehicle", post(api::vehicle))
        .route("/trip/confirm", post(api::confirm))
        .route("/trip/reset", post(api::reset))
        .route("/layers", get(api::layers))
        .route("/markers", get(api::markers))
        .route("/notices", get(api::notices))
        .route("/notices/{id}", delete(api::dismiss_notice))
        .with_state(state);
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", PORT)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind port {PORT}: {err}");
            std::process::exit(1);
        }
    };
    info!("Listening to port {PORT}");
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server stopped: {err}");
    }
}
