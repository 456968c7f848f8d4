mod http;
pub mod models;
pub use http::*;
pub use models::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Ride service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid url: {0}")]
    Url(String),
}

/// Remote ride and price service.
#[async_trait]
pub trait RideApi: Send + Sync {
    /// `GET /rides/price`. Without a vehicle type the answer carries the base
    /// distance and duration, with one it carries that tier's price.
    async fn price(&self, query: &PriceQuery) -> Result<PriceData, self::Error>;

    /// `POST /rides`
    async fn create_ride(&self, request: &CreateRideRequest) -> Result<CreateRideResponse, self::Error>;

    /// `PUT /rides/status`
    async fn update_status(&self, update: &StatusUpdate) -> Result<(), self::Error>;
}
