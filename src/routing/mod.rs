pub mod mapbox;

use crate::shared::geo::{Coordinate, Distance};
use async_trait::async_trait;
use std::{ops::Deref, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Directions service answered with status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid url: {0}")]
    Url(String),
}

/// Ordered driving polyline. Cheap to clone, never mutated once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Route(Arc<[Coordinate]>);

impl Route {
    pub fn new(points: impl Into<Arc<[Coordinate]>>) -> Self {
        Self(points.into())
    }

    /// Builds a route from GeoJSON style `[longitude, latitude]` pairs.
    pub fn from_lng_lat(points: &[[f64; 2]]) -> Self {
        Self(points.iter().copied().map(Coordinate::from_lng_lat).collect())
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.0.last()
    }

    /// Number of consecutive point pairs.
    pub fn segment_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn segment(&self, index: usize) -> Option<(Coordinate, Coordinate)> {
        Some((*self.0.get(index)?, *self.0.get(index + 1)?))
    }

    pub fn length(&self) -> Distance {
        self.0
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .fold(Distance::ZERO, |acc, d| acc + d)
    }
}

impl Deref for Route {
    type Target = [Coordinate];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Coordinate>> for Route {
    fn from(value: Vec<Coordinate>) -> Self {
        Self(value.into())
    }
}

/// Directions collaborator.
///
/// Failures and empty answers both come back as `None`; callers skip the leg.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn fetch_route(&self, from: Coordinate, to: Coordinate) -> Option<Route>;
}

/// Reverse geocoding collaborator, used to name the current position.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, coordinate: Coordinate) -> Option<String>;
}

#[test]
fn route_from_lng_lat_swaps_axes() {
    let route = Route::from_lng_lat(&[[106.0, 10.0], [106.1, 10.1]]);
    assert_eq!(route.first(), Some(&Coordinate::new(10.0, 106.0)));
    assert_eq!(route.segment_count(), 1);
}
