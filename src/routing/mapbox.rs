use crate::{
    config::Config,
    routing::{self, Geocoder, Route, RouteProvider},
    shared::geo::Coordinate,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    place_name: Option<String>,
}

/// Driving directions and reverse geocoding backed by the Mapbox web APIs.
#[derive(Debug, Clone)]
pub struct MapboxClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl MapboxClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.mapbox_token.is_none() {
            warn!("Mapbox API token is missing, set MAPBOX_API_KEY");
        }
        Self::new(
            config.mapbox_url.clone(),
            config.mapbox_token.clone().unwrap_or_default(),
        )
    }

    fn directions_url(&self, from: Coordinate, to: Coordinate) -> Result<Url, routing::Error> {
        let url = format!(
            "{}/directions/v5/mapbox/driving/{},{};{},{}",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude
        );
        Url::parse_with_params(
            &url,
            &[("geometries", "geojson"), ("access_token", self.token.as_str())],
        )
        .map_err(|err| routing::Error::Url(err.to_string()))
    }

    fn geocoding_url(&self, coordinate: Coordinate) -> Result<Url, routing::Error> {
        let url = format!(
            "{}/geocoding/v5/mapbox.places/{},{}.json",
            self.base_url, coordinate.longitude, coordinate.latitude
        );
        Url::parse_with_params(&url, &[("access_token", self.token.as_str())])
            .map_err(|err| routing::Error::Url(err.to_string()))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, routing::Error> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(routing::Error::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn try_fetch_route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Option<Route>, routing::Error> {
        let url = self.directions_url(from, to)?;
        let response: DirectionsResponse = self.get(url).await?;
        Ok(response
            .routes
            .into_iter()
            .next()
            .map(|route| route.geometry.coordinates)
            .filter(|coordinates| !coordinates.is_empty())
            .map(|coordinates| Route::from_lng_lat(&coordinates)))
    }
}

#[async_trait]
impl RouteProvider for MapboxClient {
    async fn fetch_route(&self, from: Coordinate, to: Coordinate) -> Option<Route> {
        match self.try_fetch_route(from, to).await {
            Ok(Some(route)) => {
                debug!(points = route.len(), "Fetched route from {from} to {to}");
                Some(route)
            }
            Ok(None) => {
                warn!("No route between {from} and {to}");
                None
            }
            Err(err) => {
                warn!("Failed to fetch route from {from} to {to}: {err}");
                None
            }
        }
    }
}

#[async_trait]
impl Geocoder for MapboxClient {
    async fn reverse(&self, coordinate: Coordinate) -> Option<String> {
        let url = self.geocoding_url(coordinate).ok()?;
        match self.get::<GeocodingResponse>(url).await {
            Ok(response) => response
                .features
                .into_iter()
                .find_map(|feature| feature.place_name),
            Err(err) => {
                warn!("Failed to reverse geocode {coordinate}: {err}");
                None
            }
        }
    }
}

#[test]
fn directions_url_uses_lng_lat_order() {
    let client = MapboxClient::new("https://api.mapbox.com/", "token");
    let url = client
        .directions_url(Coordinate::new(10.0, 106.0), Coordinate::new(10.05, 106.05))
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.mapbox.com/directions/v5/mapbox/driving/106,10;106.05,10.05?geometries=geojson&access_token=token"
    );
}

#[test]
fn directions_body_parses_first_route() {
    let body = r#"{"routes":[{"geometry":{"coordinates":[[106.0,10.0],[106.01,10.02]]}}]}"#;
    let response: DirectionsResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.routes[0].geometry.coordinates.len(), 2);
}
