use ridesim::map::{LineLayer, Marker};
use serde::{Deserialize, Serialize};

/// Coordinates go out as GeoJSON `[longitude, latitude]` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDto {
    pub id: String,
    pub color: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl LayerDto {
    pub fn from(layer: &LineLayer) -> Self {
        Self {
            id: layer.id.clone(),
            color: layer.color.clone(),
            coordinates: layer.coordinates.iter().map(|c| c.to_lng_lat()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerDto {
    pub id: String,
    pub color: String,
    pub coordinate: [f64; 2],
}

impl MarkerDto {
    pub fn from(marker: &Marker) -> Self {
        Self {
            id: marker.id.clone(),
            color: marker.color.clone(),
            coordinate: marker.coordinate.to_lng_lat(),
        }
    }
}
