pub mod animator;
pub mod api;
pub mod config;
pub mod fare;
pub mod map;
pub mod notice;
pub mod routing;
pub mod shared;
pub mod stage;
pub mod trip;

pub mod prelude {
    pub use crate::animator::{AnimationHandle, Animator, Traversal};
    pub use crate::api::{HttpRideApi, RideApi, RideRecord};
    pub use crate::config::{AnimationConfig, Config};
    pub use crate::fare::{FareEstimator, PriceQuote, VehicleType};
    pub use crate::map::{LayerStore, LineStyle, MapLayers, MapSync};
    pub use crate::notice::{Notice, Notices};
    pub use crate::routing::{Geocoder, Route, RouteProvider, mapbox::MapboxClient};
    pub use crate::shared::geo::{Coordinate, Distance, distance_km};
    pub use crate::stage::{Collaborators, StageMachine};
    pub use crate::trip::{Location, TripStage, TripState, TripStore};
}
