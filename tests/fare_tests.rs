mod common;

use common::{FakeRides, dropoff, pickup, tier_price};
use ridesim::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn one_base_and_one_request_per_tier() {
    let rides = Arc::new(FakeRides::default());
    let estimator = FareEstimator::new(rides.clone());

    let quote = estimator
        .estimate(&Location::new(10.0, 106.0), &Location::new(10.05, 106.05))
        .await
        .unwrap();

    assert_eq!(rides.base_requests(), 1);
    assert_eq!(rides.tier_requests(), VehicleType::ALL.to_vec());
    assert!((quote.distance_km - 7.80).abs() < 0.01);
    assert_eq!(quote.duration_min, 21.0);
    for tier in VehicleType::ALL {
        assert_eq!(quote.price(tier), Some(tier_price(tier)));
    }
}

#[tokio::test]
async fn failed_tier_is_left_unpriced() {
    let rides = Arc::new(FakeRides {
        failing_tier: Some(VehicleType::Luxury),
        ..Default::default()
    });
    let estimator = FareEstimator::new(rides.clone());

    let quote = estimator.estimate(&pickup(), &dropoff()).await.unwrap();

    assert_eq!(quote.per_vehicle.len(), 3);
    assert_eq!(quote.price(VehicleType::Luxury), None);
    assert_eq!(quote.price(VehicleType::Car), Some(20.0));
    assert_eq!(quote.available().count(), 2);
}

#[tokio::test]
async fn failed_base_request_fails_quote() {
    let rides = Arc::new(FakeRides {
        fail_base: true,
        ..Default::default()
    });
    let estimator = FareEstimator::new(rides.clone());

    assert!(estimator.estimate(&pickup(), &dropoff()).await.is_err());
    assert!(rides.tier_requests().is_empty());
}
