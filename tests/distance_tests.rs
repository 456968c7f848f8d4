use ridesim::shared::geo::{Coordinate, Distance, distance_km};

#[test]
fn distance_test() {
    let d = distance_km(106.0, 10.0, 106.05, 10.05);
    assert!((d - 7.80).abs() < 0.01, "got {d}");
}

#[test]
fn distance_is_symmetric() {
    let a = Coordinate::new(10.762622, 106.660172);
    let b = Coordinate::new(10.776889, 106.700806);
    assert_eq!(a.distance(&b), b.distance(&a));
}

#[test]
fn identical_points_are_zero_apart() {
    let a = Coordinate::new(10.0, 106.0);
    assert_eq!(a.distance(&a), Distance::ZERO);
    assert_eq!(distance_km(106.0, 10.0, 106.0, 10.0), 0.0);
}

#[test]
fn small_offsets_are_short() {
    let d = distance_km(106.0, 10.0, 106.0002, 10.0);
    assert!((d - 0.0219).abs() < 0.0005, "got {d}");
}

#[test]
fn distance_cmp_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b)
}
