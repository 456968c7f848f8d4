use ridesim::{
    map::{DRIVER_TO_PICKUP, MapLayers},
    prelude::*,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

fn animator() -> (Animator, TripStore, LayerStore) {
    let store = TripStore::new();
    let layers = LayerStore::new();
    let animator = Animator::new(
        store.clone(),
        Arc::new(layers.clone()),
        AnimationConfig::default(),
    );
    (animator, store, layers)
}

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = count.clone();
    (count, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

fn driver(store: &TripStore) -> Option<Coordinate> {
    store.snapshot().driver_location.map(|l| l.coordinate())
}

#[test]
fn tick_distance_follows_speed() {
    let (animator, ..) = animator();
    assert!((animator.tick_distance_km(36.0) - 0.001).abs() < 1e-12);
}

#[tokio::test(start_paused = true)]
async fn finishes_once_on_last_waypoint() {
    let (animator, store, layers) = animator();
    let a = Coordinate::new(10.0, 106.0);
    let b = Coordinate::new(10.0, 106.001);
    let c = Coordinate::new(10.001, 106.001);
    let (finished, on_finish) = counter();

    animator
        .animate(vec![a, b, c].into(), LineStyle::DRIVER_TO_PICKUP, on_finish)
        .join()
        .await;

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(driver(&store), Some(c));
    assert_eq!(layers.layer(DRIVER_TO_PICKUP).unwrap().coordinates, vec![c]);
    assert_eq!(animator.speed(), None);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn positions_never_move_backwards() {
    let (animator, store, _) = animator();
    let start = Coordinate::new(10.0, 106.0);
    let end = Coordinate::new(10.0, 106.003);
    let mut rx = store.subscribe();
    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let longitude = rx
                .borrow_and_update()
                .driver_location
                .as_ref()
                .map(|location| location.longitude);
            if let Some(longitude) = longitude {
                seen.push(longitude);
                if longitude == end.longitude {
                    break;
                }
            }
        }
        seen
    });

    animator
        .animate(vec![start, end].into(), LineStyle::DRIVER_TO_PICKUP, || {})
        .join()
        .await;
    let seen = collector.await.unwrap();

    assert!(seen.len() > 1);
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(seen.last(), Some(&end.longitude));
}

#[tokio::test(start_paused = true)]
async fn duplicate_waypoints_are_skipped() {
    let (animator, store, _) = animator();
    let a = Coordinate::new(10.0, 106.0);
    let b = Coordinate::new(10.0, 106.001);
    let (finished, on_finish) = counter();

    animator
        .animate(vec![a, a, b, b].into(), LineStyle::DRIVER_TO_PICKUP, on_finish)
        .join()
        .await;

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(driver(&store), Some(b));
}

#[tokio::test(start_paused = true)]
async fn single_point_route_lands_on_it() {
    let (animator, store, layers) = animator();
    let a = Coordinate::new(10.0, 106.0);
    let (finished, on_finish) = counter();

    animator
        .animate(vec![a].into(), LineStyle::DRIVER_TO_PICKUP, on_finish)
        .join()
        .await;

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(driver(&store), Some(a));
    assert!(!layers.has_layer(DRIVER_TO_PICKUP));
}

#[tokio::test(start_paused = true)]
async fn empty_route_finishes_without_moving() {
    let (animator, store, _) = animator();
    let (finished, on_finish) = counter();

    animator
        .animate(Vec::<Coordinate>::new().into(), LineStyle::DRIVER_TO_PICKUP, on_finish)
        .join()
        .await;

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(driver(&store), None);
}

#[tokio::test(start_paused = true)]
async fn new_traversal_cancels_previous() {
    let (animator, store, _) = animator();
    let far = vec![Coordinate::new(10.0, 106.0), Coordinate::new(10.1, 106.1)];
    let near = vec![Coordinate::new(11.0, 107.0), Coordinate::new(11.0, 107.001)];
    let (first_finished, first_done) = counter();
    let (second_finished, second_done) = counter();

    let first = animator.animate(far.into(), LineStyle::DRIVER_TO_PICKUP, first_done);
    tokio::time::sleep(Duration::from_secs(1)).await;
    let second = animator.animate(near.clone().into(), LineStyle::DRIVER_TO_PICKUP, second_done);
    assert!(first.is_cancelled());

    second.join().await;
    first.join().await;
    let landed = driver(&store);
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(landed, Some(near[1]));
    assert_eq!(driver(&store), landed);
    assert_eq!(first_finished.load(Ordering::SeqCst), 0);
    assert_eq!(second_finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_without_finishing() {
    let (animator, store, _) = animator();
    let route = vec![Coordinate::new(10.0, 106.0), Coordinate::new(10.1, 106.1)];
    let (finished, on_finish) = counter();

    let handle = animator.animate(route.into(), LineStyle::DRIVER_TO_PICKUP, on_finish);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(animator.speed().is_some());
    animator.cancel();
    handle.join().await;
    let stopped = driver(&store);
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(driver(&store), stopped);
    assert_eq!(finished.load(Ordering::SeqCst), 0);
    assert_eq!(animator.speed(), None);
}

#[test]
fn traversal_starts_after_leading_duplicates() {
    let a = Coordinate::new(10.0, 106.0);
    let b = Coordinate::new(10.0, 106.001);
    let traversal = Traversal::new(vec![a, a, b].into());
    assert_eq!(traversal.segment(), 1);
    assert!(!traversal.is_finished());
}
