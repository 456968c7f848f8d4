mod traversal;
pub use traversal::*;

use crate::{
    config::AnimationConfig,
    map::{LineStyle, MapLayers},
    routing::Route,
    shared::geo::Coordinate,
    trip::{Location, TripStore},
};
use rand::Rng;
use std::sync::{Arc, Mutex};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A running traversal. Dropping the handle does not stop it.
#[derive(Debug)]
pub struct AnimationHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl AnimationHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits until the traversal either completed or observed cancellation.
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            debug!("Animation task ended abnormally: {err}");
        }
    }
}

/// Drives the driver location along routes on a fixed tick.
///
/// At most one traversal publishes at a time: starting a new one cancels the
/// previous one before its first tick.
#[derive(Clone)]
pub struct Animator {
    store: TripStore,
    layers: Arc<dyn MapLayers>,
    config: AnimationConfig,
    current: Arc<Mutex<Option<CancellationToken>>>,
    speed: Arc<watch::Sender<Option<f64>>>,
}

impl Animator {
    pub fn new(store: TripStore, layers: Arc<dyn MapLayers>, config: AnimationConfig) -> Self {
        let (speed, _) = watch::channel(None);
        Self {
            store,
            layers,
            config,
            current: Default::default(),
            speed: Arc::new(speed),
        }
    }

    /// Last sampled speed in km/h, `None` while nothing is moving.
    pub fn speed(&self) -> Option<f64> {
        *self.speed.borrow()
    }

    /// Stops the running traversal, if any. Its `on_finish` never fires.
    pub fn cancel(&self) {
        if let Some(token) = self.replace_current(None) {
            token.cancel();
            self.speed.send_replace(None);
        }
    }

    fn replace_current(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *current, token)
    }

    /// Walks `route` segment by segment, publishing the driver location and
    /// redrawing `style`'s layer as `[position, ...remaining]` on every tick.
    /// `on_finish` runs once after the last waypoint has been published.
    pub fn animate<F>(&self, route: Route, style: LineStyle, on_finish: F) -> AnimationHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.replace_current(Some(token.clone())) {
            debug!("Cancelling previous traversal");
            previous.cancel();
        }

        let animator = self.clone();
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            animator.run(route, style, task_token, on_finish).await;
        });
        AnimationHandle { token, task }
    }

    async fn run<F>(&self, route: Route, style: LineStyle, token: CancellationToken, on_finish: F)
    where
        F: FnOnce() + Send + 'static,
    {
        debug!(
            layer = style.id,
            points = route.len(),
            length_km = route.length().as_kilometers(),
            "Traversal started"
        );
        let last = route.last().copied();
        let mut traversal = Traversal::new(route);
        let tick = self.config.tick;
        let mut interval = time::interval_at(Instant::now() + tick, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut moved = false;
        while !traversal.is_finished() {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(layer = style.id, "Traversal cancelled");
                    return;
                }
                _ = interval.tick() => {}
            }

            let speed = self.sample_speed();
            self.speed.send_replace(Some(speed));
            if let Some(position) = traversal.advance(self.tick_distance_km(speed)) {
                self.publish(&traversal, style, position);
                moved = true;
            }
        }

        if token.is_cancelled() {
            return;
        }
        // Routes without a single non-empty segment never ticked
        if !moved && let Some(last) = last {
            self.store.set_driver_location(last.into());
        }
        self.speed.send_replace(None);
        debug!(layer = style.id, "Traversal finished");
        on_finish();
    }

    fn publish(&self, traversal: &Traversal, style: LineStyle, position: Coordinate) {
        self.store.set_driver_location(Location::from(position));
        self.layers
            .upsert_line_layer(style.id, style.color, &traversal.remaining(position));
    }

    fn sample_speed(&self) -> f64 {
        rand::thread_rng().gen_range(self.config.min_speed_kmh..=self.config.max_speed_kmh)
    }

    /// Kilometers covered during one tick at `speed_kmh`.
    pub fn tick_distance_km(&self, speed_kmh: f64) -> f64 {
        speed_kmh / 3600.0 * self.config.tick.as_secs_f64() * self.config.time_scale
    }
}
