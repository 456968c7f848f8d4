use std::{env, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Environment variable {name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Speed range {min}..={max} km/h is empty")]
    EmptySpeedRange { min: f64, max: f64 },
    #[error("Animation tick must be longer than zero")]
    ZeroTick,
    #[error("Time scale must be a positive number, got {0}")]
    InvalidTimeScale(f64),
}

/// Tick loop parameters of the route animator.
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    pub tick: Duration,
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Multiplies the distance covered per tick. `1.0` is real time.
    pub time_scale: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            min_speed_kmh: 20.0,
            max_speed_kmh: 30.0,
            time_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub mapbox_url: String,
    pub mapbox_token: Option<String>,
    pub animation: AnimationConfig,
    pub pickup_dwell: Duration,
    /// Width in degrees of the window the fallback driver position is drawn
    /// from, centered on the pickup.
    pub driver_jitter_deg: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".into(),
            mapbox_url: "https://api.mapbox.com".into(),
            mapbox_token: None,
            animation: AnimationConfig::default(),
            pickup_dwell: Duration::from_secs(5),
            driver_jitter_deg: 0.018,
        }
    }
}

impl Config {
    /// Starts from the defaults and overrides every field that has a
    /// matching environment variable set.
    pub fn from_env() -> Result<Self, self::Error> {
        let mut config = Self::default();
        if let Ok(url) = env::var("RIDESIM_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = env::var("RIDESIM_MAPBOX_URL") {
            config.mapbox_url = url;
        }
        config.mapbox_token = env::var("MAPBOX_API_KEY").ok();
        if let Some(millis) = parse_var::<u64>("RIDESIM_TICK_MS")? {
            config.animation.tick = Duration::from_millis(millis);
        }
        if let Some(speed) = parse_var("RIDESIM_MIN_SPEED_KMH")? {
            config.animation.min_speed_kmh = speed;
        }
        if let Some(speed) = parse_var("RIDESIM_MAX_SPEED_KMH")? {
            config.animation.max_speed_kmh = speed;
        }
        if let Some(scale) = parse_var("RIDESIM_TIME_SCALE")? {
            config.animation.time_scale = scale;
        }
        if let Some(secs) = parse_var::<u64>("RIDESIM_PICKUP_DWELL_SECS")? {
            config.pickup_dwell = Duration::from_secs(secs);
        }
        if let Some(jitter) = parse_var("RIDESIM_DRIVER_JITTER_DEG")? {
            config.driver_jitter_deg = jitter;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), self::Error> {
        let AnimationConfig {
            tick,
            min_speed_kmh,
            max_speed_kmh,
            time_scale,
        } = self.animation;
        if tick.is_zero() {
            return Err(Error::ZeroTick);
        }
        if !(time_scale > 0.0 && time_scale.is_finite()) {
            return Err(Error::InvalidTimeScale(time_scale));
        }
        if !(min_speed_kmh > 0.0 && min_speed_kmh <= max_speed_kmh && max_speed_kmh.is_finite()) {
            return Err(Error::EmptySpeedRange {
                min: min_speed_kmh,
                max: max_speed_kmh,
            });
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, self::Error> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

#[test]
fn default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn inverted_speed_range_is_rejected() {
    let mut config = Config::default();
    config.animation.min_speed_kmh = 40.0;
    assert!(config.validate().is_err());
}

#[test]
fn zero_tick_is_rejected() {
    let mut config = Config::default();
    config.animation.tick = Duration::ZERO;
    assert!(matches!(config.validate(), Err(Error::ZeroTick)));
}

#[test]
fn non_positive_time_scale_is_rejected() {
    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let mut config = Config::default();
        config.animation.time_scale = scale;
        assert!(matches!(config.validate(), Err(Error::InvalidTimeScale(_))));
    }
}

#[test]
fn non_finite_speeds_are_rejected() {
    for (min, max) in [(f64::NAN, 30.0), (20.0, f64::NAN), (20.0, f64::INFINITY)] {
        let mut config = Config::default();
        config.animation.min_speed_kmh = min;
        config.animation.max_speed_kmh = max;
        assert!(matches!(
            config.validate(),
            Err(Error::EmptySpeedRange { .. })
        ));
    }
}
