use crate::gesture_link::{AxisMask, ReconnectPolicy};
use crate::info;
use glam::Vec3;
use std::{env, fs, path::Path, time::Duration};
use strum_macros::Display;

/// Tuning of the flight model. Angular values are in degrees per second.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub min_speed: f32,
    pub stall_speed: f32,
    pub default_speed: f32,
    pub max_speed: f32,
    pub yaw_sensitivity: f32,
    pub pitch_sensitivity: f32,
    pub roll_sensitivity: f32,
    pub movement_smoothness: f32,
    pub gravity: f32,
    pub acceleration_diff: f32,
    pub spawn_point: Vec3,
    pub vehicle_scale: Vec3,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            min_speed: 10.0,
            stall_speed: 15.0,
            default_speed: 25.0,
            max_speed: 50.0,
            yaw_sensitivity: 50.0,
            pitch_sensitivity: 150.0,
            roll_sensitivity: 150.0,
            movement_smoothness: 4.0,
            gravity: 5.0,
            acceleration_diff: 20.0,
            spawn_point: Vec3::new(500.0, 250.0, 500.0),
            vehicle_scale: Vec3::ONE,
        }
    }
}

impl FlightConfig {
    /// Per-axis angular rate limits as `(pitch, yaw, roll)`.
    pub fn sensitivity(&self) -> Vec3 {
        Vec3::new(self.pitch_sensitivity, self.yaw_sensitivity, self.roll_sensitivity)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 < self.min_speed
            && self.min_speed < self.stall_speed
            && self.stall_speed <= self.default_speed
            && self.default_speed <= self.max_speed;
        if !ordered {
            return Err(ConfigError::InvalidValue(format!(
                "speeds must satisfy 0 < min < stall <= default <= max, got {} / {} / {} / {}",
                self.min_speed, self.stall_speed, self.default_speed, self.max_speed
            )));
        }
        let rates = self.sensitivity().extend(self.movement_smoothness);
        if !rates.is_finite() || rates.min_element() < 0.0 {
            return Err(ConfigError::InvalidValue(
                "sensitivities and smoothness must be finite and not negative".to_string(),
            ));
        }
        let finite = self.max_speed.is_finite()
            && self.gravity.is_finite()
            && self.acceleration_diff.is_finite()
            && self.spawn_point.is_finite()
            && self.vehicle_scale.is_finite();
        if !finite {
            return Err(ConfigError::InvalidValue("flight values must be finite".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds of running time before the run ends with `TimeOver`.
    pub time_limit: f32,
    /// Seconds counted down in `Pregame`.
    pub countdown: f32,
    /// Remaining countdown below which the start signal replaces the number.
    pub imminent_start: f32,
    /// Delay before a requested scene change is carried out.
    pub scene_change_delay: f32,
    /// Offset from the last passed ring at which the vehicle respawns. The `y` part is
    /// scaled by the vehicle's vertical scale.
    pub respawn_offset: Vec3,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: 30.0,
            countdown: 3.0,
            imminent_start: 0.5,
            scene_change_delay: 0.25,
            respawn_offset: Vec3::new(-60.0, 55.0, -100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub axes: AxisMask,
    /// Decoded throttle value that means "accelerate".
    pub throttle_sentinel: i64,
    pub reconnect: ReconnectPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 12325,
            connect_timeout_ms: 1000,
            axes: AxisMask::default(),
            throttle_sentinel: 1,
            reconnect: ReconnectPolicy::Never,
        }
    }
}

impl LinkConfig {
    pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
    pub fn connect_timeout(&self) -> Duration { Duration::from_millis(self.connect_timeout_ms) }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed physics step in seconds.
    pub fixed_dt: f32,
    /// Target frame rate of the variable-step loop.
    pub frame_rate: f32,
}

impl Default for TimingConfig {
    fn default() -> Self { Self { fixed_dt: 0.02, frame_rate: 60.0 } }
}

impl TimingConfig {
    pub fn fixed_period(&self) -> Duration { Duration::from_secs_f32(self.fixed_dt) }
    pub fn frame_period(&self) -> Duration { Duration::from_secs_f32(1.0 / self.frame_rate) }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct RingSpec {
    pub position: Vec3,
    #[serde(default = "RingSpec::default_radius")]
    pub radius: f32,
}

impl RingSpec {
    fn default_radius() -> f32 { 30.0 }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    /// Rings in the order they have to be flown through.
    pub rings: Vec<RingSpec>,
}

impl Default for CourseConfig {
    fn default() -> Self {
        let rings = [
            Vec3::new(500.0, 250.0, 800.0),
            Vec3::new(520.0, 240.0, 1150.0),
            Vec3::new(480.0, 230.0, 1500.0),
            Vec3::new(500.0, 250.0, 1850.0),
        ];
        Self {
            rings: rings
                .into_iter()
                .map(|position| RingSpec { position, radius: RingSpec::default_radius() })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub flight: FlightConfig,
    pub session: SessionConfig,
    pub link: LinkConfig,
    pub timing: TimingConfig,
    pub course: CourseConfig,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    EmptyCourse,
    InvalidValue(String),
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self { ConfigError::Io(value) }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self { ConfigError::Parse(value) }
}

impl GameConfig {
    const CONFIG_VAR: &'static str = "RINGFLIGHT_CONFIG";
    const HOST_VAR: &'static str = "RINGFLIGHT_HOST";
    const PORT_VAR: &'static str = "RINGFLIGHT_PORT";
    const AXES_VAR: &'static str = "RINGFLIGHT_LINK_AXES";
    const RECONNECT_VAR: &'static str = "RINGFLIGHT_RECONNECT";
    const TIME_LIMIT_VAR: &'static str = "RINGFLIGHT_TIME_LIMIT";

    /// Loads the configuration from the file named by `RINGFLIGHT_CONFIG` (defaults if
    /// unset), applies the environment overrides and validates the result.
    ///
    /// # Returns
    /// - The validated `GameConfig`, or the first `ConfigError` encountered.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(Self::CONFIG_VAR) {
            Ok(path) => {
                info!("Loading configuration from {path}");
                Self::from_file(path)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> { Ok(serde_json::from_str(raw)?) }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var(Self::HOST_VAR) {
            self.link.host = host;
        }
        if let Ok(port) = env::var(Self::PORT_VAR) {
            self.link.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("{}={port}", Self::PORT_VAR)))?;
        }
        if let Ok(axes) = env::var(Self::AXES_VAR) {
            self.link.axes = axes.parse().map_err(ConfigError::InvalidValue)?;
        }
        if let Ok(policy) = env::var(Self::RECONNECT_VAR) {
            self.link.reconnect = policy.parse().map_err(ConfigError::InvalidValue)?;
        }
        if let Ok(limit) = env::var(Self::TIME_LIMIT_VAR) {
            self.session.time_limit = limit.parse().map_err(|_| {
                ConfigError::InvalidValue(format!("{}={limit}", Self::TIME_LIMIT_VAR))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flight.validate()?;
        if self.course.rings.is_empty() {
            return Err(ConfigError::EmptyCourse);
        }
        Self::positive("timing.fixed_dt", self.timing.fixed_dt)?;
        Self::positive("timing.frame_rate", self.timing.frame_rate)?;
        Self::positive("session.time_limit", self.session.time_limit)?;
        Self::non_negative("session.countdown", self.session.countdown)?;
        Self::non_negative("session.imminent_start", self.session.imminent_start)?;
        Self::non_negative("session.scene_change_delay", self.session.scene_change_delay)?;
        Ok(())
    }

    fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue(format!("{name} must be finite and positive, got {value}")))
        }
    }

    fn non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue(format!("{name} must be finite and >= 0, got {value}")))
        }
    }
}
