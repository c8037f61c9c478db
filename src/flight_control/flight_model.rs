use super::{
    common::math::{approach, lerp_clamped, wrap_deg},
    control_sample::{ControlSample, ThrottleSign},
};
use crate::config::FlightConfig;
use glam::{EulerRot, Quat, Vec3};

/// Pose, motion and stall flag of the vehicle after the latest fixed-step update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    current_speed: f32,
    is_stalled: bool,
    throttle: f32,
}

impl VehicleState {
    pub fn position(&self) -> Vec3 { self.position }
    pub fn orientation(&self) -> Quat { self.orientation }
    pub fn velocity(&self) -> Vec3 { self.velocity }
    pub fn current_speed(&self) -> f32 { self.current_speed }
    pub fn is_stalled(&self) -> bool { self.is_stalled }
    /// Throttle applied in the last update, in speed units per second.
    pub fn throttle(&self) -> f32 { self.throttle }
    /// Booster and engine cue: on while accelerating.
    pub fn engine_active(&self) -> bool { self.throttle > 0.0 }

    /// Attitude as `(pitch, yaw, roll)` in degrees, each in `(-180, 180]`.
    /// Positive pitch is nose down.
    pub fn attitude_deg(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.orientation.to_euler(EulerRot::YXZ);
        Vec3::new(
            wrap_deg(pitch.to_degrees()),
            wrap_deg(yaw.to_degrees()),
            wrap_deg(roll.to_degrees()),
        )
    }

    /// Unit vector the nose points along.
    pub fn forward(&self) -> Vec3 { self.orientation * Vec3::Z }
}

/// Simplified arcade flight model: attitude follows smoothed rate commands, speed follows
/// a pitch-dependent gravity term plus a throttle that eases in toward the speed limits.
///
/// All angular quantities are vectors laid out as `(pitch, yaw, roll)` in degrees.
#[derive(Debug, Clone)]
pub struct FlightModel {
    config: FlightConfig,
    state: VehicleState,
    /// Smoothed angular rate applied in the previous update.
    applied_rotation: Vec3,
    controllable: bool,
}

impl FlightModel {
    /// Floor for the speed used as divisor in the throttle change rate.
    const SPEED_FLOOR: f32 = 0.1;
    /// Pitch of the stall-recovery reference attitude.
    const RECOVERY_PITCH_DEG: f32 = 90.0;

    /// Creates a model resting at the configured spawn point, not yet controllable.
    pub fn new(config: FlightConfig) -> Self {
        let state = VehicleState {
            position: config.spawn_point,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            current_speed: config.default_speed,
            is_stalled: config.default_speed <= config.stall_speed,
            throttle: 0.0,
        };
        Self { config, state, applied_rotation: Vec3::ZERO, controllable: false }
    }

    pub fn config(&self) -> &FlightConfig { &self.config }
    pub fn state(&self) -> &VehicleState { &self.state }
    pub fn is_stalled(&self) -> bool { self.state.is_stalled }
    pub fn applied_rotation(&self) -> Vec3 { self.applied_rotation }
    pub fn is_controllable(&self) -> bool { self.controllable }
    pub fn set_controllable(&mut self, option: bool) { self.controllable = option; }

    /// Overrides the current speed and refreshes the stall flag.
    pub fn set_speed(&mut self, speed: f32) {
        self.state.current_speed = speed;
        self.state.is_stalled = speed <= self.config.stall_speed;
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.state.orientation = orientation.normalize();
    }

    /// Advances the model by one fixed step.
    ///
    /// While stalled (speed at or below the stall speed) the sample is ignored and the
    /// vehicle steers toward a nose-down attitude instead. When the model is not
    /// controllable, nothing moves and the engine cue reports off.
    ///
    /// # Arguments
    /// - `sample`: Control input for this tick.
    /// - `dt`: Fixed step length in seconds.
    ///
    /// # Returns
    /// - A copy of the resulting `VehicleState`.
    pub fn update(&mut self, sample: ControlSample, dt: f32) -> VehicleState {
        if !self.controllable {
            self.state.throttle = 0.0;
            return self.state;
        }
        let pitch_rad = self.state.attitude_deg().x.to_radians();

        let target = if self.state.current_speed <= self.config.stall_speed {
            self.stall_recovery_target()
        } else {
            Vec3::new(sample.pitch(), sample.yaw(), sample.roll()) * self.config.sensitivity()
        };

        let t = self.config.movement_smoothness * dt;
        self.applied_rotation = Vec3::new(
            lerp_clamped(self.applied_rotation.x, target.x, t),
            lerp_clamped(self.applied_rotation.y, target.y, t),
            lerp_clamped(self.applied_rotation.z, target.z, t),
        );
        let step = Self::euler_to_quat(self.applied_rotation * dt);
        self.state.orientation = (self.state.orientation * step).normalize();

        let throttle = sample.throttle().factor() * self.config.acceleration_diff;
        self.integrate_speed(pitch_rad, sample.throttle(), throttle, dt);

        self.state.throttle = throttle;
        self.state.velocity = self.state.forward() * self.state.current_speed;
        self.state.position += self.state.velocity * dt;
        self.state.is_stalled = self.state.current_speed <= self.config.stall_speed;
        self.state
    }

    /// Puts the vehicle back at `position`, level, at default speed and at rest.
    pub fn respawn(&mut self, position: Vec3) {
        self.state.position = position;
        self.state.orientation = Quat::IDENTITY;
        self.state.velocity = Vec3::ZERO;
        self.state.throttle = 0.0;
        self.applied_rotation = Vec3::ZERO;
        self.set_speed(self.config.default_speed);
    }

    /// Per-axis angle between the current attitude and the same attitude pitched fully
    /// nose down, wrapped into `(-180, 180]` and limited to the axis sensitivities.
    fn stall_recovery_target(&self) -> Vec3 {
        let (yaw, _, roll) = self.state.orientation.to_euler(EulerRot::YXZ);
        let reference =
            Quat::from_euler(EulerRot::YXZ, yaw, Self::RECOVERY_PITCH_DEG.to_radians(), roll);
        let diff = reference * self.state.orientation.inverse();
        let (d_yaw, d_pitch, d_roll) = diff.to_euler(EulerRot::YXZ);
        let diff_deg = Vec3::new(
            wrap_deg(d_pitch.to_degrees()),
            wrap_deg(d_yaw.to_degrees()),
            wrap_deg(d_roll.to_degrees()),
        );
        let limit = self.config.sensitivity();
        diff_deg.clamp(-limit, limit)
    }

    fn integrate_speed(&mut self, pitch_rad: f32, sign: ThrottleSign, throttle: f32, dt: f32) {
        let cfg = &self.config;
        let mut speed = self.state.current_speed + cfg.gravity * pitch_rad.sin() * dt;

        let divisor = speed.max(Self::SPEED_FLOOR);
        speed = match sign {
            ThrottleSign::Accelerate => {
                let change_rate = (cfg.max_speed - speed) / divisor;
                approach(speed, throttle * change_rate * dt, cfg.max_speed)
            }
            ThrottleSign::Decelerate => {
                let change_rate = (speed - cfg.min_speed) / divisor;
                approach(speed, throttle * change_rate * dt, cfg.min_speed)
            }
            ThrottleSign::None => speed,
        };

        // gravity may carry the speed past the band by at most one step's worth
        let slack = cfg.gravity.abs() * dt;
        let low = (cfg.min_speed - slack).max(Self::SPEED_FLOOR);
        self.state.current_speed = speed.clamp(low, cfg.max_speed + slack);
    }

    fn euler_to_quat(deg: Vec3) -> Quat {
        Quat::from_euler(EulerRot::YXZ, deg.y.to_radians(), deg.x.to_radians(), deg.z.to_radians())
    }
}
