use strum_macros::Display;

/// Direction the throttle is pushed for one tick.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub enum ThrottleSign {
    Accelerate,
    #[default]
    None,
    Decelerate,
}

impl ThrottleSign {
    /// Derives the sign from the two discrete throttle keys. Holding both cancels out.
    pub fn from_keys(accelerate: bool, decelerate: bool) -> Self {
        match (accelerate, decelerate) {
            (true, false) => ThrottleSign::Accelerate,
            (false, true) => ThrottleSign::Decelerate,
            _ => ThrottleSign::None,
        }
    }

    /// Signed unit factor: `+1` accelerate, `-1` decelerate, `0` otherwise.
    pub fn factor(self) -> f32 {
        match self {
            ThrottleSign::Accelerate => 1.0,
            ThrottleSign::None => 0.0,
            ThrottleSign::Decelerate => -1.0,
        }
    }
}

/// One tick worth of normalized control input.
///
/// Axes are clamped into `[-1, 1]` on construction so providers can hand over raw values.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct ControlSample {
    pitch: f32,
    yaw: f32,
    roll: f32,
    throttle: ThrottleSign,
}

impl ControlSample {
    pub fn new(pitch: f32, yaw: f32, roll: f32, throttle: ThrottleSign) -> Self {
        Self {
            pitch: Self::clamp_axis(pitch),
            yaw: Self::clamp_axis(yaw),
            roll: Self::clamp_axis(roll),
            throttle,
        }
    }

    /// A sample with centered axes and no throttle.
    pub fn neutral() -> Self { Self::default() }

    pub fn pitch(&self) -> f32 { self.pitch }
    pub fn yaw(&self) -> f32 { self.yaw }
    pub fn roll(&self) -> f32 { self.roll }
    pub fn throttle(&self) -> ThrottleSign { self.throttle }

    fn clamp_axis(value: f32) -> f32 {
        if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 }
    }
}
