use super::{
    gesture_endpoint::{GestureLink, LinkStatus},
    gesture_messages::GestureFrame,
};
use crate::flight_control::{ControlSample, ThrottleSign};
use std::{collections::HashSet, str::FromStr};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// A field of the gesture frame that can be forwarded to the flight model.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, EnumIter, EnumString, serde::Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LinkAxis {
    Pitch,
    Yaw,
    Roll,
    Throttle,
}

/// Set of gesture axes forwarded to the flight model. Axes outside the mask read as
/// centered (and throttle as idle).
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "Vec<LinkAxis>")]
pub struct AxisMask(HashSet<LinkAxis>);

impl AxisMask {
    pub fn all() -> Self { Self(LinkAxis::iter().collect()) }
    pub fn none() -> Self { Self(HashSet::new()) }
    pub fn contains(&self, axis: LinkAxis) -> bool { self.0.contains(&axis) }
}

impl Default for AxisMask {
    fn default() -> Self { Self(HashSet::from([LinkAxis::Pitch])) }
}

impl From<Vec<LinkAxis>> for AxisMask {
    fn from(value: Vec<LinkAxis>) -> Self { Self(value.into_iter().collect()) }
}

impl FromStr for AxisMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| LinkAxis::from_str(part).map_err(|_| format!("unknown link axis '{part}'")))
            .collect::<Result<HashSet<_>, _>>()
            .map(Self)
    }
}

/// A source of per-tick control samples.
pub trait ControlProvider {
    fn control_sample(&self) -> ControlSample;
}

/// Latest state of the local keyboard/analog controls, written by the windowing layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalAxes {
    vertical: f32,
    horizontal: f32,
    accelerate: bool,
    decelerate: bool,
}

impl LocalAxes {
    pub fn set_axes(&mut self, vertical: f32, horizontal: f32) {
        self.vertical = vertical;
        self.horizontal = horizontal;
    }

    pub fn set_throttle_keys(&mut self, accelerate: bool, decelerate: bool) {
        self.accelerate = accelerate;
        self.decelerate = decelerate;
    }
}

impl ControlProvider for LocalAxes {
    /// Vertical drives pitch; horizontal drives yaw and banks the opposite way.
    fn control_sample(&self) -> ControlSample {
        ControlSample::new(
            self.vertical,
            self.horizontal,
            -self.horizontal,
            ThrottleSign::from_keys(self.accelerate, self.decelerate),
        )
    }
}

/// A decoded gesture frame seen through the axis mask.
pub struct MaskedFrame<'a> {
    frame: &'a GestureFrame,
    mask: &'a AxisMask,
    throttle_sentinel: i64,
}

impl ControlProvider for MaskedFrame<'_> {
    fn control_sample(&self) -> ControlSample {
        let axis = |axis: LinkAxis, value: f32| if self.mask.contains(axis) { value } else { 0.0 };
        let accelerate =
            self.mask.contains(LinkAxis::Throttle) && self.frame.throttle() == self.throttle_sentinel;
        ControlSample::new(
            axis(LinkAxis::Pitch, self.frame.pitch()),
            axis(LinkAxis::Yaw, self.frame.yaw()),
            axis(LinkAxis::Roll, self.frame.roll()),
            ThrottleSign::from_keys(accelerate, false),
        )
    }
}

/// Picks the provider for each tick: the gesture link while connected, local input while
/// the link has never been up. A lost link yields neutral samples so that local input
/// does not silently take over.
#[derive(Debug, Clone)]
pub struct InputSource {
    mask: AxisMask,
    throttle_sentinel: i64,
}

impl InputSource {
    pub fn new(mask: AxisMask, throttle_sentinel: i64) -> Self { Self { mask, throttle_sentinel } }

    pub fn sample(&self, link: &GestureLink, local: &LocalAxes) -> ControlSample {
        match link.status() {
            LinkStatus::Connected => link
                .last_frame()
                .map_or_else(ControlSample::neutral, |frame| self.masked(frame).control_sample()),
            LinkStatus::Offline => local.control_sample(),
            LinkStatus::Lost => ControlSample::neutral(),
        }
    }

    pub fn masked<'a>(&'a self, frame: &'a GestureFrame) -> MaskedFrame<'a> {
        MaskedFrame { frame, mask: &self.mask, throttle_sentinel: self.throttle_sentinel }
    }
}
