//! Vehicle-side control: the per-tick control sample and the flight model consuming it.

pub(crate) mod common;
mod control_sample;
mod flight_model;

pub use control_sample::{ControlSample, ThrottleSign};
pub use flight_model::{FlightModel, VehicleState};
