//! Control input: the TCP link to the external gesture tracker, its wire format, and the
//! selection between tracker and local input that produces one sample per tick.

mod gesture_endpoint;
mod gesture_messages;
mod input_source;
#[cfg(test)]
mod tests;

pub use gesture_endpoint::{GestureLink, LinkError, LinkStatus, ReconnectPolicy};
pub use gesture_messages::{FrameDecoder, GestureFrame};
pub use input_source::{AxisMask, ControlProvider, InputSource, LinkAxis, LocalAxes};
