//! Session flow of one playthrough: countdown, rings, pauses, game over and the scene
//! requests that follow.

mod deferred;
mod ring_course;
#[allow(clippy::module_inception)]
mod session;
mod session_event;
mod session_state;

pub use deferred::DeferredAction;
pub use ring_course::{Ring, RingCourse};
pub use session::Session;
pub use session_event::SessionEvent;
pub use session_state::{GameOverCause, PauseCause, SceneRequest, SessionPhase};
