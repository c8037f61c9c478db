use super::session_state::{GameOverCause, PauseCause, SceneRequest, SessionPhase};

/// Notifications from the session to the presentation layers (HUD text, widgets, audio,
/// scene loading). They are sent in the order the session makes its decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
    /// Countdown caption; only sent when the shown text changes.
    CountdownText(String),
    CountdownHidden,
    /// `LostTracking` is its own cause so the UI can show the tracking warning instead of
    /// the pause menu.
    Paused(PauseCause),
    Resumed(PauseCause),
    HudVisible(bool),
    StopAllAudio,
    StallCue(bool),
    /// Ring that has to be flown through next, to be highlighted.
    NextRing(usize),
    RingPassed { index: usize, passed: usize, total: usize },
    GameOver(GameOverCause),
    SceneRequested(SceneRequest),
}
