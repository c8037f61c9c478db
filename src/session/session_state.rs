use strum_macros::{Display, EnumString};

#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum SessionPhase {
    /// Countdown before the run; the vehicle is not controllable yet.
    #[default]
    Pregame,
    Running,
    /// The run is over, won or lost.
    Idle,
}

#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PauseCause {
    User,
    LostTracking,
}

#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash)]
pub enum GameOverCause {
    #[strum(serialize = "Time Over!")]
    TimeOver,
    #[strum(serialize = "Completed!")]
    Complete,
}

/// Scene change handed to the scene layer once its delay has run out.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SceneRequest {
    /// Load the current level again, starting a fresh session.
    #[strum(serialize = "restart", serialize = "reload")]
    Reload,
    #[strum(serialize = "menu", serialize = "mainmenu")]
    MainMenu,
}
