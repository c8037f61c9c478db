use crate::flight_control::ThrottleSign;
use crate::session::SceneRequest;
use crate::warn;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Operator commands read line by line from stdin. They stand in for the key bindings of
/// the graphical build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Toggles the user pause.
    Pause,
    Respawn,
    Scene(SceneRequest),
    Quit,
    /// Local stick deflection, vertical then horizontal.
    Axes { vertical: f32, horizontal: f32 },
    Throttle(ThrottleSign),
}

#[derive(Debug, Display, PartialEq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, Copy, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Keyword {
    Pause,
    Respawn,
    #[strum(serialize = "restart", serialize = "reload", serialize = "menu")]
    Scene,
    #[strum(serialize = "quit", serialize = "exit")]
    Quit,
    Axes,
    #[strum(serialize = "accel", serialize = "accelerate")]
    Accel,
    #[strum(serialize = "decel", serialize = "decelerate")]
    Decel,
    Coast,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(CommandError::Empty)?;
        let keyword =
            Keyword::from_str(head).map_err(|_| CommandError::Unknown(head.to_string()))?;
        Ok(match keyword {
            Keyword::Pause => Command::Pause,
            Keyword::Respawn => Command::Respawn,
            Keyword::Scene => Command::Scene(
                head.parse().map_err(|_| CommandError::Unknown(head.to_string()))?,
            ),
            Keyword::Quit => Command::Quit,
            Keyword::Axes => {
                let vertical = Self::number(words.next(), "vertical")?;
                let horizontal = Self::number(words.next(), "horizontal")?;
                Command::Axes { vertical, horizontal }
            }
            Keyword::Accel => Command::Throttle(ThrottleSign::Accelerate),
            Keyword::Decel => Command::Throttle(ThrottleSign::Decelerate),
            Keyword::Coast => Command::Throttle(ThrottleSign::None),
        })
    }
}

impl Command {
    fn number(word: Option<&str>, name: &'static str) -> Result<f32, CommandError> {
        let raw = word.ok_or(CommandError::MissingArgument(name))?;
        raw.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CommandError::InvalidNumber(raw.to_string()))
    }

    /// Spawns the stdin reader.
    ///
    /// # Returns
    /// - The receiving end of the command channel. It closes when stdin reaches EOF.
    pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Command> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => warn!("Ignoring command {line:?}: {e}"),
                }
            }
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!("pause".parse::<Command>(), Ok(Command::Pause));
        assert_eq!(" Respawn ".parse::<Command>(), Ok(Command::Respawn));
        assert_eq!("restart".parse::<Command>(), Ok(Command::Scene(SceneRequest::Reload)));
        assert_eq!("menu".parse::<Command>(), Ok(Command::Scene(SceneRequest::MainMenu)));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("coast".parse::<Command>(), Ok(Command::Throttle(ThrottleSign::None)));
        assert_eq!("accel".parse::<Command>(), Ok(Command::Throttle(ThrottleSign::Accelerate)));
    }

    #[test]
    fn test_axes_arguments() {
        assert_eq!(
            "axes 0.5 -1".parse::<Command>(),
            Ok(Command::Axes { vertical: 0.5, horizontal: -1.0 })
        );
        assert_eq!("axes 0.5".parse::<Command>(), Err(CommandError::MissingArgument("horizontal")));
        assert_eq!(
            "axes nan 0".parse::<Command>(),
            Err(CommandError::InvalidNumber("nan".to_string()))
        );
    }

    #[test]
    fn test_rejects_unknown_and_empty() {
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("barrelroll".parse::<Command>(), Err(CommandError::Unknown("barrelroll".to_string())));
    }
}
