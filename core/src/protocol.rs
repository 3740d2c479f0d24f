//! Session state and the messages exchanged with the presentation layer.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// High-level lifecycle of a game session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// No session is running.
    #[default]
    Idle,
    /// The tick pipeline is advancing the session.
    Playing,
    /// The session exists but ticks are suspended.
    Paused,
    /// The player ran out of health.
    GameOver,
}

/// Requests the presentation layer may issue against a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCommand {
    /// Starts a fresh session.
    StartGame,
    /// Ends the current session.
    StopGame,
    /// Suspends a running session.
    PauseGame,
    /// Continues a paused session.
    ResumeGame,
}

impl ControlCommand {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartGame => "StartGame",
            Self::StopGame => "StopGame",
            Self::PauseGame => "PauseGame",
            Self::ResumeGame => "ResumeGame",
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlCommand {
    type Err = ResultCode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "StartGame" => Ok(Self::StartGame),
            "StopGame" => Ok(Self::StopGame),
            "PauseGame" => Ok(Self::PauseGame),
            "ResumeGame" => Ok(Self::ResumeGame),
            _ => Err(ResultCode::UnknownCommand),
        }
    }
}

/// Result codes answered to control commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    /// The command was applied.
    Success = 0,
    /// A session is already running or paused.
    AlreadyStarted = 1,
    /// No session is running.
    NotStarted = 2,
    /// The command does not apply to the current session state.
    OperationFailed = 3,
    /// The session could not process the command.
    InternalError = 98,
    /// The command name was not recognised.
    UnknownCommand = 99,
}

impl ResultCode {
    /// Numeric code sent on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

/// Reasons the world refuses a control command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlRejection {
    /// A session is already running or paused.
    AlreadyStarted,
    /// No session is running.
    NotStarted,
    /// Pause requested while already paused.
    AlreadyPaused,
    /// Resume requested while not paused.
    NotPaused,
}

impl From<ControlRejection> for ResultCode {
    fn from(rejection: ControlRejection) -> Self {
        match rejection {
            ControlRejection::AlreadyStarted => Self::AlreadyStarted,
            ControlRejection::NotStarted => Self::NotStarted,
            ControlRejection::AlreadyPaused | ControlRejection::NotPaused => Self::OperationFailed,
        }
    }
}

/// Read-only projection of the spawn source's wave bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveProgress {
    /// One-based index of the wave currently underway, zero before the first.
    pub current_wave: u32,
    /// Number of waves in the level.
    pub total_waves: u32,
    /// Reports whether every wave has been spawned.
    pub is_level_complete: bool,
}

impl WaveProgress {
    /// Creates a new progress projection.
    #[must_use]
    pub const fn new(current_wave: u32, total_waves: u32, is_level_complete: bool) -> Self {
        Self {
            current_wave,
            total_waves,
            is_level_complete,
        }
    }
}

/// Immutable capture of a session published to observers.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Lifecycle state at capture time.
    pub game_state: GameState,
    /// Wave progress reported by the spawn source.
    pub wave: WaveProgress,
    /// Number of followers in the active registry.
    pub active_entities: usize,
    /// Number of monsters spawned since the session started.
    pub monsters_spawned: u32,
    /// Simulated time elapsed while playing.
    pub elapsed: Duration,
    /// Remaining player health.
    pub health: u32,
    /// Gold collected by the player.
    pub gold: u64,
}

/// Periodic state message sent to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    /// Lifecycle state of the session.
    pub game_state: GameState,
    /// Wave currently underway.
    pub wave: u32,
    /// Number of monsters spawned since the session started.
    pub monsters_spawned: u32,
    /// Simulated seconds elapsed while playing.
    pub elapsed_seconds: f64,
    /// Remaining player health.
    pub player_health: u32,
    /// Gold collected by the player.
    pub player_gold: u64,
}

impl From<&StateSnapshot> for StateMessage {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            game_state: snapshot.game_state,
            wave: snapshot.wave.current_wave,
            monsters_spawned: snapshot.monsters_spawned,
            elapsed_seconds: snapshot.elapsed.as_secs_f64(),
            player_health: snapshot.health,
            player_gold: snapshot.gold,
        }
    }
}
