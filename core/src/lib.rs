#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence runtime.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The orchestrator submits
//! [`Command`] values describing desired session mutations, the world executes
//! them via its `apply` entry point, and broadcasts [`Event`] values that the
//! orchestrator and observers react to. Followers drive entities through the
//! [`Host`] contract and report their own progress as [`Event`] values too.

use std::{fmt, time::Duration};

pub use glam::Vec3;
use serde::{Deserialize, Serialize};

mod host;
mod protocol;
mod route;

pub use host::{CommandRejected, Host};
pub use protocol::{
    ControlCommand, ControlRejection, GameState, ResultCode, StateMessage, StateSnapshot,
    WaveProgress,
};
pub use route::{Route, RouteError, Waypoint};

/// Unique identifier the host engine assigns to a simulated entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why the combat subsystem reported an entity as dead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Damage reduced the entity's life to zero.
    KilledByDamage,
    /// The engine removed the entity without combat, e.g. at a route end.
    Destroyed,
}

/// Notifications produced by the spawn source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnNotice {
    /// A new entity entered the map and needs a follower.
    EntitySpawned {
        /// Identifier the host assigned to the entity.
        entity: EntityId,
        /// Route to follow; `None` selects the session's configured route.
        route: Option<String>,
    },
    /// A wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Every monster of the wave has been spawned.
    WaveCompleted {
        /// One-based wave number.
        wave: u32,
    },
    /// The final wave completed.
    LevelCompleted,
}

/// Death notification reported by the combat subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeathNotice {
    /// Entity that died.
    pub entity: EntityId,
    /// Reason the entity died.
    pub cause: DeathCause,
}

impl DeathNotice {
    /// Creates a new death notice.
    #[must_use]
    pub const fn new(entity: EntityId, cause: DeathCause) -> Self {
        Self { entity, cause }
    }
}

/// Why an entity left the active registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Killed by damage; the player was rewarded.
    Killed,
    /// Reached the end of its route; the player was penalised.
    Breached,
    /// Destroyed by the engine without a resource transition.
    Destroyed,
    /// Its follower stopped after a rejected command.
    Stopped,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers an immutable route under its name.
    RegisterRoute {
        /// Route to register.
        route: Route,
    },
    /// Sets the resource values a new session starts with.
    ConfigureSession {
        /// Health granted at session start. Raised to one when zero.
        starting_health: u32,
        /// Gold granted at session start.
        starting_gold: u64,
    },
    /// Requests a session lifecycle transition.
    Control {
        /// Requested transition.
        command: ControlCommand,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Records that a spawned entity now follows a route.
    RecordSpawn {
        /// Entity attached to a follower.
        entity: EntityId,
        /// Name of the route the follower walks.
        route: String,
    },
    /// Stores the spawn source's latest wave progress.
    RecordWaveProgress {
        /// Progress reported by the spawn source.
        progress: WaveProgress,
    },
    /// Credits the player for a kill.
    ApplyKillReward {
        /// Entity that was killed.
        entity: EntityId,
    },
    /// Charges the player for an entity that reached its route end.
    ApplyRouteCompletionPenalty {
        /// Entity that completed its route.
        entity: EntityId,
    },
}

/// Events broadcast by the world and by followers.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a route was registered.
    RouteRegistered {
        /// Name of the registered route.
        name: String,
    },
    /// Reports that a route registration was rejected.
    RouteRejected {
        /// Name of the rejected route.
        name: String,
        /// Specific reason the registration failed.
        reason: RouteError,
    },
    /// Announces a session lifecycle transition.
    GameStateChanged {
        /// State before the transition.
        from: GameState,
        /// State after the transition.
        to: GameState,
    },
    /// Reports that a control command was refused.
    ControlRejected {
        /// Command that was refused.
        command: ControlCommand,
        /// Specific reason the command was refused.
        reason: ControlRejection,
    },
    /// Confirms that the ledger and session counters were reset.
    SessionReset {
        /// Health after the reset.
        health: u32,
        /// Gold after the reset.
        gold: u64,
    },
    /// Confirms that a spawned entity is now tracked.
    EntityTracked {
        /// Entity now following a route.
        entity: EntityId,
        /// Route the entity follows.
        route: String,
    },
    /// Announces updated wave progress.
    WaveProgressed {
        /// Progress after the update.
        progress: WaveProgress,
    },
    /// Reports a change to the player's health.
    HealthChanged {
        /// Entity whose arrival caused the change.
        entity: EntityId,
        /// Health before the change.
        from: u32,
        /// Health after the change.
        to: u32,
    },
    /// Reports a change to the player's gold.
    GoldChanged {
        /// Entity whose death caused the change.
        entity: EntityId,
        /// Gold before the change.
        from: u64,
        /// Gold after the change.
        to: u64,
    },
    /// Announces that the player's health reached zero.
    Defeated,
    /// A follower's entity arrived at a waypoint.
    WaypointReached {
        /// Entity that arrived.
        entity: EntityId,
        /// Index of the waypoint within the route.
        index: usize,
    },
    /// A follower's entity arrived at the final waypoint of an open route.
    RouteCompleted {
        /// Entity that completed its route.
        entity: EntityId,
    },
    /// An entity left the active registry.
    EntityRemoved {
        /// Entity that was removed.
        entity: EntityId,
        /// Why the entity was removed.
        reason: RemovalReason,
    },
}

/// Canonical banner emitted when the runtime boots.
pub const WELCOME_BANNER: &str = "Welcome to Lane Defence.";
