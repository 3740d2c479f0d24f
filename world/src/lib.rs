#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Lane Defence.
//!
//! The world owns every counter the player can observe: the route book, the
//! resource ledger, the lifecycle state, the wave projection and the session
//! clock. It is mutated only through [`apply`].

mod ledger;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use lane_defence_core::{
    Command, ControlCommand, ControlRejection, Event, GameState, Route, RouteError, WaveProgress,
    WELCOME_BANNER,
};

use crate::ledger::Ledger;

const DEFAULT_STARTING_HEALTH: u32 = 20;
const DEFAULT_STARTING_GOLD: u64 = 0;

/// Represents the authoritative Lane Defence session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    routes: BTreeMap<String, Arc<Route>>,
    starting_health: u32,
    starting_gold: u64,
    ledger: Ledger,
    game_state: GameState,
    wave: WaveProgress,
    monsters_spawned: u32,
    elapsed: Duration,
    tick_index: u64,
}

impl World {
    /// Creates a new idle world with default starting resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            routes: BTreeMap::new(),
            starting_health: DEFAULT_STARTING_HEALTH,
            starting_gold: DEFAULT_STARTING_GOLD,
            ledger: Ledger::new(DEFAULT_STARTING_HEALTH, DEFAULT_STARTING_GOLD),
            game_state: GameState::Idle,
            wave: WaveProgress::default(),
            monsters_spawned: 0,
            elapsed: Duration::ZERO,
            tick_index: 0,
        }
    }

    fn register_route(&mut self, route: Route, out_events: &mut Vec<Event>) {
        let name = route.name().to_owned();
        if route.is_empty() {
            out_events.push(Event::RouteRejected {
                name,
                reason: RouteError::EmptyRoute,
            });
            return;
        }

        if self.routes.contains_key(&name) {
            out_events.push(Event::RouteRejected {
                reason: RouteError::DuplicateRoute { name: name.clone() },
                name,
            });
            return;
        }

        let _ = self.routes.insert(name.clone(), Arc::new(route));
        out_events.push(Event::RouteRegistered { name });
    }

    fn control(&mut self, command: ControlCommand, out_events: &mut Vec<Event>) {
        let from = self.game_state;
        let outcome = match (command, from) {
            (ControlCommand::StartGame, GameState::Idle | GameState::GameOver) => {
                self.reset_session(out_events);
                Ok(GameState::Playing)
            }
            (ControlCommand::StartGame, GameState::Playing | GameState::Paused) => {
                Err(ControlRejection::AlreadyStarted)
            }
            (ControlCommand::StopGame, GameState::Idle) => Err(ControlRejection::NotStarted),
            (ControlCommand::StopGame, _) => Ok(GameState::Idle),
            (ControlCommand::PauseGame, GameState::Playing) => Ok(GameState::Paused),
            (ControlCommand::PauseGame, GameState::Paused) => Err(ControlRejection::AlreadyPaused),
            (ControlCommand::PauseGame, GameState::Idle | GameState::GameOver) => {
                Err(ControlRejection::NotStarted)
            }
            (ControlCommand::ResumeGame, GameState::Paused) => Ok(GameState::Playing),
            (ControlCommand::ResumeGame, GameState::Playing) => Err(ControlRejection::NotPaused),
            (ControlCommand::ResumeGame, GameState::Idle | GameState::GameOver) => {
                Err(ControlRejection::NotStarted)
            }
        };

        match outcome {
            Ok(to) => self.transition(to, out_events),
            Err(reason) => out_events.push(Event::ControlRejected { command, reason }),
        }
    }

    fn reset_session(&mut self, out_events: &mut Vec<Event>) {
        self.ledger = Ledger::new(self.starting_health, self.starting_gold);
        self.wave = WaveProgress::default();
        self.monsters_spawned = 0;
        self.elapsed = Duration::ZERO;
        out_events.push(Event::SessionReset {
            health: self.ledger.health(),
            gold: self.ledger.gold(),
        });
    }

    fn transition(&mut self, to: GameState, out_events: &mut Vec<Event>) {
        let from = self.game_state;
        self.game_state = to;
        out_events.push(Event::GameStateChanged { from, to });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RegisterRoute { route } => world.register_route(route, out_events),
        Command::ConfigureSession {
            starting_health,
            starting_gold,
        } => {
            // Zero health is terminal, so a session must start with at least one.
            world.starting_health = starting_health.max(1);
            world.starting_gold = starting_gold;
        }
        Command::Control { command } => world.control(command, out_events),
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            if world.game_state == GameState::Playing {
                world.elapsed = world.elapsed.saturating_add(dt);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::RecordSpawn { entity, route } => {
            world.monsters_spawned = world.monsters_spawned.saturating_add(1);
            out_events.push(Event::EntityTracked { entity, route });
        }
        Command::RecordWaveProgress { progress } => {
            if world.wave != progress {
                world.wave = progress;
                out_events.push(Event::WaveProgressed { progress });
            }
        }
        Command::ApplyKillReward { entity } => {
            let change = world.ledger.apply_kill_reward();
            if !change.is_noop() {
                out_events.push(Event::GoldChanged {
                    entity,
                    from: change.from,
                    to: change.to,
                });
            }
        }
        Command::ApplyRouteCompletionPenalty { entity } => {
            let change = world.ledger.apply_route_completion_penalty();
            if change.is_noop() {
                return;
            }

            out_events.push(Event::HealthChanged {
                entity,
                from: change.from,
                to: change.to,
            });

            if change.to == 0 {
                out_events.push(Event::Defeated);
                if world.game_state == GameState::Playing {
                    world.transition(GameState::GameOver, out_events);
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{sync::Arc, time::Duration};

    use lane_defence_core::{GameState, Route, WaveProgress};

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Looks up a registered route by name.
    #[must_use]
    pub fn route(world: &World, name: &str) -> Option<Arc<Route>> {
        world.routes.get(name).cloned()
    }

    /// Names of every registered route in lexical order.
    #[must_use]
    pub fn route_names(world: &World) -> Vec<&str> {
        world.routes.keys().map(String::as_str).collect()
    }

    /// Remaining player health.
    #[must_use]
    pub fn health(world: &World) -> u32 {
        world.ledger.health()
    }

    /// Gold collected by the player.
    #[must_use]
    pub fn gold(world: &World) -> u64 {
        world.ledger.gold()
    }

    /// Reports whether the player's health is exhausted.
    #[must_use]
    pub fn is_defeated(world: &World) -> bool {
        world.ledger.health() == 0
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.game_state
    }

    /// Latest wave progress recorded from the spawn source.
    #[must_use]
    pub fn wave_progress(world: &World) -> WaveProgress {
        world.wave
    }

    /// Number of monsters spawned since the session started.
    #[must_use]
    pub fn monsters_spawned(world: &World) -> u32 {
        world.monsters_spawned
    }

    /// Simulated time elapsed while playing.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of ticks applied to the world.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{EntityId, Vec3, Waypoint};

    fn line(name: &str) -> Route {
        Route::new(
            name,
            vec![
                Waypoint::new(Vec3::ZERO, "start"),
                Waypoint::new(Vec3::new(5.0, 0.0, 0.0), "end"),
            ],
            false,
        )
    }

    fn started(health: u32) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureSession {
                starting_health: health,
                starting_gold: 0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Control {
                command: ControlCommand::StartGame,
            },
            &mut events,
        );
        world
    }

    #[test]
    fn registers_routes_by_name() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RegisterRoute { route: line("east") },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::RouteRegistered {
                name: "east".to_owned()
            }]
        );
        assert_eq!(query::route_names(&world), vec!["east"]);
        assert!(query::route(&world, "east").is_some());
        assert!(query::route(&world, "west").is_none());
    }

    #[test]
    fn rejects_empty_and_duplicate_routes() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RegisterRoute {
                route: Route::new("void", Vec::new(), false),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::RegisterRoute { route: line("east") },
            &mut events,
        );
        apply(
            &mut world,
            Command::RegisterRoute { route: line("east") },
            &mut events,
        );

        assert_eq!(
            events[0],
            Event::RouteRejected {
                name: "void".to_owned(),
                reason: RouteError::EmptyRoute,
            }
        );
        assert_eq!(
            events[2],
            Event::RouteRejected {
                name: "east".to_owned(),
                reason: RouteError::DuplicateRoute {
                    name: "east".to_owned()
                },
            }
        );
        assert!(query::route(&world, "void").is_none());
    }

    #[test]
    fn zero_starting_health_is_raised_to_one() {
        let mut world = started(0);
        assert_eq!(query::health(&world), 1);
        assert!(!query::is_defeated(&world));
        assert_eq!(query::game_state(&world), GameState::Playing);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyRouteCompletionPenalty {
                entity: EntityId::new(1),
            },
            &mut events,
        );
        assert!(events.contains(&Event::Defeated));
        assert_eq!(query::game_state(&world), GameState::GameOver);
    }

    #[test]
    fn penalty_to_zero_ends_the_game() {
        let mut world = started(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyRouteCompletionPenalty {
                entity: EntityId::new(1),
            },
            &mut events,
        );

        assert_eq!(query::health(&world), 0);
        assert!(query::is_defeated(&world));
        assert_eq!(query::game_state(&world), GameState::GameOver);
        assert!(events.contains(&Event::Defeated));

        events.clear();
        apply(
            &mut world,
            Command::ApplyRouteCompletionPenalty {
                entity: EntityId::new(2),
            },
            &mut events,
        );
        assert_eq!(query::health(&world), 0);
        assert!(events.is_empty(), "floored penalty emits nothing");
    }

    #[test]
    fn kill_reward_emits_gold_change() {
        let mut world = started(3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyKillReward {
                entity: EntityId::new(4),
            },
            &mut events,
        );

        assert_eq!(query::gold(&world), 1);
        assert_eq!(
            events,
            vec![Event::GoldChanged {
                entity: EntityId::new(4),
                from: 0,
                to: 1,
            }]
        );
    }

    #[test]
    fn control_transitions_follow_session_lifecycle() {
        let mut world = World::new();
        let mut events = Vec::new();
        let mut control = |world: &mut World, command| {
            events.clear();
            apply(world, Command::Control { command }, &mut events);
            events.last().cloned()
        };

        assert_eq!(
            control(&mut world, ControlCommand::PauseGame),
            Some(Event::ControlRejected {
                command: ControlCommand::PauseGame,
                reason: ControlRejection::NotStarted,
            })
        );
        assert_eq!(
            control(&mut world, ControlCommand::StartGame),
            Some(Event::GameStateChanged {
                from: GameState::Idle,
                to: GameState::Playing,
            })
        );
        assert_eq!(
            control(&mut world, ControlCommand::StartGame),
            Some(Event::ControlRejected {
                command: ControlCommand::StartGame,
                reason: ControlRejection::AlreadyStarted,
            })
        );
        assert_eq!(
            control(&mut world, ControlCommand::ResumeGame),
            Some(Event::ControlRejected {
                command: ControlCommand::ResumeGame,
                reason: ControlRejection::NotPaused,
            })
        );
        let _ = control(&mut world, ControlCommand::PauseGame);
        assert_eq!(
            control(&mut world, ControlCommand::PauseGame),
            Some(Event::ControlRejected {
                command: ControlCommand::PauseGame,
                reason: ControlRejection::AlreadyPaused,
            })
        );
        let _ = control(&mut world, ControlCommand::ResumeGame);
        assert_eq!(query::game_state(&world), GameState::Playing);
        let _ = control(&mut world, ControlCommand::StopGame);
        assert_eq!(query::game_state(&world), GameState::Idle);
        assert_eq!(
            control(&mut world, ControlCommand::StopGame),
            Some(Event::ControlRejected {
                command: ControlCommand::StopGame,
                reason: ControlRejection::NotStarted,
            })
        );
    }

    #[test]
    fn start_after_game_over_resets_the_ledger() {
        let mut world = started(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyKillReward {
                entity: EntityId::new(1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ApplyRouteCompletionPenalty {
                entity: EntityId::new(2),
            },
            &mut events,
        );
        assert_eq!(query::game_state(&world), GameState::GameOver);

        events.clear();
        apply(
            &mut world,
            Command::Control {
                command: ControlCommand::StartGame,
            },
            &mut events,
        );
        assert_eq!(query::health(&world), 1);
        assert_eq!(query::gold(&world), 0);
        assert_eq!(query::game_state(&world), GameState::Playing);
        assert_eq!(events[0], Event::SessionReset { health: 1, gold: 0 });
    }

    #[test]
    fn clock_only_runs_while_playing() {
        let mut world = World::new();
        let mut events = Vec::new();
        let dt = Duration::from_millis(100);
        apply(&mut world, Command::Tick { dt }, &mut events);
        assert_eq!(query::elapsed(&world), Duration::ZERO);

        apply(
            &mut world,
            Command::Control {
                command: ControlCommand::StartGame,
            },
            &mut events,
        );
        apply(&mut world, Command::Tick { dt }, &mut events);
        apply(&mut world, Command::Tick { dt }, &mut events);
        assert_eq!(query::elapsed(&world), Duration::from_millis(200));
        assert_eq!(query::tick_index(&world), 3);
    }

    #[test]
    fn wave_progress_events_only_on_change() {
        let mut world = started(5);
        let mut events = Vec::new();
        let progress = WaveProgress::new(1, 3, false);
        apply(&mut world, Command::RecordWaveProgress { progress }, &mut events);
        apply(&mut world, Command::RecordWaveProgress { progress }, &mut events);

        assert_eq!(events, vec![Event::WaveProgressed { progress }]);
        assert_eq!(query::wave_progress(&world), progress);
    }
}
