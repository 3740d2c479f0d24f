#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tick loop for a Lane Defence session.
//!
//! Each [`Orchestrator::tick`] runs a fixed pipeline:
//!
//! 1. **Intake** drains spawn notifications and attaches a follower to each
//!    new entity.
//! 2. **Advance** polls every tracked follower exactly once.
//! 3. **Reconcile** applies death notifications for entities still tracked.
//! 4. **Resolve** charges the player for followers that completed their route
//!    and were not killed in step 3.
//! 5. **Compact** removes everything marked in steps 1–4.
//! 6. **Publish** emits a coalesced snapshot on a fixed cadence.
//!
//! Registry and ledger writes happen only inside this pipeline, so a death
//! and a route completion reported for the same entity in the same tick
//! resolve to exactly one resource transition.

mod inbox;
mod registry;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use lane_defence_core::{
    Command, ControlCommand, DeathCause, EntityId, Event, GameState, Host, RemovalReason,
    ResultCode, Route, RouteError, SpawnNotice, StateSnapshot,
};
use lane_defence_system_follower::{Follower, FollowerError, FollowerState};
use lane_defence_system_publishing::{self as publishing, Publisher};
use lane_defence_system_spawning::SpawnSource;
use lane_defence_world::{self as world, query, World};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use crate::inbox::{Inbox, InboxHandle};
use crate::registry::Registry;

const DEFAULT_ARRIVAL_THRESHOLD: f32 = 1.0;
const DEFAULT_STARTING_HEALTH: u32 = 20;
const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration parameters required to construct the orchestrator.
#[derive(Clone, Debug)]
pub struct Config {
    route: String,
    arrival_threshold: f32,
    starting_health: u32,
    starting_gold: u64,
    publish_interval: Duration,
}

impl Config {
    /// Creates a configuration whose spawns follow `route` unless told otherwise.
    #[must_use]
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
            starting_health: DEFAULT_STARTING_HEALTH,
            starting_gold: 0,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }

    /// Sets the distance at which an entity counts as having reached a waypoint.
    #[must_use]
    pub const fn with_arrival_threshold(mut self, arrival_threshold: f32) -> Self {
        self.arrival_threshold = arrival_threshold;
        self
    }

    /// Sets the resources every session starts with.
    #[must_use]
    pub const fn with_starting_resources(mut self, health: u32, gold: u64) -> Self {
        self.starting_health = health;
        self.starting_gold = gold;
        self
    }

    /// Sets the wall-clock cadence at which snapshots are published.
    #[must_use]
    pub const fn with_publish_interval(mut self, publish_interval: Duration) -> Self {
        self.publish_interval = publish_interval;
        self
    }

    /// Route followed by spawns that do not name one.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }
}

/// Problems surfaced by a tick without aborting it.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OrchestratorError {
    /// A spawn referenced a route that was never registered.
    #[error("entity {entity} spawned on unregistered route `{route}`")]
    UnregisteredRoute {
        /// Entity whose spawn was aborted.
        entity: EntityId,
        /// Route name that failed to resolve.
        route: String,
    },
    /// A spawn reused the identifier of an entity that is still tracked.
    #[error("entity {entity} is already tracked")]
    DuplicateEntity {
        /// Entity reported twice.
        entity: EntityId,
    },
    /// A follower could not be started.
    #[error("follower for entity {entity} failed to start")]
    Follower {
        /// Entity driven by the follower.
        entity: EntityId,
        /// Underlying follower error.
        #[source]
        source: FollowerError,
    },
}

/// Everything a single tick produced.
#[derive(Debug, Default)]
pub struct TickReport {
    /// World and follower events in the order they occurred.
    pub events: Vec<Event>,
    /// Snapshot published during the tick, if the cadence elapsed.
    pub snapshot: Option<StateSnapshot>,
    /// Configuration errors encountered during intake.
    pub errors: Vec<OrchestratorError>,
}

/// Single authoritative owner of a session's world and active registry.
#[derive(Debug)]
pub struct Orchestrator {
    config: Config,
    world: World,
    registry: Registry,
    inbox: Inbox,
    publisher: Publisher,
}

impl Orchestrator {
    /// Creates an idle session using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureSession {
                starting_health: config.starting_health,
                starting_gold: config.starting_gold,
            },
            &mut events,
        );

        Self {
            publisher: Publisher::new(publishing::Config::new(config.publish_interval)),
            config,
            world,
            registry: Registry::default(),
            inbox: Inbox::new(),
        }
    }

    /// Registers an immutable route followers may be bound to.
    pub fn register_route(&mut self, route: Route) -> Result<(), RouteError> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::RegisterRoute { route }, &mut events);
        match events.pop() {
            Some(Event::RouteRejected { reason, .. }) => Err(reason),
            _ => Ok(()),
        }
    }

    /// Creates a handle engine callbacks use to report spawns and deaths.
    #[must_use]
    pub fn inbox_handle(&self) -> InboxHandle {
        self.inbox.handle()
    }

    /// Read-only access to the session world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Follower tracking the provided entity, if any.
    #[must_use]
    pub fn follower(&self, entity: EntityId) -> Option<&Follower> {
        self.registry.get(entity)
    }

    /// Entities currently tracked, in identifier order.
    #[must_use]
    pub fn tracked_entities(&self) -> Vec<EntityId> {
        self.registry.entities().collect()
    }

    /// Number of entities currently tracked.
    #[must_use]
    pub fn active_entities(&self) -> usize {
        self.registry.len()
    }

    /// Last snapshot published to observers.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<&StateSnapshot> {
        self.publisher.last_snapshot()
    }

    /// Captures the current session state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        capture_snapshot(&self.world, &self.registry)
    }

    /// Runs one tick of the pipeline.
    pub fn tick(
        &mut self,
        dt: Duration,
        host: &mut dyn Host,
        source: &mut dyn SpawnSource,
    ) -> TickReport {
        let mut report = TickReport::default();
        world::apply(&mut self.world, Command::Tick { dt }, &mut report.events);

        match query::game_state(&self.world) {
            GameState::Playing | GameState::GameOver => {
                self.run_pipeline(dt, host, source, &mut report);
            }
            GameState::Paused => {}
            GameState::Idle => {
                let dropped = self.inbox.clear();
                if dropped > 0 {
                    debug!(dropped, "discarded notifications received while idle");
                }
            }
        }

        if report
            .events
            .iter()
            .any(|event| matches!(event, Event::GameStateChanged { .. }))
        {
            self.publisher.request_immediate();
        }

        let mut published = Vec::new();
        self.publisher.handle(
            dt,
            || capture_snapshot(&self.world, &self.registry),
            &mut published,
        );
        report.snapshot = published.pop();
        report
    }

    /// Applies a session control command and answers with its result code.
    ///
    /// Successful starts and stops empty the registry, halting every tracked
    /// entity and releasing its handle.
    pub fn handle_control(&mut self, command: ControlCommand, host: &mut dyn Host) -> ResultCode {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Control { command }, &mut events);

        let code = events
            .iter()
            .find_map(|event| match event {
                Event::GameStateChanged { .. } => Some(ResultCode::Success),
                Event::ControlRejected { reason, .. } => Some(ResultCode::from(*reason)),
                _ => None,
            })
            .unwrap_or(ResultCode::InternalError);

        if code != ResultCode::Success {
            info!(%command, %code, "control command rejected");
            return code;
        }

        if matches!(command, ControlCommand::StartGame | ControlCommand::StopGame) {
            let released = self.clear_registry(host);
            let dropped = self.inbox.clear();
            debug!(released, dropped, "registry and inbox cleared");
        }
        self.publisher.request_immediate();
        info!(
            %command,
            state = ?query::game_state(&self.world),
            "control command applied"
        );
        code
    }

    /// Parses a control command from its wire name and applies it.
    pub fn handle_control_name(&mut self, name: &str, host: &mut dyn Host) -> ResultCode {
        match name.parse::<ControlCommand>() {
            Ok(command) => self.handle_control(command, host),
            Err(code) => {
                warn!(name, "unknown control command");
                code
            }
        }
    }

    /// Ends the session, halting and releasing every tracked entity.
    pub fn teardown(mut self, host: &mut dyn Host) {
        let released = self.clear_registry(host);
        info!(released, "session torn down");
    }

    fn clear_registry(&mut self, host: &mut dyn Host) -> usize {
        let followers = self.registry.drain();
        let released = followers.len();
        for mut follower in followers {
            follower.stop(host);
            host.release(follower.entity());
        }
        released
    }

    fn run_pipeline(
        &mut self,
        dt: Duration,
        host: &mut dyn Host,
        source: &mut dyn SpawnSource,
        report: &mut TickReport,
    ) {
        let defeated = query::is_defeated(&self.world);
        let mut removals = BTreeMap::new();
        let mut completed = BTreeSet::new();

        if defeated {
            for notice in self.inbox.drain_spawns() {
                if let SpawnNotice::EntitySpawned { entity, .. } = notice {
                    debug!(%entity, "spawn intake closed after defeat; releasing entity");
                    host.release(entity);
                }
            }
        } else {
            self.intake(dt, host, source, &mut removals, report);
            self.advance(host, &mut completed, &mut removals, &mut report.events);
        }

        self.reconcile_deaths(host, &mut completed, &mut removals, &mut report.events);
        self.resolve_completions(completed, &mut removals, &mut report.events);
        self.compact(host, removals, &mut report.events);
    }

    fn intake(
        &mut self,
        dt: Duration,
        host: &mut dyn Host,
        source: &mut dyn SpawnSource,
        removals: &mut BTreeMap<EntityId, RemovalReason>,
        report: &mut TickReport,
    ) {
        let mut notices = Vec::new();
        source.advance(dt, host, &mut notices);
        notices.extend(self.inbox.drain_spawns());

        for notice in notices {
            match notice {
                SpawnNotice::EntitySpawned { entity, route } => {
                    self.admit(entity, route, host, removals, report);
                }
                SpawnNotice::WaveStarted { wave } => debug!(wave, "wave started"),
                SpawnNotice::WaveCompleted { wave } => debug!(wave, "wave completed"),
                SpawnNotice::LevelCompleted => debug!("level completed"),
            }
        }

        world::apply(
            &mut self.world,
            Command::RecordWaveProgress {
                progress: source.progress(),
            },
            &mut report.events,
        );
    }

    fn admit(
        &mut self,
        entity: EntityId,
        route: Option<String>,
        host: &mut dyn Host,
        removals: &mut BTreeMap<EntityId, RemovalReason>,
        report: &mut TickReport,
    ) {
        let route_name = route.unwrap_or_else(|| self.config.route.clone());
        let Some(route) = query::route(&self.world, &route_name) else {
            error!(%entity, route = %route_name, "spawn references unregistered route; aborting spawn");
            host.release(entity);
            report.errors.push(OrchestratorError::UnregisteredRoute {
                entity,
                route: route_name,
            });
            return;
        };

        if self.registry.contains(entity) {
            warn!(%entity, "spawn reported for an entity that is already tracked");
            report
                .errors
                .push(OrchestratorError::DuplicateEntity { entity });
            return;
        }

        let mut follower = Follower::new(entity, route, self.config.arrival_threshold);
        let started = follower.start(host);
        let _ = self.registry.insert(follower);
        world::apply(
            &mut self.world,
            Command::RecordSpawn {
                entity,
                route: route_name,
            },
            &mut report.events,
        );

        if let Err(source) = started {
            let _ = removals.entry(entity).or_insert(RemovalReason::Stopped);
            report
                .errors
                .push(OrchestratorError::Follower { entity, source });
        }
    }

    fn advance(
        &mut self,
        host: &mut dyn Host,
        completed: &mut BTreeSet<EntityId>,
        removals: &mut BTreeMap<EntityId, RemovalReason>,
        events: &mut Vec<Event>,
    ) {
        for follower in self.registry.iter_mut() {
            match follower.advance(host, events) {
                FollowerState::Completed => {
                    let _ = completed.insert(follower.entity());
                }
                FollowerState::Stopped => {
                    let _ = removals
                        .entry(follower.entity())
                        .or_insert(RemovalReason::Stopped);
                }
                FollowerState::Idle | FollowerState::Moving => {}
            }
        }
    }

    fn reconcile_deaths(
        &mut self,
        host: &mut dyn Host,
        completed: &mut BTreeSet<EntityId>,
        removals: &mut BTreeMap<EntityId, RemovalReason>,
        events: &mut Vec<Event>,
    ) {
        for notice in self.inbox.drain_deaths() {
            let entity = notice.entity;
            // A follower stopped in step 2 is still registered, so its death counts.
            if matches!(
                removals.get(&entity),
                Some(RemovalReason::Killed | RemovalReason::Destroyed)
            ) {
                debug!(%entity, "death reported for an entity already leaving");
                continue;
            }
            let Some(follower) = self.registry.get_mut(entity) else {
                debug!(%entity, "death reported for an untracked entity; ignoring");
                continue;
            };

            match notice.cause {
                DeathCause::KilledByDamage => {
                    follower.stop(host);
                    let _ = completed.remove(&entity);
                    world::apply(
                        &mut self.world,
                        Command::ApplyKillReward { entity },
                        events,
                    );
                    let _ = removals.insert(entity, RemovalReason::Killed);
                }
                DeathCause::Destroyed => {
                    if completed.contains(&entity) {
                        debug!(%entity, "engine despawn of a completed entity; breach already pending");
                        continue;
                    }
                    follower.stop(host);
                    let _ = removals.insert(entity, RemovalReason::Destroyed);
                }
            }
        }
    }

    fn resolve_completions(
        &mut self,
        completed: BTreeSet<EntityId>,
        removals: &mut BTreeMap<EntityId, RemovalReason>,
        events: &mut Vec<Event>,
    ) {
        for entity in completed {
            world::apply(
                &mut self.world,
                Command::ApplyRouteCompletionPenalty { entity },
                events,
            );
            let _ = removals.entry(entity).or_insert(RemovalReason::Breached);
        }

        if events.contains(&Event::Defeated) {
            info!("player health exhausted; spawn intake closed");
        }
    }

    fn compact(
        &mut self,
        host: &mut dyn Host,
        removals: BTreeMap<EntityId, RemovalReason>,
        events: &mut Vec<Event>,
    ) {
        for (entity, reason) in removals {
            if self.registry.remove(entity).is_none() {
                debug!(%entity, "entity already absent during compaction");
            }
            host.release(entity);
            events.push(Event::EntityRemoved { entity, reason });
        }
    }
}

fn capture_snapshot(world: &World, registry: &Registry) -> StateSnapshot {
    StateSnapshot {
        game_state: query::game_state(world),
        wave: query::wave_progress(world),
        active_entities: registry.len(),
        monsters_spawned: query::monsters_spawned(world),
        elapsed: query::elapsed(world),
        health: query::health(world),
        gold: query::gold(world),
    }
}
