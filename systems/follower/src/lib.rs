#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-entity route follower that turns a multi-point route into a sequence
//! of single-destination move commands.
//!
//! Arrival is detected by polling the entity's distance to its current target
//! once per [`Follower::advance`] call rather than by waiting on the host's own
//! order-completion signal, which does not fire reliably for every command
//! configuration.

use std::sync::Arc;

use lane_defence_core::{CommandRejected, EntityId, Event, Host, Route};
use thiserror::Error;
use tracing::{debug, warn};

/// Lifecycle of a follower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FollowerState {
    /// Created but not yet started.
    Idle,
    /// Walking toward the current target waypoint.
    Moving,
    /// Reached the final waypoint of an open route.
    Completed,
    /// Halted by request or after a rejected command.
    Stopped,
}

impl FollowerState {
    /// Reports whether the follower will never issue another command.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }
}

/// Errors raised while starting a follower.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FollowerError {
    /// The route contains no waypoints.
    #[error("route `{route}` has no waypoints")]
    EmptyRoute {
        /// Name of the offending route.
        route: String,
    },
    /// The follower was already started.
    #[error("follower cannot start from state {state:?}")]
    NotIdle {
        /// State the follower was in.
        state: FollowerState,
    },
    /// The host refused the initial move command.
    #[error(transparent)]
    MoveRejected(#[from] CommandRejected),
}

/// Drives a single entity along a shared route.
#[derive(Clone, Debug)]
pub struct Follower {
    entity: EntityId,
    route: Arc<Route>,
    current_index: usize,
    target: Option<usize>,
    state: FollowerState,
    arrival_threshold: f32,
}

impl Follower {
    /// Creates an idle follower bound to the provided entity and route.
    #[must_use]
    pub fn new(entity: EntityId, route: Arc<Route>, arrival_threshold: f32) -> Self {
        Self {
            entity,
            route,
            current_index: 0,
            target: None,
            state: FollowerState::Idle,
            arrival_threshold: arrival_threshold.max(0.0),
        }
    }

    /// Entity driven by the follower.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Route the follower walks.
    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> FollowerState {
        self.state
    }

    /// Index of the most recently reached waypoint, zero before any arrival.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Index of the waypoint the entity is walking toward.
    ///
    /// Undefined once the follower completed or stopped.
    #[must_use]
    pub const fn current_target(&self) -> Option<usize> {
        self.target
    }

    /// Fraction of the route covered, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.state == FollowerState::Completed {
            return 1.0;
        }

        let last = self.route.len().saturating_sub(1);
        if last == 0 {
            return 0.0;
        }

        (self.current_index as f32 / last as f32).clamp(0.0, 1.0)
    }

    /// Issues the first move command toward waypoint zero.
    ///
    /// A rejected move leaves the follower stopped; it is never retried.
    pub fn start(&mut self, host: &mut dyn Host) -> Result<(), FollowerError> {
        if self.state != FollowerState::Idle {
            return Err(FollowerError::NotIdle { state: self.state });
        }

        let Ok(first) = self.route.waypoint(0) else {
            return Err(FollowerError::EmptyRoute {
                route: self.route.name().to_owned(),
            });
        };

        if let Err(rejection) = host.issue_move(self.entity, first.position()) {
            warn!(
                entity = %self.entity,
                route = self.route.name(),
                error = %rejection,
                "initial move rejected; stopping follower"
            );
            self.state = FollowerState::Stopped;
            return Err(rejection.into());
        }

        self.target = Some(0);
        self.state = FollowerState::Moving;
        Ok(())
    }

    /// Polls arrival once and re-targets when the current waypoint is reached.
    ///
    /// Completed and stopped followers are left untouched. Returns the state
    /// after the call.
    pub fn advance(&mut self, host: &mut dyn Host, out: &mut Vec<Event>) -> FollowerState {
        if self.state != FollowerState::Moving {
            return self.state;
        }

        let Some(target_index) = self.target else {
            return self.state;
        };
        let Ok(target) = self.route.waypoint(target_index) else {
            return self.state;
        };

        let Some(position) = host.position(self.entity) else {
            warn!(entity = %self.entity, "host lost track of entity; stopping follower");
            self.target = None;
            self.state = FollowerState::Stopped;
            return self.state;
        };

        if position.distance(target.position()) > self.arrival_threshold {
            return self.state;
        }

        self.current_index = target_index;
        out.push(Event::WaypointReached {
            entity: self.entity,
            index: target_index,
        });

        let Some(next_index) = self.route.next_index(target_index) else {
            debug!(entity = %self.entity, route = self.route.name(), "route completed");
            self.target = None;
            self.state = FollowerState::Completed;
            out.push(Event::RouteCompleted {
                entity: self.entity,
            });
            return self.state;
        };

        let Ok(next) = self.route.waypoint(next_index) else {
            return self.state;
        };
        match host.issue_move(self.entity, next.position()) {
            Ok(()) => self.target = Some(next_index),
            Err(rejection) => {
                warn!(
                    entity = %self.entity,
                    waypoint = next_index,
                    error = %rejection,
                    "re-targeting move rejected; stopping follower"
                );
                self.target = None;
                self.state = FollowerState::Stopped;
            }
        }

        self.state
    }

    /// Halts the entity and silences the follower for good.
    ///
    /// Stopping an already stopped follower does nothing. A completed follower
    /// issues no halt since its entity has no outstanding move.
    pub fn stop(&mut self, host: &mut dyn Host) {
        match self.state {
            FollowerState::Stopped => return,
            FollowerState::Completed => {}
            FollowerState::Idle | FollowerState::Moving => {
                if let Err(rejection) = host.issue_halt(self.entity) {
                    debug!(entity = %self.entity, error = %rejection, "halt rejected");
                }
            }
        }
        self.target = None;
        self.state = FollowerState::Stopped;
    }
}
