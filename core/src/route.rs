//! Immutable routes that monsters walk from their spawn to the goal.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Single point along a route together with the zone it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    position: Vec3,
    zone: String,
}

impl Waypoint {
    /// Creates a waypoint at the provided position tagged with a zone name.
    #[must_use]
    pub fn new(position: Vec3, zone: impl Into<String>) -> Self {
        Self {
            position,
            zone: zone.into(),
        }
    }

    /// World-space position of the waypoint.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Zone tag the waypoint was authored in.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }
}

/// Named, ordered sequence of waypoints.
///
/// Routes are authored once at startup and never mutated afterwards, so a
/// single route can be shared by any number of followers behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    name: String,
    waypoints: Vec<Waypoint>,
    looped: bool,
}

impl Route {
    /// Creates a new route.
    ///
    /// Construction accepts an empty waypoint list; registering such a route
    /// with the world is what rejects it.
    #[must_use]
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>, looped: bool) -> Self {
        Self {
            name: name.into(),
            waypoints,
            looped,
        }
    }

    /// Name the route is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports whether the route wraps back to its first waypoint.
    #[must_use]
    pub const fn is_looped(&self) -> bool {
        self.looped
    }

    /// Number of waypoints in the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the route contains no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Ordered waypoints composing the route.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Retrieves the waypoint stored at `index`.
    pub fn waypoint(&self, index: usize) -> Result<&Waypoint, RouteError> {
        self.waypoints.get(index).ok_or(RouteError::IndexOutOfRange {
            index,
            len: self.waypoints.len(),
        })
    }

    /// Index of the waypoint following `index`.
    ///
    /// Looped routes wrap to zero. Open routes yield `None` once `index` is
    /// the final waypoint, as do indices outside the route.
    #[must_use]
    pub fn next_index(&self, index: usize) -> Option<usize> {
        let len = self.waypoints.len();
        if index >= len {
            return None;
        }

        let next = index + 1;
        if self.looped {
            Some(next % len)
        } else if next < len {
            Some(next)
        } else {
            None
        }
    }

    /// Sum of the segment lengths, including the closing segment when looped.
    #[must_use]
    pub fn total_length(&self) -> f32 {
        let open: f32 = self
            .waypoints
            .windows(2)
            .map(|pair| pair[0].position.distance(pair[1].position))
            .sum();

        match (self.looped, self.waypoints.first(), self.waypoints.last()) {
            (true, Some(first), Some(last)) if self.waypoints.len() > 1 => {
                open + last.position.distance(first.position)
            }
            _ => open,
        }
    }
}

/// Reasons a route lookup or registration can fail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The route contains no waypoints.
    #[error("route has no waypoints")]
    EmptyRoute,
    /// The requested waypoint index lies outside the route.
    #[error("waypoint index {index} out of range for route of length {len}")]
    IndexOutOfRange {
        /// Index that was requested.
        index: usize,
        /// Number of waypoints in the route.
        len: usize,
    },
    /// Another route is already registered under the same name.
    #[error("route `{name}` is already registered")]
    DuplicateRoute {
        /// Name shared by both routes.
        name: String,
    },
}
