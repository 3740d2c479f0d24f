//! Narrow contract consumed from the host engine.

use glam::Vec3;
use thiserror::Error;

use crate::EntityId;

/// Entity and movement primitives provided by the host engine.
///
/// Commands are fire-and-forget: a successful return only means the engine
/// accepted the order, never that the entity arrived. Both move and halt are
/// idempotent, and issuing a new move replaces any order in flight.
pub trait Host {
    /// Orders the entity to walk toward `destination`.
    fn issue_move(&mut self, entity: EntityId, destination: Vec3) -> Result<(), CommandRejected>;

    /// Orders the entity to stop where it stands.
    fn issue_halt(&mut self, entity: EntityId) -> Result<(), CommandRejected>;

    /// Current position of the entity, or `None` if the engine no longer knows it.
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// Creates a new entity of the provided kind.
    fn create_entity(
        &mut self,
        kind: &str,
        position: Vec3,
        owner: u32,
    ) -> Result<EntityId, CommandRejected>;

    /// Releases the engine handle held for the entity. Releasing an unknown
    /// entity does nothing.
    fn release(&mut self, entity: EntityId);
}

/// Error returned when the host engine refuses a command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("host rejected command: {reason}")]
pub struct CommandRejected {
    /// Entity the command addressed, if one existed yet.
    pub entity: Option<EntityId>,
    /// Engine-provided explanation.
    pub reason: String,
}

impl CommandRejected {
    /// Creates a new rejection for the provided entity.
    #[must_use]
    pub fn new(entity: EntityId, reason: impl Into<String>) -> Self {
        Self {
            entity: Some(entity),
            reason: reason.into(),
        }
    }

    /// Creates a rejection for a command that never produced an entity.
    #[must_use]
    pub fn unbound(reason: impl Into<String>) -> Self {
        Self {
            entity: None,
            reason: reason.into(),
        }
    }
}
