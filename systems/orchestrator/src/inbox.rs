//! Buffer for notifications that arrive between ticks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lane_defence_core::{DeathCause, DeathNotice, EntityId, SpawnNotice};

#[derive(Debug, Default)]
struct Pending {
    spawns: Vec<SpawnNotice>,
    deaths: Vec<DeathNotice>,
}

/// Receiving side of the notification buffer, owned by the orchestrator.
#[derive(Debug, Default)]
pub struct Inbox {
    shared: Arc<Mutex<Pending>>,
}

/// Cloneable sending side handed to engine callbacks.
///
/// Handles may be used from any thread. Nothing they record takes effect
/// before the orchestrator drains the inbox during its next tick.
#[derive(Clone, Debug)]
pub struct InboxHandle {
    shared: Arc<Mutex<Pending>>,
}

impl Inbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new sending handle.
    #[must_use]
    pub fn handle(&self) -> InboxHandle {
        InboxHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub(crate) fn drain_spawns(&self) -> Vec<SpawnNotice> {
        std::mem::take(&mut lock(&self.shared).spawns)
    }

    pub(crate) fn drain_deaths(&self) -> Vec<DeathNotice> {
        std::mem::take(&mut lock(&self.shared).deaths)
    }

    pub(crate) fn clear(&self) -> usize {
        let mut pending = lock(&self.shared);
        let dropped = pending.spawns.len() + pending.deaths.len();
        pending.spawns.clear();
        pending.deaths.clear();
        dropped
    }
}

impl InboxHandle {
    /// Records that the spawn source created an entity.
    pub fn entity_spawned(&self, entity: EntityId, route: Option<String>) {
        lock(&self.shared)
            .spawns
            .push(SpawnNotice::EntitySpawned { entity, route });
    }

    /// Records that the combat subsystem reported an entity as dead.
    pub fn entity_died(&self, entity: EntityId, cause: DeathCause) {
        lock(&self.shared)
            .deaths
            .push(DeathNotice::new(entity, cause));
    }

    /// Records that a wave began.
    pub fn wave_started(&self, wave: u32) {
        lock(&self.shared)
            .spawns
            .push(SpawnNotice::WaveStarted { wave });
    }

    /// Records that a wave finished spawning.
    pub fn wave_completed(&self, wave: u32) {
        lock(&self.shared)
            .spawns
            .push(SpawnNotice::WaveCompleted { wave });
    }

    /// Records that the final wave finished spawning.
    pub fn level_completed(&self) {
        lock(&self.shared).spawns.push(SpawnNotice::LevelCompleted);
    }
}

// Every critical section is a plain push or take, so a poisoned lock still
// guards consistent data.
fn lock(shared: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
