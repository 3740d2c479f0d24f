//! Active entity registry.

use std::collections::BTreeMap;

use lane_defence_core::EntityId;
use lane_defence_system_follower::Follower;

/// Followers of every entity that is alive and not yet removed.
///
/// Entries are added only by spawn intake and removed only by compaction,
/// never while the registry is being iterated.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    followers: BTreeMap<EntityId, Follower>,
}

impl Registry {
    /// Inserts the follower unless its entity is already tracked.
    pub(crate) fn insert(&mut self, follower: Follower) -> bool {
        let entity = follower.entity();
        if self.followers.contains_key(&entity) {
            return false;
        }
        let _ = self.followers.insert(entity, follower);
        true
    }

    pub(crate) fn contains(&self, entity: EntityId) -> bool {
        self.followers.contains_key(&entity)
    }

    pub(crate) fn get(&self, entity: EntityId) -> Option<&Follower> {
        self.followers.get(&entity)
    }

    pub(crate) fn get_mut(&mut self, entity: EntityId) -> Option<&mut Follower> {
        self.followers.get_mut(&entity)
    }

    pub(crate) fn remove(&mut self, entity: EntityId) -> Option<Follower> {
        self.followers.remove(&entity)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Follower> {
        self.followers.values_mut()
    }

    pub(crate) fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.followers.keys().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.followers.len()
    }

    pub(crate) fn drain(&mut self) -> Vec<Follower> {
        std::mem::take(&mut self.followers).into_values().collect()
    }
}
