#![allow(dead_code)]

use std::{collections::BTreeMap, collections::VecDeque, time::Duration};

use lane_defence_core::{
    CommandRejected, EntityId, Host, Route, SpawnNotice, Vec3, WaveProgress, Waypoint,
};
use lane_defence_system_spawning::SpawnSource;

/// Host double that records every command and moves entities only when told.
#[derive(Debug, Default)]
pub struct TestHost {
    pub positions: BTreeMap<EntityId, Vec3>,
    pub destinations: BTreeMap<EntityId, Vec3>,
    pub moves: Vec<(EntityId, Vec3)>,
    pub halts: Vec<EntityId>,
    pub released: Vec<EntityId>,
    pub reject_moves: bool,
    next_id: u32,
}

impl TestHost {
    pub fn place(&mut self, entity: EntityId, position: Vec3) {
        let _ = self.positions.insert(entity, position);
    }

    /// Moves every entity `speed * dt` closer to its destination.
    pub fn step(&mut self, dt: Duration, speed: f32) {
        let reach = speed * dt.as_secs_f32();
        for (entity, destination) in &self.destinations {
            if let Some(position) = self.positions.get_mut(entity) {
                let offset = *destination - *position;
                let distance = offset.length();
                if distance <= reach {
                    *position = *destination;
                } else {
                    *position += offset / distance * reach;
                }
            }
        }
    }
}

impl Host for TestHost {
    fn issue_move(&mut self, entity: EntityId, destination: Vec3) -> Result<(), CommandRejected> {
        if self.reject_moves {
            return Err(CommandRejected::new(entity, "unit is stunned"));
        }
        self.moves.push((entity, destination));
        let _ = self.destinations.insert(entity, destination);
        Ok(())
    }

    fn issue_halt(&mut self, entity: EntityId) -> Result<(), CommandRejected> {
        self.halts.push(entity);
        let _ = self.destinations.remove(&entity);
        Ok(())
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.positions.get(&entity).copied()
    }

    fn create_entity(
        &mut self,
        _kind: &str,
        position: Vec3,
        _owner: u32,
    ) -> Result<EntityId, CommandRejected> {
        self.next_id += 1;
        let entity = EntityId::new(1000 + self.next_id);
        self.place(entity, position);
        Ok(entity)
    }

    fn release(&mut self, entity: EntityId) {
        let _ = self.positions.remove(&entity);
        let _ = self.destinations.remove(&entity);
        self.released.push(entity);
    }
}

/// Spawn source that creates one batch of entities per call from a script.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    batches: VecDeque<Vec<Vec3>>,
    pub advances: u32,
}

impl ScriptedSource {
    pub fn push_batch(&mut self, positions: Vec<Vec3>) {
        self.batches.push_back(positions);
    }
}

impl SpawnSource for ScriptedSource {
    fn advance(&mut self, _dt: Duration, host: &mut dyn Host, out: &mut Vec<SpawnNotice>) {
        self.advances += 1;
        for position in self.batches.pop_front().unwrap_or_default() {
            if let Ok(entity) = host.create_entity("monster", position, 0) {
                out.push(SpawnNotice::EntitySpawned {
                    entity,
                    route: None,
                });
            }
        }
    }

    fn progress(&self) -> WaveProgress {
        WaveProgress::default()
    }
}

pub fn corner_route() -> Route {
    Route::new(
        "corner",
        vec![
            Waypoint::new(Vec3::new(0.0, 0.0, 0.0), "gate"),
            Waypoint::new(Vec3::new(10.0, 0.0, 0.0), "bend"),
            Waypoint::new(Vec3::new(10.0, 10.0, 0.0), "goal"),
        ],
        false,
    )
}

pub fn short_route() -> Route {
    Route::new(
        "short",
        vec![
            Waypoint::new(Vec3::ZERO, "gate"),
            Waypoint::new(Vec3::new(5.0, 0.0, 0.0), "goal"),
        ],
        false,
    )
}

pub const TICK: Duration = Duration::from_millis(100);
