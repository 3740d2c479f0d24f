//! In-process stand-in for the host engine.

use std::{collections::BTreeMap, time::Duration};

use lane_defence_core::{CommandRejected, EntityId, Host, Vec3};
use tracing::debug;

#[derive(Clone, Debug)]
struct Unit {
    position: Vec3,
    destination: Option<Vec3>,
}

/// Moves units in straight lines toward their last ordered destination.
#[derive(Debug)]
pub(crate) struct SimulatedHost {
    speed: f32,
    units: BTreeMap<EntityId, Unit>,
    next_id: u32,
}

impl SimulatedHost {
    pub(crate) fn new(speed: f32) -> Self {
        Self {
            speed,
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Advances every moving unit by `dt` of travel.
    pub(crate) fn step(&mut self, dt: Duration) {
        let reach = self.speed * dt.as_secs_f32();
        for unit in self.units.values_mut() {
            let Some(destination) = unit.destination else {
                continue;
            };
            let offset = destination - unit.position;
            let distance = offset.length();
            if distance <= reach {
                unit.position = destination;
                unit.destination = None;
            } else {
                unit.position += offset / distance * reach;
            }
        }
    }

    pub(crate) fn live_units(&self) -> usize {
        self.units.len()
    }

    fn unit_mut(&mut self, entity: EntityId) -> Result<&mut Unit, CommandRejected> {
        self.units
            .get_mut(&entity)
            .ok_or_else(|| CommandRejected::new(entity, "no such unit"))
    }
}

impl Host for SimulatedHost {
    fn issue_move(&mut self, entity: EntityId, destination: Vec3) -> Result<(), CommandRejected> {
        self.unit_mut(entity)?.destination = Some(destination);
        Ok(())
    }

    fn issue_halt(&mut self, entity: EntityId) -> Result<(), CommandRejected> {
        self.unit_mut(entity)?.destination = None;
        Ok(())
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.units.get(&entity).map(|unit| unit.position)
    }

    fn create_entity(
        &mut self,
        kind: &str,
        position: Vec3,
        owner: u32,
    ) -> Result<EntityId, CommandRejected> {
        if kind.is_empty() {
            return Err(CommandRejected::unbound("unit kind must not be empty"));
        }
        let entity = EntityId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.units.insert(
            entity,
            Unit {
                position,
                destination: None,
            },
        );
        debug!(%entity, kind, owner, "unit created");
        Ok(entity)
    }

    fn release(&mut self, entity: EntityId) {
        if self.units.remove(&entity).is_some() {
            debug!(%entity, "unit released");
        }
    }
}
