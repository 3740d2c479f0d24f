//! Seeded stand-in for the combat subsystem.

use std::time::Duration;

use lane_defence_core::{DeathCause, EntityId};
use lane_defence_system_orchestrator::InboxHandle;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Kills tracked entities at random and reports the deaths to the inbox.
#[derive(Debug)]
pub(crate) struct CombatSimulator {
    kill_rate: f64,
    rng: ChaCha8Rng,
    inbox: InboxHandle,
}

impl CombatSimulator {
    pub(crate) fn new(kill_rate: f64, seed: u64, inbox: InboxHandle) -> Self {
        Self {
            kill_rate,
            rng: ChaCha8Rng::seed_from_u64(seed),
            inbox,
        }
    }

    /// Rolls once per entity for the elapsed `dt` and returns the number killed.
    pub(crate) fn strike(&mut self, dt: Duration, targets: &[EntityId]) -> usize {
        let chance = (self.kill_rate * dt.as_secs_f64()).clamp(0.0, 1.0);
        if chance == 0.0 {
            return 0;
        }

        let mut killed = 0;
        for &entity in targets {
            if self.rng.gen_bool(chance) {
                debug!(%entity, "combat kill");
                self.inbox.entity_died(entity, DeathCause::KilledByDamage);
                killed += 1;
            }
        }
        killed
    }
}
