#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn source boundary and a deterministic cadence-driven wave scheduler.

use std::time::Duration;

use lane_defence_core::{Host, SpawnNotice, Vec3, WaveProgress};
use tracing::{info, warn};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// External producer of spawned entities and wave bookkeeping.
pub trait SpawnSource {
    /// Lets the source run for `dt` and report what it produced.
    fn advance(&mut self, dt: Duration, host: &mut dyn Host, out: &mut Vec<SpawnNotice>);

    /// Current wave progress.
    fn progress(&self) -> WaveProgress;
}

/// Location monsters appear at together with the route they walk.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    spawn: Vec3,
    route: Option<String>,
}

impl Lane {
    /// Creates a lane spawning at `spawn` that follows the session's route.
    #[must_use]
    pub const fn new(spawn: Vec3) -> Self {
        Self { spawn, route: None }
    }

    /// Binds the lane to a named route instead of the session default.
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Debug)]
pub struct WaveSchedule {
    total_waves: u32,
    base_count: u32,
    count_growth: u32,
    spawn_interval: Duration,
    wave_gap: Duration,
    kind: String,
    owner: u32,
    rng_seed: u64,
}

impl WaveSchedule {
    /// Creates a schedule of `total_waves` waves.
    ///
    /// Wave `n` (one-based) contains `base_count + (n - 1) * count_growth`
    /// monsters spawned `spawn_interval` apart, with `wave_gap` of quiet before
    /// each wave.
    #[must_use]
    pub fn new(
        total_waves: u32,
        base_count: u32,
        count_growth: u32,
        spawn_interval: Duration,
        wave_gap: Duration,
    ) -> Self {
        Self {
            total_waves,
            base_count,
            count_growth,
            spawn_interval,
            wave_gap,
            kind: "monster".to_owned(),
            owner: 0,
            rng_seed: 0,
        }
    }

    /// Sets the entity kind and owning player passed to the host.
    #[must_use]
    pub fn with_unit(mut self, kind: impl Into<String>, owner: u32) -> Self {
        self.kind = kind.into();
        self.owner = owner;
        self
    }

    /// Sets the seed used to pick lanes.
    #[must_use]
    pub const fn with_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    /// Number of monsters in the provided one-based wave.
    #[must_use]
    pub fn wave_size(&self, wave: u32) -> u32 {
        let growth = self.count_growth.saturating_mul(wave.saturating_sub(1));
        self.base_count.saturating_add(growth)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Gap,
    Spawning,
    Finished,
}

/// Spawn source that emits waves on a fixed cadence.
#[derive(Debug)]
pub struct WaveScheduler {
    schedule: WaveSchedule,
    lanes: Vec<Lane>,
    phase: Phase,
    accumulator: Duration,
    current_wave: u32,
    remaining: u32,
    rng_state: u64,
}

impl WaveScheduler {
    /// Creates a new scheduler that spawns along the provided lanes.
    #[must_use]
    pub fn new(schedule: WaveSchedule, lanes: Vec<Lane>) -> Self {
        Self {
            rng_state: schedule.rng_seed,
            schedule,
            lanes,
            phase: Phase::Gap,
            accumulator: Duration::ZERO,
            current_wave: 0,
            remaining: 0,
        }
    }

    /// Restarts the schedule from the first wave.
    pub fn reset(&mut self) {
        self.phase = Phase::Gap;
        self.accumulator = Duration::ZERO;
        self.current_wave = 0;
        self.remaining = 0;
        self.rng_state = self.schedule.rng_seed;
    }

    fn begin_wave(&mut self, out: &mut Vec<SpawnNotice>) {
        self.current_wave += 1;
        self.remaining = self.schedule.wave_size(self.current_wave);
        self.phase = Phase::Spawning;
        info!(
            wave = self.current_wave,
            monsters = self.remaining,
            "wave started"
        );
        out.push(SpawnNotice::WaveStarted {
            wave: self.current_wave,
        });
    }

    fn spawn_one(&mut self, host: &mut dyn Host, out: &mut Vec<SpawnNotice>) {
        self.remaining = self.remaining.saturating_sub(1);
        let lane = self.select_lane().clone();
        match host.create_entity(&self.schedule.kind, lane.spawn, self.schedule.owner) {
            Ok(entity) => out.push(SpawnNotice::EntitySpawned {
                entity,
                route: lane.route,
            }),
            Err(rejection) => warn!(
                wave = self.current_wave,
                error = %rejection,
                "host refused to create monster; skipping slot"
            ),
        }
    }

    fn finish_wave(&mut self, out: &mut Vec<SpawnNotice>) {
        info!(wave = self.current_wave, "wave completed");
        out.push(SpawnNotice::WaveCompleted {
            wave: self.current_wave,
        });
        if self.current_wave >= self.schedule.total_waves {
            info!("level completed");
            out.push(SpawnNotice::LevelCompleted);
            self.phase = Phase::Finished;
        } else {
            self.phase = Phase::Gap;
        }
    }

    fn select_lane(&mut self) -> &Lane {
        debug_assert!(!self.lanes.is_empty(), "select_lane requires lanes");
        let value = self.advance_rng();
        let index = (value % self.lanes.len() as u64) as usize;
        &self.lanes[index]
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

impl SpawnSource for WaveScheduler {
    fn advance(&mut self, dt: Duration, host: &mut dyn Host, out: &mut Vec<SpawnNotice>) {
        if self.phase == Phase::Finished || self.lanes.is_empty() {
            return;
        }

        if self.schedule.total_waves == 0 {
            self.phase = Phase::Finished;
            out.push(SpawnNotice::LevelCompleted);
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);

        loop {
            match self.phase {
                Phase::Gap => {
                    if self.accumulator < self.schedule.wave_gap {
                        break;
                    }
                    self.accumulator -= self.schedule.wave_gap;
                    self.begin_wave(out);
                    if self.remaining == 0 {
                        self.finish_wave(out);
                        continue;
                    }
                    self.spawn_one(host, out);
                    if self.remaining == 0 {
                        self.finish_wave(out);
                    }
                }
                Phase::Spawning => {
                    if self.schedule.spawn_interval.is_zero() {
                        while self.remaining > 0 {
                            self.spawn_one(host, out);
                        }
                    } else if self.accumulator >= self.schedule.spawn_interval {
                        self.accumulator -= self.schedule.spawn_interval;
                        self.spawn_one(host, out);
                    } else {
                        break;
                    }

                    if self.remaining == 0 {
                        self.finish_wave(out);
                    }
                }
                Phase::Finished => break,
            }
        }
    }

    fn progress(&self) -> WaveProgress {
        WaveProgress::new(
            self.current_wave,
            self.schedule.total_waves,
            self.phase == Phase::Finished,
        )
    }
}
