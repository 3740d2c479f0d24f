//! TOML scenario files describing a headless session.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use lane_defence_core::{Route, Vec3, Waypoint};
use lane_defence_system_orchestrator::Config;
use lane_defence_system_spawning::{Lane, WaveSchedule, WaveScheduler};
use serde::Deserialize;

const BUILTIN_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Everything needed to drive one session from the command line.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub(crate) session: SessionSection,
    pub(crate) routes: Vec<RouteSection>,
    #[serde(default)]
    pub(crate) waves: WavesSection,
    #[serde(default)]
    pub(crate) host: HostSection,
    #[serde(default)]
    pub(crate) combat: CombatSection,
}

/// Session-wide settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionSection {
    pub(crate) route: String,
    pub(crate) tick_rate_hz: u32,
    pub(crate) max_ticks: u64,
    pub(crate) seed: u64,
    pub(crate) auto_start: bool,
    pub(crate) starting_health: u32,
    pub(crate) starting_gold: u64,
    pub(crate) arrival_threshold: f32,
    pub(crate) publish_interval_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            route: "main".to_owned(),
            tick_rate_hz: 20,
            max_ticks: 1_200,
            seed: 0,
            auto_start: true,
            starting_health: 20,
            starting_gold: 0,
            arrival_threshold: 0.5,
            publish_interval_ms: 250,
        }
    }
}

/// A named route and its waypoints.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RouteSection {
    pub(crate) name: String,
    pub(crate) waypoints: Vec<WaypointSection>,
    #[serde(default)]
    pub(crate) looped: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WaypointSection {
    pub(crate) position: [f32; 3],
    #[serde(default)]
    pub(crate) zone: String,
}

/// Wave cadence and spawn lanes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WavesSection {
    pub(crate) total: u32,
    pub(crate) base_count: u32,
    pub(crate) count_growth: u32,
    pub(crate) spawn_interval_ms: u64,
    pub(crate) gap_ms: u64,
    pub(crate) unit_kind: String,
    pub(crate) owner: u32,
    pub(crate) lanes: Vec<LaneSection>,
}

impl Default for WavesSection {
    fn default() -> Self {
        Self {
            total: 3,
            base_count: 5,
            count_growth: 2,
            spawn_interval_ms: 500,
            gap_ms: 2_000,
            unit_kind: "monster".to_owned(),
            owner: 1,
            lanes: vec![LaneSection::default()],
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LaneSection {
    pub(crate) spawn: [f32; 3],
    pub(crate) route: Option<String>,
}

/// Simulated engine movement.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HostSection {
    pub(crate) speed: f32,
}

impl Default for HostSection {
    fn default() -> Self {
        Self { speed: 3.0 }
    }
}

/// Simulated combat subsystem.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CombatSection {
    /// Chance per second that any single tracked entity is killed.
    pub(crate) kill_rate: f64,
}

impl Default for CombatSection {
    fn default() -> Self {
        Self { kill_rate: 0.1 }
    }
}

impl Scenario {
    /// Parses and validates the scenario embedded in the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_SCENARIO).context("built-in scenario is invalid")
    }

    /// Reads, parses and validates a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub(crate) fn parse(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content).context("failed to parse scenario TOML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.session.tick_rate_hz > 0,
            "session.tick_rate_hz must be positive"
        );
        ensure!(
            self.session.starting_health > 0,
            "session.starting_health must be at least 1"
        );
        ensure!(
            self.session.arrival_threshold.is_finite() && self.session.arrival_threshold >= 0.0,
            "session.arrival_threshold must be a non-negative number"
        );
        ensure!(
            self.host.speed.is_finite() && self.host.speed > 0.0,
            "host.speed must be a positive number"
        );
        ensure!(
            self.combat.kill_rate.is_finite() && self.combat.kill_rate >= 0.0,
            "combat.kill_rate must be a non-negative number"
        );

        for (index, route) in self.routes.iter().enumerate() {
            if route.waypoints.is_empty() {
                bail!("routes[{index}] `{}` has no waypoints", route.name);
            }
            if self.routes[..index].iter().any(|other| other.name == route.name) {
                bail!("routes[{index}] reuses the name `{}`", route.name);
            }
        }

        if !self.has_route(&self.session.route) {
            bail!(
                "session.route `{}` does not name a route in [[routes]]",
                self.session.route
            );
        }

        ensure!(
            !self.waves.lanes.is_empty(),
            "waves.lanes must contain at least one lane"
        );
        for (index, lane) in self.waves.lanes.iter().enumerate() {
            if let Some(route) = &lane.route {
                if !self.has_route(route) {
                    bail!("waves.lanes[{index}].route `{route}` does not name a route in [[routes]]");
                }
            }
        }

        Ok(())
    }

    fn has_route(&self, name: &str) -> bool {
        self.routes.iter().any(|route| route.name == name)
    }

    /// Fixed simulation step derived from the tick rate.
    pub(crate) fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.session.tick_rate_hz.max(1)
    }

    pub(crate) fn orchestrator_config(&self) -> Config {
        Config::new(self.session.route.clone())
            .with_arrival_threshold(self.session.arrival_threshold)
            .with_starting_resources(self.session.starting_health, self.session.starting_gold)
            .with_publish_interval(Duration::from_millis(self.session.publish_interval_ms))
    }

    pub(crate) fn routes(&self) -> impl Iterator<Item = Route> + '_ {
        self.routes.iter().map(|route| {
            let waypoints = route
                .waypoints
                .iter()
                .map(|waypoint| {
                    Waypoint::new(Vec3::from_array(waypoint.position), waypoint.zone.clone())
                })
                .collect();
            Route::new(route.name.clone(), waypoints, route.looped)
        })
    }

    pub(crate) fn wave_scheduler(&self, seed: u64) -> WaveScheduler {
        let waves = &self.waves;
        let schedule = WaveSchedule::new(
            waves.total,
            waves.base_count,
            waves.count_growth,
            Duration::from_millis(waves.spawn_interval_ms),
            Duration::from_millis(waves.gap_ms),
        )
        .with_unit(waves.unit_kind.clone(), waves.owner)
        .with_seed(seed);

        let lanes = waves
            .lanes
            .iter()
            .map(|lane| {
                let spawn = Lane::new(Vec3::from_array(lane.spawn));
                match &lane.route {
                    Some(route) => spawn.with_route(route.clone()),
                    None => spawn,
                }
            })
            .collect();
        WaveScheduler::new(schedule, lanes)
    }
}
