#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that runs a Lane Defence session from a TOML scenario.
//!
//! State messages and control results are written to stdout as JSON lines.
//! Logs go to stderr.

mod combat;
mod host;
mod scenario;

use std::{
    io::{self, Write},
    path::PathBuf,
    str::FromStr,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use lane_defence_core::{ControlCommand, GameState, ResultCode, StateMessage};
use lane_defence_system_orchestrator::Orchestrator;
use lane_defence_world::query;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{combat::CombatSimulator, host::SimulatedHost, scenario::Scenario};

/// Command-line arguments accepted by the driver.
#[derive(Debug, Parser)]
#[command(name = "lane-defence", about = "Runs a headless Lane Defence session")]
struct Args {
    /// Scenario file to load instead of the built-in one.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Number of ticks to simulate before stopping.
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Control command to issue before a tick, as `<tick>:<Command>`.
    #[arg(long = "control", value_name = "TICK:COMMAND")]
    controls: Vec<ScheduledControl>,
    /// Seed for the wave scheduler and the combat simulation.
    #[arg(long)]
    seed: Option<u64>,
}

/// A control command issued right before the given tick runs.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ScheduledControl {
    tick: u64,
    name: String,
}

impl FromStr for ScheduledControl {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (tick, name) = value
            .split_once(':')
            .ok_or_else(|| anyhow!("expected <tick>:<Command>, got `{value}`"))?;
        let tick = tick
            .trim()
            .parse()
            .with_context(|| format!("invalid tick in `{value}`"))?;
        Ok(Self {
            tick,
            name: name.trim().to_owned(),
        })
    }
}

/// One line of driver output.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Output<'a> {
    State(StateMessage),
    #[serde(rename_all = "camelCase")]
    ControlResult {
        tick: u64,
        command: &'a str,
        result_code: u8,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        error!(%info, ?backtrace, "panic");
    }));
}

fn write_line(out: &mut impl Write, output: &Output<'_>) -> Result<()> {
    serde_json::to_writer(&mut *out, output).context("failed to encode output")?;
    writeln!(out).context("failed to write output")
}

fn run(args: Args) -> Result<()> {
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };
    let seed = args.seed.unwrap_or(scenario.session.seed);
    let max_ticks = args.max_ticks.unwrap_or(scenario.session.max_ticks);
    let dt = scenario.tick_duration();

    let mut orchestrator = Orchestrator::new(scenario.orchestrator_config());
    for route in scenario.routes() {
        let name = route.name().to_owned();
        orchestrator
            .register_route(route)
            .with_context(|| format!("failed to register route `{name}`"))?;
    }

    let mut scheduler = scenario.wave_scheduler(seed);
    let mut host = SimulatedHost::new(scenario.host.speed);
    let mut combat = CombatSimulator::new(scenario.combat.kill_rate, seed, orchestrator.inbox_handle());

    let mut controls = args.controls;
    if scenario.session.auto_start {
        controls.insert(
            0,
            ScheduledControl {
                tick: 0,
                name: ControlCommand::StartGame.name().to_owned(),
            },
        );
    }
    controls.sort_by_key(|control| control.tick);
    let mut controls = controls.into_iter().peekable();

    info!(
        seed,
        max_ticks,
        tick_ms = dt.as_millis() as u64,
        routes = scenario.routes.len(),
        "{}",
        query::welcome_banner(orchestrator.world())
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ran = 0;
    for tick in 0..max_ticks {
        while let Some(control) = controls.next_if(|control| control.tick <= tick) {
            let code = orchestrator.handle_control_name(&control.name, &mut host);
            if code == ResultCode::Success
                && matches!(control.name.parse::<ControlCommand>(), Ok(ControlCommand::StartGame))
            {
                scheduler.reset();
            }
            write_line(
                &mut out,
                &Output::ControlResult {
                    tick,
                    command: &control.name,
                    result_code: code.code(),
                },
            )?;
        }

        host.step(dt);
        let _ = combat.strike(dt, &orchestrator.tracked_entities());
        let report = orchestrator.tick(dt, &mut host, &mut scheduler);
        for error in &report.errors {
            warn!(tick, %error, "tick completed with an error");
        }
        if let Some(snapshot) = &report.snapshot {
            write_line(&mut out, &Output::State(StateMessage::from(snapshot)))?;
        }
        ran = tick + 1;

        let world = orchestrator.world();
        if query::game_state(world) == GameState::GameOver {
            info!(tick, "player defeated");
            break;
        }
        if query::wave_progress(world).is_level_complete && orchestrator.active_entities() == 0 {
            info!(tick, gold = query::gold(world), "level cleared");
            break;
        }
    }

    let last = orchestrator.snapshot();
    if orchestrator.last_snapshot() != Some(&last) {
        write_line(&mut out, &Output::State(StateMessage::from(&last)))?;
    }
    out.flush().context("failed to flush output")?;

    info!(
        ticks = ran,
        health = last.health,
        gold = last.gold,
        spawned = last.monsters_spawned,
        "session finished"
    );
    orchestrator.teardown(&mut host);
    if host.live_units() > 0 {
        warn!(units = host.live_units(), "units outlived the session");
    }
    Ok(())
}

/// Entry point for the Lane Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    run(Args::parse())
}
