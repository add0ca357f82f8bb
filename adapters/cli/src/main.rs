#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless skirmish against the tactical
//! core and prints a reproducible summary of the match.

mod recorder;
mod summary;

use std::path::PathBuf;

use anyhow::{ensure, Context as _, Result};
use arena_tactics_commander::{Commander, Config};
use arena_tactics_core::Allegiance;
use arena_tactics_world::{query, scenario};
use clap::Parser;
use log::{debug, info, LevelFilter};

use crate::{recorder::RecordingArena, summary::MatchSummary};

/// Runs a seeded skirmish with the tactical core in charge of one side.
#[derive(Debug, Parser)]
#[command(name = "arena-tactics", version, about)]
struct Args {
    /// Number of ticks to play.
    #[arg(long, default_value_t = 300)]
    ticks: u64,
    /// Seed of the generated skirmish.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    /// Summary line of an earlier run this one must reproduce.
    #[arg(long)]
    expect: Option<String>,
}

/// Entry point for the arena tactics command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };
    let summary = play(args.seed, args.ticks, config);

    println!("ticks played:   {}", summary.ticks);
    println!("squads formed:  {}", summary.squads_formed);
    println!("units alive:    {} mine, {} enemy", summary.mine, summary.enemies);
    println!("fingerprint:    {}", summary.fingerprint);
    println!("summary:        {}", summary.encode()?);

    if let Some(expected) = &args.expect {
        let expected = MatchSummary::decode(expected).context("invalid --expect summary")?;
        ensure!(
            expected == summary,
            "match diverged from the expected summary (expected fingerprint {}, got {})",
            expected.fingerprint,
            summary.fingerprint
        );
        info!("match reproduced the expected summary");
    }
    Ok(())
}

fn play(seed: u64, ticks: u64, config: Config) -> MatchSummary {
    let (world, layout) = scenario::skirmish(seed);
    info!(
        "skirmish {seed}: home at ({}, {}), enemy at ({}, {})",
        layout.home.column(),
        layout.home.row(),
        layout.enemy.column(),
        layout.enemy.row()
    );
    let mut arena = RecordingArena::new(world);
    let mut commander = Commander::new(config);

    let mut played = 0;
    while played < ticks {
        let view = arena.world().view();
        if view.enemy_base().is_none() {
            info!("tick {}: enemy base destroyed", view.tick());
            break;
        }
        let report = commander.tick(&view, &mut arena);
        if let Some(name) = report.formed {
            info!("tick {}: squad {name} deployed", report.tick);
        }
        debug!(
            "tick {}: {} units acted, {} stale entries pruned",
            report.tick, report.units_acted, report.pruned
        );
        arena.end_tick();
        played += 1;
    }
    info!(
        "{} commands accepted, {} rejected",
        arena.accepted(),
        arena.rejected()
    );

    let world = arena.world();
    MatchSummary {
        seed,
        ticks: played,
        squads_formed: commander.deployment().squads_formed(),
        mine: query::unit_count(world, Allegiance::Mine),
        enemies: query::unit_count(world, Allegiance::Enemy),
        fingerprint: arena.fingerprint(),
    }
}
