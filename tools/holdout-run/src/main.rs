//! holdout-run: headless simulation driver.
//!
//! Usage:
//!   holdout-run --seed 7 --seconds 120
//!   holdout-run --config arena.json --endless --seconds 600
//!
//! The player auto-fires at the nearest enemy. A JSON summary of the run is
//! printed to stdout; logs go to stderr (filter with RUST_LOG).

use std::path::PathBuf;
use std::process;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use holdout_core::commands::PlayerCommand;
use holdout_core::constants::{DEFAULT_PLAYER_PROJECTILE, DT, TICK_RATE};
use holdout_sim::engine::RunStats;
use holdout_sim::{SimConfig, Simulation};

/// Seconds between auto-fire shots.
const FIRE_INTERVAL_SECS: f32 = 0.25;
/// Auto-fire only at enemies within this distance.
const FIRE_RANGE: f32 = 600.0;

#[derive(Debug)]
struct Options {
    seed: Option<u64>,
    seconds: f32,
    width: Option<u32>,
    height: Option<u32>,
    endless: bool,
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct Summary {
    seed: u64,
    generation_attempts: u32,
    reachable_ratio: f32,
    ticks: u64,
    seconds: f64,
    waves_reached: u32,
    waves_finished: bool,
    kills: u32,
    enemies_alive: usize,
    player_alive: bool,
    player_health: f32,
    stats: RunStats,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "help" || a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let options = match parse_options(&args) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("Error: {msg}");
            print_usage();
            process::exit(1);
        }
    };

    let config = match load_config(&options) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(1);
        }
    };

    let summary = run(config, options.seconds);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to encode summary: {e}");
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "holdout-run: headless HOLDOUT simulation driver\n\
         \n\
         Options:\n\
         \n\
           --seed <N>        Simulation and level seed (default: config or 42)\n\
           --seconds <S>     Simulated seconds to run (default: 60)\n\
           --width <N>       Grid width in tiles\n\
           --height <N>      Grid height in tiles\n\
           --endless         Repeat the last wave forever\n\
           --config <path>   JSON config file (missing fields use defaults)\n\
         \n\
         Examples:\n\
         \n\
           holdout-run --seed 7 --seconds 120\n\
           RUST_LOG=debug holdout-run --config arena.json --endless\n"
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid value for {flag}: {raw}")),
        None if args.iter().any(|a| a == flag) => Err(format!("{flag} needs a value")),
        None => Ok(None),
    }
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let seconds = parse_flag::<f32>(args, "--seconds")?.unwrap_or(60.0);
    if seconds.is_nan() || seconds <= 0.0 {
        return Err("--seconds must be positive".to_string());
    }
    Ok(Options {
        seed: parse_flag(args, "--seed")?,
        seconds,
        width: parse_flag(args, "--width")?,
        height: parse_flag(args, "--height")?,
        endless: args.iter().any(|a| a == "--endless"),
        config: flag_value(args, "--config").map(PathBuf::from),
    })
}

fn load_config(options: &Options) -> Result<SimConfig, String> {
    let mut config = match &options.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            SimConfig::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
        config.generation.seed = seed;
    }
    if let Some(width) = options.width {
        config.grid_width = width;
    }
    if let Some(height) = options.height {
        config.grid_height = height;
    }
    config.endless |= options.endless;
    if config.grid_width < 3 || config.grid_height < 3 {
        return Err("grid must be at least 3x3 tiles".to_string());
    }
    Ok(config)
}

fn run(config: SimConfig, seconds: f32) -> Summary {
    let seed = config.seed;
    let mut sim = Simulation::new(config);
    let generation = sim.generation().clone();
    info!(
        seed,
        attempts = generation.attempts,
        reachable = generation.reachable_ratio,
        "level ready"
    );

    let ticks = (seconds * TICK_RATE as f32).ceil() as u64;
    let fire_every = ((FIRE_INTERVAL_SECS / DT).round() as u64).max(1);
    let mut last_wave = 0;

    for tick in 0..ticks {
        if tick % fire_every == 0 {
            if let Some(command) = aim_command(&sim) {
                sim.queue_command(command);
            }
        }
        let snap = sim.tick();

        if snap.wave.wave_number != last_wave {
            last_wave = snap.wave.wave_number;
            info!(wave = last_wave, kills = snap.kill_count, "wave reached");
        }
        if snap.player.is_none() {
            info!(tick, "player died");
            break;
        }
    }

    let player_health = sim
        .player()
        .and_then(|id| {
            sim.store()
                .component::<holdout_core::components::Health>(id)
                .map(|h| h.current)
        })
        .unwrap_or(0.0);

    Summary {
        seed,
        generation_attempts: generation.attempts,
        reachable_ratio: generation.reachable_ratio,
        ticks: sim.time().tick,
        seconds: sim.time().elapsed_secs,
        waves_reached: sim.waves().wave_number(),
        waves_finished: sim.waves().is_finished(),
        kills: sim.kill_count(),
        enemies_alive: sim.store().enemy_count(),
        player_alive: sim.player().is_some(),
        player_health,
        stats: sim.stats(),
    }
}

/// Fire toward the nearest enemy in range, if any.
fn aim_command(sim: &Simulation) -> Option<PlayerCommand> {
    let player = sim.player()?;
    let from = sim.store().position(player)?;
    let (_, target) = sim.store().nearest_enemy(from, FIRE_RANGE, |_| false)?;
    let dir = (target - from).try_normalize()?;
    Some(PlayerCommand::Fire {
        x: dir.x,
        y: dir.y,
        projectile: Some(DEFAULT_PLAYER_PROJECTILE.to_string()),
    })
}
