#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Rooftop Runner session.

use std::{cell::RefCell, collections::BTreeMap, fs, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use rooftop_runner_core::{Event, SessionState};
use rooftop_runner_simulation::{GameConfig, Simulation};
use rooftop_runner_world::query;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "rooftop-runner", about = "Run a headless Rooftop Runner session")]
struct Args {
    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the procedural spawner.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3_600)]
    ticks: u32,

    /// Simulated time per tick, in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Ticks between automatic jump requests; zero never jumps.
    #[arg(long, default_value_t = 45)]
    jump_interval: u32,
}

/// Entry point for the Rooftop Runner command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.spawning.seed = seed;
    }

    let mut simulation = Simulation::new(config).context("invalid game configuration")?;
    println!("{}", query::welcome_banner(simulation.world()));

    let tallies = Rc::new(RefCell::new(BTreeMap::<&'static str, u32>::new()));
    let sink = Rc::clone(&tallies);
    let _subscription = simulation.subscribe(move |event| {
        *sink.borrow_mut().entry(event_name(event)).or_default() += 1;
    });

    simulation.start();
    let dt = Duration::from_millis(args.tick_ms);
    for step in 0..args.ticks {
        if args.jump_interval > 0 && step % args.jump_interval == 0 {
            simulation.request_jump();
        }
        simulation.tick(dt);
        if query::state(simulation.world()) == SessionState::Over {
            tracing::info!(step, "run ended before the tick budget");
            break;
        }
    }

    println!("events:");
    for (name, count) in tallies.borrow().iter() {
        println!("  {name:<18} {count}");
    }

    let session = query::session(simulation.world());
    println!(
        "state={:?} speed={:.2} score={} elapsed={:.2}s",
        session.state,
        session.speed,
        session.score,
        session.elapsed.as_secs_f32()
    );
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    GameConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load configuration at {}", path.display()))
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Started => "started",
        Event::Paused => "paused",
        Event::Resumed => "resumed",
        Event::GameOver => "game-over",
        Event::SessionReset => "session-reset",
        Event::TimeAdvanced { .. } => "time-advanced",
        Event::TimeChanged { .. } => "time-changed",
        Event::SpeedChanged { .. } => "speed-changed",
        Event::ScoreChanged { .. } => "score-changed",
        Event::EntitySpawned { .. } => "entity-spawned",
        Event::EntityReleased { .. } => "entity-released",
        Event::EffectActivated { .. } => "effect-activated",
        Event::EffectDeactivated { .. } => "effect-deactivated",
        Event::PlayerJumped { .. } => "player-jumped",
        Event::PlayerLanded => "player-landed",
        Event::PlayerDied => "player-died",
        Event::CoinCollected { .. } => "coin-collected",
        Event::PowerUpCollected { .. } => "power-up-collected",
        Event::ObstacleAbsorbed { .. } => "obstacle-absorbed",
    }
}
