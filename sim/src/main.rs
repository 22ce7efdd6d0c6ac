//! Headless locomotion run over a static scene.
//!
//! Usage:
//!   cargo run -p sim -- --ticks 1200
//!   cargo run -p sim -- --config walk.toml --speed 0.8

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use locomotion::error::check_timestep;
use log::{error, info};
use sim::{InputScript, SimConfig, Simulation};

#[derive(Parser)]
#[command(about = "Headless procedural quadruped locomotion")]
struct Args {
    /// Simulation file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of fixed ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Override the fixed step (seconds)
    #[arg(long)]
    dt: Option<f32>,

    /// Override the body speed at full input (m/s)
    #[arg(long)]
    speed: Option<f32>,

    /// Frame time fed to the scheduler (seconds); defaults to the fixed step
    #[arg(long)]
    frame: Option<f32>,
}

fn run(args: Args) -> sim::Result<()> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    if let Some(speed) = args.speed {
        config.locomotion.move_speed = speed;
        config.locomotion.validate()?;
    }

    let mut simulation = Simulation::new(&config)?;
    if config.script.is_empty() {
        simulation = simulation.with_script(InputScript::walk_forward(args.ticks as f32 * config.dt));
    }

    let frame = check_timestep(args.frame.unwrap_or(config.dt))?;
    while simulation.stats().ticks < args.ticks {
        simulation.advance(frame)?;
    }

    let stats = simulation.finish();
    info!(
        "ticks: {} | steps: {} started, {} completed | blocked: {} | airborne ticks: {} | moved {:.2} m",
        stats.ticks,
        stats.steps_started,
        stats.steps_completed,
        stats.blocked,
        stats.airborne_ticks,
        stats.displacement()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
