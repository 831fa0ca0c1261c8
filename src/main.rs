use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;

use f1_racing::{
    config::GameConfig,
    game::Game,
    track::{generate_random_track, generator_for, save_track_to_file},
};

/// Simulated ticks per second.
const TICK_RATE: f32 = 60.0;

#[derive(Parser)]
#[command(name = "f1-racing")]
#[command(about = "Headless arcade race: AI drivers lapping a segment-built circuit")]
struct Args {
    /// Game configuration file
    #[arg(short, long, default_value = "game.toml")]
    config: PathBuf,

    /// Track file to race on instead of the configured one
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// Random seed for reproducible races
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulated race duration in seconds
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Race on a random circuit with this many segments
    #[arg(long, value_name = "SEGMENTS")]
    random_track: Option<usize>,

    /// Write the live track to this file after the race
    #[arg(long, value_name = "PATH")]
    save_track: Option<PathBuf>,

    /// Enable verbose logging for detailed simulation progress
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: &Path) -> Result<GameConfig> {
    if path.exists() {
        GameConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    } else {
        warn!("{} not found, using built-in defaults", path.display());
        Ok(GameConfig::default())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting F1 racing core");

    let mut config = load_config(&args.config)?;
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if args.track.is_some() {
        config.track.file = args.track.clone();
    }

    let mut game = match args.random_track {
        Some(segments) => {
            let mut rng = match config.simulation.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let track = generate_random_track("Random Circuit", segments, generator_for(&config.track), &mut rng);
            Game::with_track(config, track)?
        }
        None => Game::new(config)?,
    };

    info!("=== Race Configuration ===");
    info!("Backend: {}", game.backend_name());
    info!("Track: {} ({} segments)", game.track().name(), game.track().segment_count());
    info!("AI cars: {}", game.state().ai_cars.len());
    if let Some(seed) = game.config().simulation.seed {
        info!("Random Seed: {}", seed);
    }

    let dt = 1.0 / TICK_RATE;
    let ticks = (args.seconds.max(0.0) * TICK_RATE).round() as u64;
    let started = Instant::now();

    for tick in 0..ticks {
        game.update(dt)?;

        if args.verbose && tick % TICK_RATE as u64 == 0 {
            let player = &game.state().player;
            log::debug!(
                "t={:.1}s player at ({:.2}, {:.2}) speed {:.2}",
                game.state().time,
                player.x,
                player.z,
                player.speed
            );
        }
    }

    info!(
        "Simulated {:.1}s ({} ticks) in {:.1?}",
        game.state().time,
        game.state().ticks,
        started.elapsed()
    );
    for ai in &game.state().ai_cars {
        info!(
            "AI car {}: {} laps, heading for waypoint {}, position ({:.2}, {:.2})",
            ai.id.0,
            ai.driver.laps,
            ai.driver.current_waypoint,
            ai.car.x,
            ai.car.z
        );
    }

    if let Some(path) = &args.save_track {
        save_track_to_file(game.track(), path)?;
    }

    Ok(())
}
