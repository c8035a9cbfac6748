//! # Depths Runner
//!
//! Headless auto-play runner: builds a session from flags and an optional
//! JSON config, lets the agents play until the run ends or the step budget
//! runs out, and prints a summary.

use clap::Parser;
use depths::{DepthsResult, GameCompletionState, GameState, SessionConfig};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for the Depths runner.
#[derive(Parser, Debug)]
#[command(name = "depths")]
#[command(about = "Headless auto-play runner for the Depths simulation core")]
#[command(version)]
struct Args {
    /// Random seed for the session
    #[arg(short, long)]
    seed: Option<u64>,

    /// Level width in tiles
    #[arg(long)]
    width: Option<i32>,

    /// Level height in tiles
    #[arg(long)]
    height: Option<i32>,

    /// Deepest level index before victory
    #[arg(long)]
    max_depth: Option<u32>,

    /// Auto-play steps before giving up
    #[arg(long, default_value_t = 20_000)]
    max_steps: u64,

    /// Session config as JSON; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> DepthsResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Depths v{}", depths::VERSION);

    let config = build_config(&args)?;
    info!(
        "Session seed {} on a {}x{} grid, {} levels deep",
        config.seed, config.width, config.height, config.max_depth
    );

    let game = run_autoplay(config, args.max_steps)?;

    if args.json {
        println!("{}", game.snapshot_json()?);
    } else {
        print_summary(&game);
    }
    Ok(())
}

/// Merges the optional config file with command line overrides.
fn build_config(args: &Args) -> DepthsResult<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::new(rand::random()),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }

    config.validate()?;
    Ok(config)
}

fn run_autoplay(config: SessionConfig, max_steps: u64) -> DepthsResult<GameState> {
    let tick = Duration::from_millis(config.tick_interval_ms);
    let mut game = GameState::new(config)?;
    game.toggle_autoplay();

    while game.autoplay_steps() < max_steps {
        if game.autoplay_step()?.is_none() {
            break;
        }
        if !tick.is_zero() {
            std::thread::sleep(tick);
        }
    }

    if !game.is_game_over() {
        warn!("Step budget of {} exhausted", max_steps);
    }
    Ok(game)
}

fn print_summary(game: &GameState) {
    let outcome = match game.completion_state {
        GameCompletionState::Victory => "escaped the depths",
        GameCompletionState::PlayerDied => "died",
        GameCompletionState::Playing => "still exploring",
    };
    let stats = &game.statistics;

    println!("{} {} after {} steps.", game.player.name, outcome, game.autoplay_steps());
    println!(
        "  depth {} / {}, character level {}",
        game.level_index, game.config.max_depth, game.player.level
    );
    println!(
        "  enemies defeated: {} ({} bosses)",
        stats.enemies_defeated, stats.bosses_defeated
    );
    println!(
        "  items collected: {}, gold collected: {}",
        stats.items_collected, stats.gold_collected
    );
    println!(
        "  damage dealt: {}, damage taken: {}",
        stats.damage_dealt, stats.damage_taken
    );
    let skip = game.message_count().saturating_sub(5);
    for message in game.messages().skip(skip) {
        println!("  > {}", message);
    }
}

/// Initializes logging based on the specified level.
fn initialize_logging(log_level: &str) -> DepthsResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::Level;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_target(false)
            .init();
    }

    Ok(())
}
