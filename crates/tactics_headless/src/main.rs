//! Headless tile-tactics runner.
//!
//! Runs scenarios without graphics for CI and quick terminal review.
//!
//! # Usage
//!
//! ```bash
//! # Run the bundled heist and print a JSON summary
//! cargo run -p tactics_headless -- run
//!
//! # Run a scenario file, drawing the map every 100 ticks
//! cargo run -p tactics_headless -- run --scenario my_level.ron --ticks 1000 --frames 100
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --runs 5
//!
//! # Show what unit #12 sees after 60 ticks
//! cargo run -p tactics_headless -- render --ticks 60 --vision 12
//!
//! # Plan a path and draw it
//! cargo run -p tactics_headless -- path --from 1,1 --to 12,7
//! ```
//!
//! Output (stdout): JSON summaries, maps, exported levels
//! Logs (stderr): Debug information

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_core::grid::GridPos;
use tactics_core::pathfinding::{CostGrid, PathFinder};
use tactics_core::tilemap::ObjectId;
use tactics_headless::{
    render_world, verify_determinism, AsciiConfig, HeadlessRunner, Overlay, Scenario,
    ScenarioError,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tile-tactics runner for CI and terminal review")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print a JSON summary
    Run {
        /// Scenario file to load (defaults to the bundled heist)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Ticks to run (defaults to the scenario's own)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Draw the map to stderr every N ticks (0 = never)
        #[arg(long, default_value = "0")]
        frames: u64,

        /// Write the summary to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Scenario file to load (defaults to the bundled heist)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of verification runs
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Ticks per run (defaults to the scenario's own)
        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Draw the map after some ticks
    Render {
        /// Scenario file to load (defaults to the bundled heist)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Ticks to run before drawing
        #[arg(short, long, default_value = "0")]
        ticks: u64,

        /// Mark the cells this unit id can see
        #[arg(long)]
        vision: Option<u32>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Plan a path on the scenario's map and draw it
    Path {
        /// Scenario file to load (defaults to the bundled heist)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Start cell as `x,y`
        #[arg(long, value_parser = parse_cell)]
        from: GridPos,

        /// Goal cell as `x,y`
        #[arg(long, value_parser = parse_cell)]
        to: GridPos,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Export the expanded level as RON
    Export {
        /// Scenario file to load (defaults to the bundled heist)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_cell(s: &str) -> Result<GridPos, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok(GridPos::new(x, y))
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for output)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            frames,
            output,
        } => cmd_run(scenario, ticks, frames, output),
        Commands::Verify {
            scenario,
            runs,
            ticks,
        } => cmd_verify(scenario, runs, ticks),
        Commands::Render {
            scenario,
            ticks,
            vision,
            no_color,
        } => cmd_render(scenario, ticks, vision, no_color),
        Commands::Path {
            scenario,
            from,
            to,
            no_color,
        } => cmd_path(scenario, from, to, no_color),
        Commands::Export { scenario, output } => cmd_export(scenario, output),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

/// Run a scenario and print its summary
fn cmd_run(
    scenario: Option<PathBuf>,
    ticks: Option<u64>,
    frames: u64,
    output: Option<PathBuf>,
) -> Result<(), ScenarioError> {
    let scenario = Scenario::load_or_default(scenario.as_deref())?;
    let ticks = ticks.unwrap_or(scenario.ticks);
    tracing::info!(scenario = %scenario.name, ticks, "Starting run");

    let mut runner = HeadlessRunner::new(&scenario)?;
    let config = AsciiConfig::default();
    for tick in 1..=ticks {
        runner.step();
        if frames > 0 && tick % frames == 0 {
            eprint!("{}", render_world(runner.world(), &config, None));
        }
    }

    let summary = runner.summary();
    let json = summary
        .to_json()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            tracing::info!(path = %path.display(), "Summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Verify determinism by running the same scenario multiple times
fn cmd_verify(
    scenario: Option<PathBuf>,
    runs: u32,
    ticks: Option<u64>,
) -> Result<(), ScenarioError> {
    let scenario = Scenario::load_or_default(scenario.as_deref())?;
    let ticks = ticks.unwrap_or(scenario.ticks);
    tracing::info!(
        "Verifying determinism: {} for {} ticks ({} runs)",
        scenario.name,
        ticks,
        runs
    );

    let report = verify_determinism(&scenario, runs, ticks)?;
    if report.passed() {
        eprintln!("PASS: All {runs} runs produced identical results");
        eprintln!("  Final hash: {}", report.hashes.first().map_or("-", String::as_str));
        Ok(())
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        eprintln!("  Hashes: {:?}", report.hashes);
        eprintln!("  Snapshot resume matched: {}", report.snapshot_matches);
        std::process::exit(1);
    }
}

/// Draw the map after some ticks
fn cmd_render(
    scenario: Option<PathBuf>,
    ticks: u64,
    vision: Option<u32>,
    no_color: bool,
) -> Result<(), ScenarioError> {
    let scenario = Scenario::load_or_default(scenario.as_deref())?;
    let mut runner = HeadlessRunner::new(&scenario)?;
    runner.run(ticks);

    let overlay = match vision {
        Some(id) => match runner.world().unit(ObjectId(id)) {
            Some(unit) => Some(Overlay::new(unit.vision().visible_tiles().iter().copied(), ':')),
            None => {
                tracing::warn!(unit = id, "No such unit, drawing without vision");
                None
            }
        },
        None => None,
    };

    let config = AsciiConfig {
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    print!("{}", render_world(runner.world(), &config, overlay.as_ref()));
    Ok(())
}

/// Plan a path on the scenario's map and draw it
fn cmd_path(
    scenario: Option<PathBuf>,
    from: GridPos,
    to: GridPos,
    no_color: bool,
) -> Result<(), ScenarioError> {
    let scenario = Scenario::load_or_default(scenario.as_deref())?;
    let world = scenario.build_world()?;
    let grid = CostGrid::from_tilemap(world.tilemap());
    let mut finder = PathFinder::new(scenario.config.diagonal_rule);

    let path = finder.find_path(&grid, from, to)?.to_vec();
    eprintln!(
        "Path {from} -> {to}: {} steps, {} nodes expanded",
        path.len(),
        finder.nodes_expanded()
    );

    let config = AsciiConfig {
        show_header: false,
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    let overlay = Overlay::new(path, '*');
    print!("{}", render_world(&world, &config, Some(&overlay)));
    Ok(())
}

/// Export the expanded level as RON
fn cmd_export(scenario: Option<PathBuf>, output: Option<PathBuf>) -> Result<(), ScenarioError> {
    let scenario = Scenario::load_or_default(scenario.as_deref())?;
    let ron = scenario.level()?.to_ron_string()?;
    match output {
        Some(path) => {
            std::fs::write(&path, ron)?;
            tracing::info!(path = %path.display(), "Level exported");
        }
        None => println!("{ron}"),
    }
    Ok(())
}
