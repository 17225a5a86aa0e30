//! Headless basecamp runner.
//!
//! # Usage
//!
//! ```bash
//! # Discovered bases, start inference and next expansion
//! cargo run -p basecamp_headless -- bases scenarios/two_bases.ron
//!
//! # Answer the scenario's placement queries
//! cargo run -p basecamp_headless -- place scenarios/two_bases.ron
//!
//! # Ad hoc query
//! cargo run -p basecamp_headless -- place scenarios/two_bases.ron \
//!     --name barracks --width 3 --height 2 --near-x 20 --near-y 10
//!
//! # ASCII overlay
//! cargo run -p basecamp_headless -- render scenarios/two_bases.ron
//! ```
//!
//! Reports go to stdout, logs to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basecamp_core::config::SpatialConfig;
use basecamp_core::units::StructureClass;
use basecamp_headless::{
    render_ascii, AsciiConfig, BasesReport, PlacementQuery, PlacementReport, Scenario,
    ScenarioError, ScenarioRun, StructureSpec,
};

#[derive(Parser)]
#[command(name = "basecamp_headless")]
#[command(about = "Inspect base discovery and building placement on a scenario")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Spatial config file overriding the scenario's own
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report discovered bases after replaying every frame
    Bases {
        /// Scenario file
        scenario: PathBuf,
    },

    /// Answer placement queries
    Place {
        /// Scenario file
        scenario: PathBuf,

        /// Ad hoc structure name; replaces the scenario's queries
        #[arg(long)]
        name: Option<String>,

        /// Footprint width in tiles
        #[arg(long, default_value = "2")]
        width: i32,

        /// Footprint height in tiles
        #[arg(long, default_value = "2")]
        height: i32,

        /// Treat the structure as a resource depot
        #[arg(long)]
        depot: bool,

        /// Treat the structure as a refinery
        #[arg(long, conflicts_with = "depot")]
        refinery: bool,

        /// Search origin column
        #[arg(long, requires = "near_y")]
        near_x: Option<i32>,

        /// Search origin row
        #[arg(long, requires = "near_x")]
        near_y: Option<i32>,

        /// Clearance around the footprint
        #[arg(long)]
        build_distance: Option<i32>,

        /// Candidate limit, 0 for unlimited
        #[arg(long)]
        search_limit: Option<usize>,
    },

    /// Print an ASCII overlay of the final state
    Render {
        /// Scenario file
        scenario: PathBuf,

        /// Hide base markers
        #[arg(long)]
        no_bases: bool,

        /// Hide reserved tiles
        #[arg(long)]
        no_reserved: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries reports
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
        Commands::Bases { scenario } => cmd_bases(&scenario, cli.config.as_deref()),
        Commands::Place {
            scenario,
            name,
            width,
            height,
            depot,
            refinery,
            near_x,
            near_y,
            build_distance,
            search_limit,
        } => {
            let adhoc = name.map(|name| {
                let class = if depot {
                    StructureClass::ResourceDepot
                } else if refinery {
                    StructureClass::Refinery
                } else {
                    StructureClass::Building
                };
                PlacementQuery {
                    structure: StructureSpec {
                        name,
                        width,
                        height,
                        class,
                    },
                    near: near_x.zip(near_y),
                    build_distance,
                    search_limit,
                }
            });
            cmd_place(&scenario, cli.config.as_deref(), adhoc)
        }
        Commands::Render {
            scenario,
            no_bases,
            no_reserved,
        } => {
            let ascii = AsciiConfig {
                show_bases: !no_bases,
                show_reserved: !no_reserved,
            };
            cmd_render(&scenario, cli.config.as_deref(), ascii)
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}

fn load_run(path: &Path, config: Option<&Path>) -> Result<ScenarioRun, ScenarioError> {
    let scenario = Scenario::load(path)?;
    match config {
        Some(config_path) => {
            let config = SpatialConfig::load(config_path)?;
            tracing::info!(path = %config_path.display(), "Using config override");
            ScenarioRun::run_with_config(config, scenario)
        }
        None => ScenarioRun::run(scenario),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ScenarioError> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{json}");
    Ok(())
}

/// Report bases
fn cmd_bases(path: &Path, config: Option<&Path>) -> Result<(), ScenarioError> {
    let run = load_run(path, config)?;
    let report = BasesReport::new(&run);
    tracing::info!(
        bases = report.bases.len(),
        enemy_start = ?report.enemy_start,
        next_expansion = ?report.next_expansion,
        "Bases discovered"
    );
    print_json(&report)
}

/// Answer placement queries
fn cmd_place(
    path: &Path,
    config: Option<&Path>,
    adhoc: Option<PlacementQuery>,
) -> Result<(), ScenarioError> {
    let run = load_run(path, config)?;
    let outcomes = match adhoc {
        Some(query) => vec![run.place(&query)],
        None => run.place_all(),
    };

    let found = outcomes.iter().filter(|o| o.found.is_some()).count();
    tracing::info!(queries = outcomes.len(), found, "Placement done");

    let reports: Vec<PlacementReport> = outcomes.iter().map(PlacementReport::from).collect();
    print_json(&reports)
}

/// Print the ASCII overlay
fn cmd_render(
    path: &Path,
    config: Option<&Path>,
    ascii: AsciiConfig,
) -> Result<(), ScenarioError> {
    let run = load_run(path, config)?;
    let placements = run.place_all();
    println!("{}", render_ascii(&run, &placements, ascii));
    Ok(())
}
