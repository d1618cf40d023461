use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use floodadapt::{results::write_run_outputs, scenario::ScenarioLoader, web};

#[derive(Debug, Parser)]
#[command(author, version, about = "Household flood adaptation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/game_table.yaml")]
    scenario: PathBuf,

    /// Override round count (uses scenario default when omitted)
    #[arg(long)]
    rounds: Option<u32>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in rounds (0 disables)
    #[arg(long)]
    snapshot_interval: Option<u32>,

    /// Directory for snapshots
    #[arg(long, default_value = "snapshots")]
    snapshot_dir: PathBuf,

    /// Directory for the history CSV and run manifest
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Log filter, e.g. `debug` or `floodadapt=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Serve a live feed of the run; results are still written when it finishes
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| scenario.logging.level.clone());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let rounds = scenario.rounds(cli.rounds);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_rounds);

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        return runtime.block_on(web::run(web::WebServerConfig {
            scenario,
            rounds,
            snapshot_interval,
            snapshot_dir: cli.snapshot_dir,
            results_dir: cli.results_dir,
            host: cli.host,
            port: cli.port,
        }));
    }

    let mut world = scenario.build_world()?;
    let mut settings = scenario.engine_settings(&cli.snapshot_dir);
    settings.snapshot_interval_rounds = snapshot_interval;
    let mut engine = scenario.build_engine(&world, settings);
    engine.run(&mut world, rounds)?;

    let out_dir = write_run_outputs(&cli.results_dir, &scenario, &world, rounds)?;

    info!(
        "scenario '{}' completed after {} rounds: total wealth {:.0}, mean satisfaction {:.2}, results in {}",
        scenario.name,
        rounds,
        world.total_wealth(),
        world.mean_satisfaction(),
        out_dir.display()
    );
    Ok(())
}
