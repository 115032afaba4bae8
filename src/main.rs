use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowrank::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "flowrank")]
#[command(about = "Cross-sectional momentum signals for currency and equity-index strategies", long_about = None)]
struct Cli {
    //verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run every strategy in a strategy file
    Run {
        //path to long csv prices (timestamp,symbol,close)
        #[arg(long)]
        prices: PathBuf,

        //path to json strategy file
        #[arg(long)]
        config: PathBuf,

        //directory for per-strategy signal, weight, position and return csv files
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    //write the preset strategy file
    InitConfig {
        //output path for the json strategy file
        #[arg(long, default_value = "strategies.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")?;

    match cli.command {
        Commands::Run {
            prices,
            config,
            output_dir,
        } => run(&prices, &config, output_dir.as_deref()),
        Commands::InitConfig { output } => init_config(&output),
    }
}

fn run(prices_path: &Path, config_path: &Path, output_dir: Option<&Path>) -> Result<()> {
    let prices = load_prices_csv(prices_path)
        .with_context(|| format!("Failed to load prices from {:?}", prices_path))?;
    if prices.is_empty() {
        anyhow::bail!("No prices found in {:?}", prices_path);
    }

    let file = StrategyFile::from_json_file(config_path)
        .with_context(|| format!("Failed to load strategies from {:?}", config_path))?;
    let strategies = file.resolved_strategies();

    info!(
        "Running {} strategies over {} rows and {} instruments",
        strategies.len(),
        prices.len(),
        prices.width()
    );

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    }

    let mut failures = 0;
    for (config, outcome) in strategies.iter().zip(run_many(&prices, &strategies)) {
        match outcome {
            Ok(run) => {
                log_leaderboard(&prices, config)?;
                run.summary.log_summary(&run.code);
                if let Some(dir) = output_dir {
                    save_run(&run, dir)?;
                }
            }
            Err(e) => {
                error!("{}: {}", config.code, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} strategies failed", failures, strategies.len());
    }

    Ok(())
}

//latest index returns by country, worst first
fn log_leaderboard(prices: &PriceTable, config: &StrategyConfig) -> Result<()> {
    let indices = prices.select(config.universe.index_ids());
    if indices.width() == 0 {
        return Ok(());
    }

    let returns = compute_return(config.alpha_days, config.alpha_delay_days, &indices)?;
    for (country, ret) in config.universe.latest_ranking(&returns) {
        debug!("{}: {} index {:+.2}%", config.code, country, ret * 100.0);
    }
    Ok(())
}

fn save_run(run: &StrategyRun, dir: &Path) -> Result<()> {
    let tables = [
        ("signals", &run.signals),
        ("weights", &run.weights),
        ("positions", &run.positions),
        ("returns", &run.returns),
    ];

    for (name, table) in tables {
        let path = dir.join(format!("{}_{}.csv", run.code, name));
        write_table_csv(table, &path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("{} {} saved to {:?}", run.code, name, path);
    }

    Ok(())
}

fn init_config(output: &Path) -> Result<()> {
    StrategyFile::default()
        .to_json_file(output)
        .with_context(|| format!("Failed to write strategy file {:?}", output))?;
    println!("Preset strategies saved to {:?}", output);
    Ok(())
}
