//! PivotLab CLI: levels, signals, training and strategy bundle commands.
//!
//! Commands:
//! - `levels`: support/resistance levels for a bar file
//! - `signals`: rule and strategy signal events with forward evaluation
//! - `train`: fit a strategy's trainable models and store the bundle
//! - `strategy list|show|remove`: manage stored bundles

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

use pivotlab_core::signals::{ClassifierConfig, ClassifierModel, DivergenceModel, TrainOutcome};
use pivotlab_core::strategy::Strategy;
use pivotlab_runner::{
    analyze, load_csv, synthetic_bars, train_strategy, AnalysisConfig, AnalysisReport, LoadedBars,
    StrategyStore,
};

#[derive(Parser)]
#[command(
    name = "pivotlab",
    about = "PivotLab CLI: support/resistance levels and signal analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// CSV file with timestamp,open,high,low,close,volume columns.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Generate a deterministic random walk for this label instead of reading a file.
    #[arg(long)]
    synthetic: Option<String>,

    /// Number of synthetic bars.
    #[arg(long, default_value_t = 500)]
    bars: usize,

    /// First synthetic date (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    start: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print support/resistance levels.
    Levels {
        #[command(flatten)]
        data: DataArgs,

        /// Analysis config (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Extract signal events and score them.
    Signals {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Stored strategy whose models also generate events.
        #[arg(long)]
        strategy: Option<String>,

        /// Strategy bundle directory.
        #[arg(long, default_value = "strategies")]
        strategies_dir: PathBuf,

        /// Write the full report as JSON here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Train a stored strategy's models and save the result.
    Train {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        strategy: String,

        #[arg(long, default_value = "strategies")]
        strategies_dir: PathBuf,

        /// Create a starter bundle if none exists under that name.
        #[arg(long, default_value_t = false)]
        create: bool,
    },
    /// Strategy bundle management.
    Strategy {
        #[command(subcommand)]
        action: StrategyAction,
    },
}

#[derive(Subcommand)]
enum StrategyAction {
    /// List stored bundles.
    List {
        #[arg(long, default_value = "strategies")]
        strategies_dir: PathBuf,
    },
    /// Print a bundle as JSON.
    Show {
        name: String,

        #[arg(long, default_value = "strategies")]
        strategies_dir: PathBuf,
    },
    /// Delete a bundle.
    Remove {
        name: String,

        #[arg(long, default_value = "strategies")]
        strategies_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Levels { data, config } => run_levels(&data, config),
        Commands::Signals {
            data,
            config,
            strategy,
            strategies_dir,
            output,
        } => run_signals(&data, config, strategy, strategies_dir, output),
        Commands::Train {
            data,
            strategy,
            strategies_dir,
            create,
        } => run_train(&data, &strategy, strategies_dir, create),
        Commands::Strategy { action } => match action {
            StrategyAction::List { strategies_dir } => run_strategy_list(strategies_dir),
            StrategyAction::Show {
                name,
                strategies_dir,
            } => run_strategy_show(&name, strategies_dir),
            StrategyAction::Remove {
                name,
                strategies_dir,
            } => run_strategy_remove(&name, strategies_dir),
        },
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_data(args: &DataArgs) -> Result<LoadedBars> {
    match (&args.csv, &args.synthetic) {
        (Some(path), _) => {
            load_csv(path).with_context(|| format!("failed to load bars from {}", path.display()))
        }
        (None, Some(label)) => {
            let start = NaiveDate::parse_from_str(&args.start, "%Y-%m-%d")
                .with_context(|| format!("invalid --start date '{}'", args.start))?;
            synthetic_bars(label, start, args.bars)
                .with_context(|| format!("failed to generate synthetic bars for '{label}'"))
        }
        (None, None) => bail!("one of --csv or --synthetic is required"),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run_levels(data: &DataArgs, config: Option<PathBuf>) -> Result<()> {
    let loaded = load_data(data)?;
    let config = load_config(config)?;
    let levels = config.levels.analyze(&loaded.bars);

    println!(
        "{} levels from {} bars ({})",
        levels.len(),
        loaded.bars.len(),
        config.levels.method.name()
    );
    println!("{:>10}  {:>10}  {:>10}  {:>8}  {:>4}", "price", "min", "max", "strength", "hits");
    for level in &levels {
        println!(
            "{:>10.2}  {:>10.2}  {:>10.2}  {:>8.2}  {:>4}",
            level.price, level.min_price, level.max_price, level.strength, level.hit_count
        );
    }
    Ok(())
}

fn run_signals(
    data: &DataArgs,
    config: Option<PathBuf>,
    strategy_name: Option<String>,
    strategies_dir: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let loaded = load_data(data)?;
    let config = load_config(config)?;

    let strategy = match &strategy_name {
        Some(name) => {
            let store = StrategyStore::new(&strategies_dir)?;
            match store.load(name)? {
                Some(strategy) => Some(strategy),
                None => bail!("no strategy named '{name}' in {}", strategies_dir.display()),
            }
        }
        None => None,
    };

    let analysis = analyze(&loaded.bars, &config, strategy.as_ref());
    let report = AnalysisReport::new(&loaded, &config, strategy_name.as_deref(), analysis);
    tracing::debug!(report_id = %report.report_id, "report built");
    print!("{}", report.summary());

    if let Some(path) = output {
        report.write_json(&path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

/// Divergence on RSI plus a classifier over RSI, the two default moving
/// averages and the close.
fn starter_strategy(name: &str) -> Strategy {
    let mut strategy = Strategy::new(name);
    for feature in ["rsi_14", "sma_20", "sma_50"] {
        strategy
            .feature_config
            .insert(feature.to_string(), BTreeMap::new());
    }
    strategy.add_model(DivergenceModel::new("rsi_divergence"));
    strategy.add_model(ClassifierModel::new(ClassifierConfig::new(
        "forest",
        vec![
            "rsi_14".into(),
            "sma_20".into(),
            "sma_50".into(),
            "close".into(),
        ],
    )));
    strategy
}

fn run_train(data: &DataArgs, name: &str, strategies_dir: PathBuf, create: bool) -> Result<()> {
    let store = StrategyStore::new(&strategies_dir)?;
    let mut strategy = match store.load(name)? {
        Some(strategy) => strategy,
        None if create => starter_strategy(name),
        None => bail!(
            "no strategy named '{name}' in {} (pass --create for a starter bundle)",
            strategies_dir.display()
        ),
    };

    let loaded = load_data(data)?;
    let outcomes = train_strategy(&mut strategy, &loaded.bars);
    if outcomes.is_empty() {
        println!("Strategy '{name}' has no trainable models");
    }
    for (model, outcome) in &outcomes {
        match outcome {
            TrainOutcome::Trained { samples, features } => {
                println!("{model}: trained on {samples} samples x {features} features")
            }
            TrainOutcome::InsufficientData { samples } => {
                println!("{model}: not trained ({samples} samples)")
            }
        }
    }

    let path = store.save(&strategy)?;
    println!("Strategy saved to: {}", path.display());
    Ok(())
}

fn run_strategy_list(strategies_dir: PathBuf) -> Result<()> {
    let store = StrategyStore::new(&strategies_dir)?;
    let names = store.list_available()?;
    if names.is_empty() {
        println!("No strategies in {}", strategies_dir.display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn run_strategy_show(name: &str, strategies_dir: PathBuf) -> Result<()> {
    let store = StrategyStore::new(&strategies_dir)?;
    let Some(strategy) = store.load(name)? else {
        bail!("no strategy named '{name}' in {}", strategies_dir.display());
    };
    let value = strategy.to_value()?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn run_strategy_remove(name: &str, strategies_dir: PathBuf) -> Result<()> {
    let store = StrategyStore::new(&strategies_dir)?;
    if store.remove(name)? {
        println!("Removed strategy '{name}'");
    } else {
        println!("No strategy named '{name}'");
    }
    Ok(())
}
