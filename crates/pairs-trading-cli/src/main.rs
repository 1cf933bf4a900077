mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::backtest::BacktestArgs;
use commands::generate::GenerateArgs;
use commands::hedge_ratio::HedgeRatioArgs;
use commands::signals::SignalsArgs;

/// Mean-reversion pairs trading backtester
#[derive(Parser)]
#[command(
    name = "pairs",
    version,
    about = "Mean-reversion pairs trading backtester",
    long_about = "Estimate the hedge ratio between two assets, build the rolling z-score \
                  of their log spread, generate hysteresis entry/exit signals and replay \
                  them against historical prices with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log pipeline internals at debug level
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full strategy backtest on a pair
    Backtest(BacktestArgs),
    /// Fit the log-price regression and report the hedge ratio
    HedgeRatio(HedgeRatioArgs),
    /// Print the spread, z-score and position for every date
    Signals(SignalsArgs),
    /// Write a seeded synthetic co-integrated pair as CSV
    Generate(GenerateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins when set.
fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::HedgeRatio(args) => commands::hedge_ratio::run_hedge_ratio(args),
        Commands::Signals(args) => commands::signals::run_signals(args),
        Commands::Generate(args) => match commands::generate::run_generate(args) {
            Ok(()) => return,
            Err(e) => Err(e),
        },
        Commands::Version => {
            println!("pairs {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
