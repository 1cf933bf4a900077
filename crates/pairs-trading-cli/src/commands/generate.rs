use chrono::NaiveDate;
use clap::Args;
use std::io::{self, Write};
use tracing::info;

use pairs_trading_core::synthetic::{generate_cointegrated_pair, SyntheticPairInput};
use pairs_trading_core::PriceSeries;

/// Arguments for synthetic pair generation
#[derive(Args)]
pub struct GenerateArgs {
    /// Number of daily observations
    #[arg(long, default_value = "500")]
    pub periods: usize,

    /// RNG seed; the same seed always produces the same prices
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// True hedge ratio of the generated pair
    #[arg(long, allow_hyphen_values = true)]
    pub beta: Option<f64>,

    /// AR(1) coefficient of the log spread
    #[arg(long, allow_hyphen_values = true)]
    pub spread_phi: Option<f64>,

    /// Column header for the first asset
    #[arg(long, default_value = "asset1")]
    pub asset1: String,

    /// Column header for the second asset
    #[arg(long, default_value = "asset2")]
    pub asset2: String,
}

/// Writes CSV straight to stdout; the output formatters do not apply.
pub fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = SyntheticPairInput::default();
    let synthetic = SyntheticPairInput {
        periods: args.periods,
        seed: args.seed,
        start_date: args.start_date.unwrap_or(defaults.start_date),
        beta: args.beta.unwrap_or(defaults.beta),
        spread_phi: args.spread_phi.unwrap_or(defaults.spread_phi),
        ..defaults
    };
    let series = generate_cointegrated_pair(&synthetic)?;
    info!(periods = series.len(), seed = args.seed, "generated synthetic pair");

    let stdout = io::stdout();
    write_csv(stdout.lock(), &series, &args.asset1, &args.asset2)
}

fn write_csv<W: Write>(
    writer: W,
    series: &PriceSeries,
    asset1: &str,
    asset2: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Date", asset1, asset2])?;
    for p in &series.points {
        wtr.write_record([p.date.to_string(), p.asset1.to_string(), p.asset2.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
