use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use pairs_trading_core::events::signal_events;
use pairs_trading_core::hedge_ratio::estimate_hedge_ratio;
use pairs_trading_core::signals::{generate_position_series, PositionSeries};
use pairs_trading_core::spread::{compute_spread_and_zscore, SpreadSeries};
use pairs_trading_core::StrategyParams;

use super::{require_prices, PriceArgs, StrategyArgs};

/// Arguments for the per-date signal listing
#[derive(Args)]
pub struct SignalsArgs {
    #[command(flatten)]
    pub prices: PriceArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Use this hedge ratio instead of fitting one
    #[arg(long, allow_hyphen_values = true)]
    pub beta: Option<Decimal>,
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let prices = require_prices(&args.prices)?;
    let params = args.strategy.resolve(StrategyParams::default())?;
    params.validate()?;
    prices.validate()?;

    let beta = match args.beta {
        Some(beta) => beta,
        None => estimate_hedge_ratio(&prices)?,
    };
    let spread = compute_spread_and_zscore(&prices, beta, params.lookback)?;
    let positions = generate_position_series(&spread, &params.thresholds()?);
    let events = signal_events(&positions);

    Ok(json!({
        "result": {
            "beta": beta,
            "lookback": params.lookback,
            "entry_z": params.entry_z,
            "exit_z": params.exit_z,
            "series": rows(&spread, &positions),
            "events": events,
        },
        "methodology": "Rolling z-score of the log spread with hysteresis entry/exit bands",
        "warnings": [],
    }))
}

fn rows(spread: &SpreadSeries, positions: &PositionSeries) -> Vec<Value> {
    spread
        .points
        .iter()
        .zip(positions.points.iter())
        .map(|(s, p)| {
            json!({
                "date": s.date,
                "spread": s.spread,
                "rolling_mean": s.rolling_mean,
                "rolling_std": s.rolling_std,
                "zscore": s.zscore,
                "position": p.position.as_i8(),
            })
        })
        .collect()
}
