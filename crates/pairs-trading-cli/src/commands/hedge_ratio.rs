use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use pairs_trading_core::hedge_ratio::fit_log_regression;

use super::{require_prices, PriceArgs};

/// Arguments for hedge-ratio estimation
#[derive(Args)]
pub struct HedgeRatioArgs {
    #[command(flatten)]
    pub prices: PriceArgs,
}

pub fn run_hedge_ratio(args: HedgeRatioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let prices = require_prices(&args.prices)?;
    let fit = fit_log_regression(&prices)?;
    let (asset1, asset2) = args.prices.names();

    let mut warnings = Vec::new();
    if fit.beta < Decimal::ZERO {
        warnings.push(format!(
            "Negative hedge ratio ({}): the legs move in opposite directions",
            fit.beta
        ));
    }

    Ok(json!({
        "result": {
            "beta": fit.beta,
            "alpha": fit.alpha,
            "r_squared": fit.r_squared,
            "observations": fit.observations,
            "asset1": asset1,
            "asset2": asset2,
        },
        "methodology": "OLS of ln(asset1) on ln(asset2) with intercept; beta is the hedge ratio",
        "warnings": warnings,
    }))
}
