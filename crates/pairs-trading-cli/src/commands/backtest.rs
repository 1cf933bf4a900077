use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use pairs_trading_core::pipeline::{run_pairs_backtest, PairsBacktestInput, PairsBacktestOutput};
use pairs_trading_core::{ComputationOutput, StrategyParams};

use super::{PriceArgs, StrategyArgs};
use crate::input;

/// Arguments for a full strategy backtest
#[derive(Args)]
pub struct BacktestArgs {
    /// Path to a JSON file holding a complete backtest input (prices and params)
    #[arg(long, conflicts_with = "file")]
    pub input: Option<String>,

    #[command(flatten)]
    pub prices: PriceArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Include the per-date spread, z-score, position and equity series
    #[arg(long)]
    pub series: bool,
}

pub fn run_backtest(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut backtest_input = load_input(&args)?;
    backtest_input.params = args.strategy.resolve(backtest_input.params)?;
    info!(
        asset1 = %backtest_input.asset1_name,
        asset2 = %backtest_input.asset2_name,
        periods = backtest_input.prices.len(),
        "running backtest"
    );

    let output = run_pairs_backtest(&backtest_input)?;
    Ok(render(&backtest_input, &output, args.series))
}

fn load_input(args: &BacktestArgs) -> Result<PairsBacktestInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let Some(prices) = args.prices.load()? {
        let (asset1_name, asset2_name) = args.prices.names();
        return Ok(PairsBacktestInput {
            asset1_name,
            asset2_name,
            prices,
            params: StrategyParams::default(),
        });
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(data);
    }
    Err("--file <prices.csv>, --input <file.json> or stdin required for backtest".into())
}

/// Summary envelope; the full series only when asked for.
fn render(
    input: &PairsBacktestInput,
    output: &ComputationOutput<PairsBacktestOutput>,
    include_series: bool,
) -> Value {
    let r = &output.result;
    let bt = &r.backtest;
    let final_equity = bt.equity_curve.last().copied().unwrap_or_default();

    let mut result = json!({
        "asset1": r.asset1_name,
        "asset2": r.asset2_name,
        "hedge_ratio": r.hedge_ratio.beta,
        "intercept": r.hedge_ratio.alpha,
        "r_squared": r.hedge_ratio.r_squared,
        "observations": r.hedge_ratio.observations,
        "sharpe_ratio": bt.sharpe_ratio,
        "cumulative_return": bt.cumulative_return,
        "final_equity": final_equity,
        "max_drawdown": bt.max_drawdown,
        "trades": bt.trades,
        "round_trips": r.round_trips.len(),
        "win_rate": r.win_rate,
        "exposure": bt.exposure,
        "zscores_defined": r.spread.defined_zscores(),
    });

    if include_series {
        if let Value::Object(ref mut map) = result {
            map.insert("series".into(), Value::Array(series_rows(input, r)));
            map.insert("trades_detail".into(), json!(r.round_trips));
        }
    }

    json!({
        "result": result,
        "methodology": output.methodology,
        "assumptions": output.assumptions,
        "warnings": output.warnings,
        "metadata": output.metadata,
    })
}

fn series_rows(input: &PairsBacktestInput, r: &PairsBacktestOutput) -> Vec<Value> {
    input
        .prices
        .points
        .iter()
        .zip(r.spread.points.iter())
        .zip(r.positions.points.iter())
        .zip(r.backtest.daily_returns.iter().zip(r.backtest.equity_curve.iter()))
        .map(|(((price, spread), position), (daily, equity))| {
            json!({
                "date": price.date,
                "asset1": price.asset1,
                "asset2": price.asset2,
                "spread": spread.spread,
                "zscore": spread.zscore,
                "position": position.position.as_i8(),
                "daily_return": daily,
                "equity": equity,
            })
        })
        .collect()
}
