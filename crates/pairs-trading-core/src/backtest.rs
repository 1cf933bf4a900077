//! Backtest simulator for a spread position series.
//!
//! Each period holds `position` units of asset1 notional against
//! `-beta * position` of asset2. The return earned on day t comes from the
//! position decided at the close of day t-1:
//!
//! `daily_ret_t = position_{t-1} * (r1_t - beta * r2_t) * max_leverage`
//!
//! so a signal computed from day t's close never captures day t's move.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PairsTradingError;
use crate::signals::SpreadPosition;
use crate::stats::{max_drawdown, mean, sample_std};
use crate::types::{PriceSeries, Rate, TRADING_DAYS_PER_YEAR};
use crate::PairsResult;

/// Simulator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    /// Notional per leg, scales every daily return
    pub max_leverage: Decimal,
    /// Annual risk-free rate, de-annualised over 252 trading days
    pub risk_free_rate: Rate,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            max_leverage: Decimal::ONE,
            risk_free_rate: Decimal::ZERO,
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> PairsResult<()> {
        if self.max_leverage < Decimal::ZERO {
            return Err(PairsTradingError::config(
                "max_leverage",
                format!("must be non-negative, got {}", self.max_leverage),
            ));
        }
        if self.risk_free_rate < Decimal::ZERO {
            return Err(PairsTradingError::config(
                "risk_free_rate",
                format!("must be non-negative, got {}", self.risk_free_rate),
            ));
        }
        Ok(())
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Dates aligned with `equity_curve` and `daily_returns`
    pub dates: Vec<NaiveDate>,
    /// Cumulative product of (1 + daily return), implicit start at 1.0
    pub equity_curve: Vec<Decimal>,
    /// Strategy return per period
    pub daily_returns: Vec<Decimal>,
    /// Annualised mean excess return over its standard deviation
    pub sharpe_ratio: Decimal,
    /// Final equity minus one
    pub cumulative_return: Decimal,
    /// Number of periods whose position differs from the previous period
    pub trades: usize,
    /// Largest peak-to-trough decline of the equity curve
    pub max_drawdown: Decimal,
    /// Fraction of periods that carried an open (lagged) position
    pub exposure: Decimal,
}

/// Replay `positions` against the realised returns of both legs.
pub fn backtest_pairs_strategy(
    prices: &PriceSeries,
    positions: &[SpreadPosition],
    beta: Decimal,
    params: &BacktestParams,
) -> PairsResult<BacktestResult> {
    params.validate()?;
    prices.validate()?;
    if positions.len() != prices.len() {
        return Err(PairsTradingError::data(
            "positions",
            format!(
                "{} positions for {} price observations; series must be aligned",
                positions.len(),
                prices.len()
            ),
        ));
    }

    let r1 = simple_returns(prices.points.iter().map(|p| p.asset1))?;
    let r2 = simple_returns(prices.points.iter().map(|p| p.asset2))?;

    let daily_returns: Vec<Decimal> = lagged(positions)
        .zip(r1.iter().zip(r2.iter()))
        .map(|(pos_lag, (a, b))| {
            beta.checked_mul(*b)
                .and_then(|hedge| a.checked_sub(hedge))
                .and_then(|spread_ret| spread_ret.checked_mul(pos_lag.as_decimal()))
                .and_then(|r| r.checked_mul(params.max_leverage))
                .ok_or_else(|| PairsTradingError::overflow("daily strategy return"))
        })
        .collect::<PairsResult<_>>()?;

    let mut equity = Decimal::ONE;
    let mut equity_curve = Vec::with_capacity(daily_returns.len());
    for (t, r) in daily_returns.iter().enumerate() {
        equity = Decimal::ONE
            .checked_add(*r)
            .and_then(|growth| equity.checked_mul(growth))
            .ok_or_else(|| {
                PairsTradingError::overflow(format!(
                    "equity curve at period {} ({}); lower max_leverage",
                    t,
                    prices.points[t].date
                ))
            })?;
        equity_curve.push(equity);
    }

    let sharpe_ratio = sharpe_ratio(&daily_returns, params.risk_free_rate)?;
    let cumulative_return = match equity_curve.last() {
        Some(e) => e
            .checked_sub(Decimal::ONE)
            .ok_or_else(|| PairsTradingError::overflow("cumulative return"))?,
        None => Decimal::ZERO,
    };
    let trades = count_trades(positions);
    let open_periods = lagged(positions).filter(|p| p.is_open()).count();
    let exposure = Decimal::from(open_periods as i64) / Decimal::from(positions.len() as i64);

    debug!(
        periods = positions.len(),
        trades,
        %sharpe_ratio,
        %cumulative_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        dates: prices.dates(),
        max_drawdown: max_drawdown(&equity_curve)?,
        equity_curve,
        daily_returns,
        sharpe_ratio,
        cumulative_return,
        trades,
        exposure,
    })
}

/// `price_t / price_{t-1} - 1`, with the first period defined as zero.
fn simple_returns(prices: impl Iterator<Item = Decimal>) -> PairsResult<Vec<Decimal>> {
    let mut previous: Option<Decimal> = None;
    prices
        .map(|p| -> PairsResult<Decimal> {
            let r = match previous {
                Some(prev) => p
                    .checked_div(prev)
                    .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
                    .ok_or_else(|| PairsTradingError::overflow("simple return"))?,
                None => Decimal::ZERO,
            };
            previous = Some(p);
            Ok(r)
        })
        .collect()
}

/// Positions shifted one period forward, `Flat` at t = 0.
fn lagged(positions: &[SpreadPosition]) -> impl Iterator<Item = SpreadPosition> + '_ {
    std::iter::once(SpreadPosition::Flat).chain(
        positions
            .iter()
            .copied()
            .take(positions.len().saturating_sub(1)),
    )
}

/// Annualised Sharpe-style ratio of excess returns.
///
/// Zero whenever the excess-return standard deviation is not strictly
/// positive, including series shorter than two periods. Returns whose
/// moments leave the decimal range are an `ArithmeticOverflow` error.
pub fn sharpe_ratio(daily_returns: &[Decimal], risk_free_rate: Rate) -> PairsResult<Decimal> {
    let rf_daily = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<Decimal> = daily_returns
        .iter()
        .map(|r| {
            r.checked_sub(rf_daily)
                .ok_or_else(|| PairsTradingError::overflow("excess return"))
        })
        .collect::<PairsResult<_>>()?;
    match sample_std(&excess)? {
        Some(std) if std > Decimal::ZERO => {
            let annualisation = TRADING_DAYS_PER_YEAR.sqrt().unwrap_or(Decimal::ZERO);
            mean(&excess)?
                .checked_div(std)
                .and_then(|ratio| ratio.checked_mul(annualisation))
                .ok_or_else(|| PairsTradingError::overflow("sharpe ratio"))
        }
        _ => Ok(Decimal::ZERO),
    }
}

/// Number of position changes between consecutive periods.
pub fn count_trades(positions: &[SpreadPosition]) -> usize {
    positions.windows(2).filter(|w| w[0] != w[1]).count()
}
