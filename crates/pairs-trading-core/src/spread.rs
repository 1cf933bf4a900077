//! Log-price spread and its rolling z-score.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PairsTradingError;
use crate::hedge_ratio::log_prices;
use crate::stats::{mean, sample_std};
use crate::types::PriceSeries;
use crate::PairsResult;

/// One period of the spread series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    pub date: NaiveDate,
    /// ln(asset1) - beta * ln(asset2)
    pub spread: Decimal,
    /// Trailing mean over the lookback window, once the window is full
    pub rolling_mean: Option<Decimal>,
    /// Trailing sample standard deviation over the lookback window
    pub rolling_std: Option<Decimal>,
    /// Undefined until the window is full and whenever the window is flat
    pub zscore: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadSeries {
    pub points: Vec<SpreadPoint>,
}

impl SpreadSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn zscores(&self) -> Vec<Option<Decimal>> {
        self.points.iter().map(|p| p.zscore).collect()
    }

    /// Number of periods with a defined z-score.
    pub fn defined_zscores(&self) -> usize {
        self.points.iter().filter(|p| p.zscore.is_some()).count()
    }
}

/// Compute the spread and its rolling z-score.
///
/// The window for period t covers the `lookback` observations ending at t
/// inclusive, so the first `lookback - 1` periods have no z-score.
pub fn compute_spread_and_zscore(
    prices: &PriceSeries,
    beta: Decimal,
    lookback: usize,
) -> PairsResult<SpreadSeries> {
    if lookback < 2 {
        return Err(PairsTradingError::config(
            "lookback",
            format!("must be at least 2, got {}", lookback),
        ));
    }
    prices.validate()?;

    let (log_a1, log_a2) = log_prices(prices)?;
    let spread: Vec<Decimal> = log_a1
        .iter()
        .zip(log_a2.iter())
        .map(|(a1, a2)| {
            beta.checked_mul(*a2)
                .and_then(|hedge| a1.checked_sub(hedge))
                .ok_or_else(|| PairsTradingError::overflow("spread"))
        })
        .collect::<PairsResult<_>>()?;

    let points: Vec<SpreadPoint> = prices
        .points
        .iter()
        .enumerate()
        .map(|(t, price)| -> PairsResult<SpreadPoint> {
            let (rolling_mean, rolling_std) = if t + 1 >= lookback {
                let window = &spread[t + 1 - lookback..=t];
                (Some(mean(window)?), sample_std(window)?)
            } else {
                (None, None)
            };
            let zscore = match (rolling_mean, rolling_std) {
                (Some(m), Some(s)) if !s.is_zero() => Some(
                    spread[t]
                        .checked_sub(m)
                        .and_then(|d| d.checked_div(s))
                        .ok_or_else(|| PairsTradingError::overflow("z-score"))?,
                ),
                _ => None,
            };
            Ok(SpreadPoint {
                date: price.date,
                spread: spread[t],
                rolling_mean,
                rolling_std,
                zscore,
            })
        })
        .collect::<PairsResult<_>>()?;

    let series = SpreadSeries { points };
    debug!(
        periods = series.len(),
        defined = series.defined_zscores(),
        lookback,
        "computed spread and z-score"
    );
    Ok(series)
}
