//! Hedge-ratio estimation by ordinary least squares on log prices.
//!
//! Fits `ln(asset1) = alpha + beta * ln(asset2) + e` over the full history
//! and reports beta, the hedge ratio consumed by the spread transformer.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PairsTradingError;
use crate::types::PriceSeries;
use crate::PairsResult;

/// Full result of the log-price regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPriceRegression {
    /// Intercept
    pub alpha: Decimal,
    /// Hedge ratio: slope of ln(asset1) on ln(asset2)
    pub beta: Decimal,
    /// Coefficient of determination
    pub r_squared: Decimal,
    /// Number of observations used in the fit
    pub observations: usize,
}

/// Estimate the hedge ratio (beta) for a pair.
pub fn estimate_hedge_ratio(prices: &PriceSeries) -> PairsResult<Decimal> {
    Ok(fit_log_regression(prices)?.beta)
}

/// OLS with intercept of ln(asset1) on ln(asset2).
pub fn fit_log_regression(prices: &PriceSeries) -> PairsResult<LogPriceRegression> {
    let n = prices.len();
    if n < 2 {
        return Err(PairsTradingError::InsufficientData(format!(
            "At least 2 price observations required for the hedge ratio, got {}",
            n
        )));
    }
    prices.validate()?;

    let (y, x) = log_prices(prices)?;
    let n_dec = Decimal::from(n as i64);
    let mean_x: Decimal = x.iter().sum::<Decimal>() / n_dec;
    let mean_y: Decimal = y.iter().sum::<Decimal>() / n_dec;

    let mut sxx = Decimal::ZERO;
    let mut sxy = Decimal::ZERO;
    let mut syy = Decimal::ZERO;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = *xi - mean_x;
        let dy = *yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx.is_zero() || x.iter().all(|v| *v == x[0]) {
        return Err(PairsTradingError::SingularRegression {
            context: "hedge ratio: ln(asset2) is constant".into(),
        });
    }

    let beta = sxy / sxx;
    let alpha = mean_y - beta * mean_x;
    // syy == 0 means asset1 is constant and the fit is exact (beta = 0)
    let r_squared = if syy.is_zero() {
        Decimal::ONE
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    debug!(%alpha, %beta, %r_squared, observations = n, "fitted log-price regression");

    Ok(LogPriceRegression {
        alpha,
        beta,
        r_squared,
        observations: n,
    })
}

/// Natural logs of both legs. Prices must already be validated positive.
pub(crate) fn log_prices(prices: &PriceSeries) -> PairsResult<(Vec<Decimal>, Vec<Decimal>)> {
    let mut log_a1 = Vec::with_capacity(prices.len());
    let mut log_a2 = Vec::with_capacity(prices.len());
    for (i, p) in prices.points.iter().enumerate() {
        log_a1.push(checked_ln(p.asset1, "asset1", i)?);
        log_a2.push(checked_ln(p.asset2, "asset2", i)?);
    }
    Ok((log_a1, log_a2))
}

fn checked_ln(value: Decimal, field: &str, index: usize) -> PairsResult<Decimal> {
    value.checked_ln().ok_or_else(|| {
        PairsTradingError::data(
            field,
            format!("logarithm undefined for price {} at index {}", value, index),
        )
    })
}
