//! Seeded generator for co-integrated price pairs.
//!
//! asset2 follows a geometric random walk. The log spread follows an AR(1)
//! process, the discrete form of Ornstein-Uhlenbeck, and asset1 is
//! `exp(alpha + beta * ln(asset2) + spread)`. Sampling runs in `f64`; prices
//! are converted to `Decimal` and rounded to cents at the end.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::error::PairsTradingError;
use crate::types::{PricePoint, PriceSeries};
use crate::PairsResult;

/// Parameters for a synthetic pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticPairInput {
    /// Number of daily observations (at least 2)
    pub periods: usize,
    /// Date of the first observation; later dates are consecutive days
    pub start_date: NaiveDate,
    /// RNG seed for reproducibility
    pub seed: u64,
    /// Starting price of asset2
    pub initial_price: f64,
    /// Daily log drift of asset2
    pub drift: f64,
    /// Daily log volatility of asset2
    pub volatility: f64,
    /// Intercept of the log relationship
    pub alpha: f64,
    /// True hedge ratio
    pub beta: f64,
    /// AR(1) coefficient of the spread, in (-1, 1) for mean reversion
    pub spread_phi: f64,
    /// Standard deviation of the spread innovations
    pub spread_volatility: f64,
}

impl Default for SyntheticPairInput {
    fn default() -> Self {
        Self {
            periods: 500,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            seed: 42,
            initial_price: 100.0,
            drift: 0.0002,
            volatility: 0.015,
            alpha: 0.1,
            beta: 1.2,
            spread_phi: 0.9,
            spread_volatility: 0.01,
        }
    }
}

fn invalid(field: &str, reason: &str) -> PairsTradingError {
    PairsTradingError::config(field, reason)
}

/// Generate a deterministic co-integrated pair for the given seed.
pub fn generate_cointegrated_pair(input: &SyntheticPairInput) -> PairsResult<PriceSeries> {
    if input.periods < 2 {
        return Err(invalid("periods", "at least 2 periods required"));
    }
    if input.initial_price.is_nan() || input.initial_price <= 0.0 {
        return Err(invalid("initial_price", "must be positive"));
    }
    if input.spread_phi.is_nan() || input.spread_phi.abs() >= 1.0 {
        return Err(invalid("spread_phi", "must lie strictly between -1 and 1"));
    }
    let price_noise = Normal::new(0.0, input.volatility)
        .map_err(|e| invalid("volatility", &format!("invalid Normal parameters: {e}")))?;
    let spread_noise = Normal::new(0.0, input.spread_volatility).map_err(|e| {
        invalid(
            "spread_volatility",
            &format!("invalid Normal parameters: {e}"),
        )
    })?;

    let mut rng = StdRng::seed_from_u64(input.seed);
    let mut log_p2 = input.initial_price.ln();
    let mut spread = 0.0_f64;
    let mut points = Vec::with_capacity(input.periods);

    for i in 0..input.periods {
        if i > 0 {
            log_p2 += input.drift + rng.sample(price_noise);
            spread = input.spread_phi * spread + rng.sample(spread_noise);
        }
        let log_p1 = input.alpha + input.beta * log_p2 + spread;
        let date = input
            .start_date
            .checked_add_days(chrono::Days::new(i as u64))
            .ok_or_else(|| invalid("start_date", "date range overflows the calendar"))?;
        points.push(PricePoint {
            date,
            asset1: to_price(log_p1.exp(), "asset1")?,
            asset2: to_price(log_p2.exp(), "asset2")?,
        });
    }

    Ok(PriceSeries::new(points))
}

fn to_price(value: f64, field: &str) -> PairsResult<Decimal> {
    let price = Decimal::from_f64(value)
        .ok_or_else(|| PairsTradingError::data(field, format!("price {value} is not representable")))?
        .round_dp(2);
    if price <= Decimal::ZERO {
        return Err(PairsTradingError::data(
            field,
            format!("price {value} rounds to zero; lower the volatility or raise the start price"),
        ));
    }
    Ok(price)
}
