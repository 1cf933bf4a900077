use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PairsTradingError;
use crate::PairsResult;

/// Asset prices. Wraps Decimal to prevent accidental f64 usage.
pub type Price = Decimal;

/// Rates and returns expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Trading days per year used for annualisation.
pub const TRADING_DAYS_PER_YEAR: Decimal = Decimal::from_parts(252, 0, 0, false, 0);

/// One aligned observation of both legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub asset1: Price,
    pub asset2: Price,
}

/// Time-ordered, gap-free price history for the two legs of a pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Check the input contract: non-empty, strictly increasing dates,
    /// strictly positive prices on both legs.
    pub fn validate(&self) -> PairsResult<()> {
        if self.points.is_empty() {
            return Err(PairsTradingError::InsufficientData(
                "price series is empty".into(),
            ));
        }
        for (i, point) in self.points.iter().enumerate() {
            if point.asset1 <= Decimal::ZERO {
                return Err(PairsTradingError::data(
                    "asset1",
                    format!(
                        "price at index {} ({}) must be positive, got {}",
                        i, point.date, point.asset1
                    ),
                ));
            }
            if point.asset2 <= Decimal::ZERO {
                return Err(PairsTradingError::data(
                    "asset2",
                    format!(
                        "price at index {} ({}) must be positive, got {}",
                        i, point.date, point.asset2
                    ),
                ));
            }
        }
        if let Some(w) = self.points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(PairsTradingError::data(
                "date",
                format!(
                    "dates must be strictly increasing: {} follows {}",
                    w[1].date, w[0].date
                ),
            ));
        }
        Ok(())
    }
}

/// Strategy configuration shared by the transformer, the signal generator
/// and the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Rolling window for the z-score (at least 2)
    pub lookback: usize,
    /// Z-score magnitude that opens a position
    pub entry_z: Decimal,
    /// Z-score magnitude below which an open position is closed
    pub exit_z: Decimal,
    /// Notional per leg
    pub max_leverage: Decimal,
    /// Annual risk-free rate used for the excess-return ratio
    pub risk_free_rate: Rate,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            lookback: 60,
            entry_z: dec!(2.0),
            exit_z: dec!(0.5),
            max_leverage: dec!(1.0),
            risk_free_rate: Decimal::ZERO,
        }
    }
}

impl StrategyParams {
    /// Validate every field before any computation starts.
    pub fn validate(&self) -> PairsResult<()> {
        if self.lookback < 2 {
            return Err(PairsTradingError::config(
                "lookback",
                format!("must be at least 2, got {}", self.lookback),
            ));
        }
        crate::signals::SignalThresholds::new(self.entry_z, self.exit_z)?;
        self.backtest_params().validate()
    }

    pub fn thresholds(&self) -> PairsResult<crate::signals::SignalThresholds> {
        crate::signals::SignalThresholds::new(self.entry_z, self.exit_z)
    }

    pub fn backtest_params(&self) -> crate::backtest::BacktestParams {
        crate::backtest::BacktestParams {
            max_leverage: self.max_leverage,
            risk_free_rate: self.risk_free_rate,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
