//! Threshold signal generator with hysteresis.
//!
//! A Moore machine over three states. From `Flat` a position opens when the
//! z-score breaches `±entry`; an open position closes only once `|z|` falls
//! below `exit`. The band between the two thresholds holds the current state,
//! so the same z-score can map to different positions depending on the path.
//! A position never reverses in a single step: it must pass through `Flat`.
//!
//! Missing z-scores (warm-up, flat window) force `Flat` and reset the state.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PairsTradingError;
use crate::spread::SpreadSeries;
use crate::PairsResult;

/// Signed notional position in the spread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadPosition {
    #[default]
    Flat,
    /// Long asset1, short beta units of asset2 (+1)
    LongSpread,
    /// Short asset1, long beta units of asset2 (-1)
    ShortSpread,
}

impl SpreadPosition {
    /// Integer code: -1, 0 or +1.
    pub fn as_i8(self) -> i8 {
        match self {
            SpreadPosition::Flat => 0,
            SpreadPosition::LongSpread => 1,
            SpreadPosition::ShortSpread => -1,
        }
    }

    pub fn as_decimal(self) -> Decimal {
        Decimal::from(self.as_i8())
    }

    pub fn from_i8(code: i8) -> PairsResult<Self> {
        match code {
            0 => Ok(SpreadPosition::Flat),
            1 => Ok(SpreadPosition::LongSpread),
            -1 => Ok(SpreadPosition::ShortSpread),
            other => Err(PairsTradingError::data(
                "position",
                format!("position code must be -1, 0 or 1, got {}", other),
            )),
        }
    }

    pub fn is_open(self) -> bool {
        self != SpreadPosition::Flat
    }

    /// Apply one step of the transition rule.
    ///
    /// Uses only the current z-score and the state carried from the previous
    /// step.
    pub fn transition(self, zscore: Option<Decimal>, thresholds: &SignalThresholds) -> Self {
        let Some(z) = zscore else {
            return SpreadPosition::Flat;
        };
        match self {
            SpreadPosition::Flat => {
                if z > thresholds.entry {
                    SpreadPosition::ShortSpread
                } else if z < -thresholds.entry {
                    SpreadPosition::LongSpread
                } else {
                    SpreadPosition::Flat
                }
            }
            open => {
                if z.abs() < thresholds.exit {
                    SpreadPosition::Flat
                } else {
                    open
                }
            }
        }
    }
}

impl From<SpreadPosition> for i8 {
    fn from(position: SpreadPosition) -> i8 {
        position.as_i8()
    }
}

/// Validated entry/exit pair: `entry > 0` and `0 <= exit < entry`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalThresholds {
    entry: Decimal,
    exit: Decimal,
}

impl SignalThresholds {
    pub fn new(entry: Decimal, exit: Decimal) -> PairsResult<Self> {
        if entry <= Decimal::ZERO {
            return Err(PairsTradingError::config(
                "entry_z",
                format!("entry threshold must be positive, got {}", entry),
            ));
        }
        if exit < Decimal::ZERO {
            return Err(PairsTradingError::config(
                "exit_z",
                format!("exit threshold must be non-negative, got {}", exit),
            ));
        }
        if exit >= entry {
            return Err(PairsTradingError::config(
                "exit_z",
                format!(
                    "exit threshold ({}) must be below entry threshold ({})",
                    exit, entry
                ),
            ));
        }
        Ok(Self { entry, exit })
    }

    pub fn entry(&self) -> Decimal {
        self.entry
    }

    pub fn exit(&self) -> Decimal {
        self.exit
    }
}

/// Run the state machine over a whole z-score sequence, starting `Flat`.
///
/// Output has one position per input z-score.
pub fn generate_signals(
    zscores: &[Option<Decimal>],
    thresholds: &SignalThresholds,
) -> Vec<SpreadPosition> {
    zscores
        .iter()
        .scan(SpreadPosition::Flat, |state, z| {
            *state = state.transition(*z, thresholds);
            Some(*state)
        })
        .collect()
}

/// Incremental form of [`generate_signals`] for callers that receive one
/// z-score at a time. Carries only the current state.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    thresholds: SignalThresholds,
    state: SpreadPosition,
}

impl SignalGenerator {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self {
            thresholds,
            state: SpreadPosition::Flat,
        }
    }

    pub fn step(&mut self, zscore: Option<Decimal>) -> SpreadPosition {
        self.state = self.state.transition(zscore, &self.thresholds);
        self.state
    }

    pub fn state(&self) -> SpreadPosition {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SpreadPosition::Flat;
    }
}

/// One dated position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPoint {
    pub date: NaiveDate,
    pub position: SpreadPosition,
}

/// Positions aligned 1:1 with a [`SpreadSeries`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSeries {
    pub points: Vec<PositionPoint>,
}

impl PositionSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn positions(&self) -> Vec<SpreadPosition> {
        self.points.iter().map(|p| p.position).collect()
    }
}

/// Generate dated positions from a spread series.
pub fn generate_position_series(
    spread: &SpreadSeries,
    thresholds: &SignalThresholds,
) -> PositionSeries {
    let positions = generate_signals(&spread.zscores(), thresholds);
    let points: Vec<PositionPoint> = spread
        .points
        .iter()
        .zip(positions)
        .map(|(s, position)| PositionPoint {
            date: s.date,
            position,
        })
        .collect();
    debug!(
        periods = points.len(),
        open = points.iter().filter(|p| p.position.is_open()).count(),
        "generated positions"
    );
    PositionSeries { points }
}
