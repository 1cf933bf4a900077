//! Entry/exit markers and round-trip trades derived from a position series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::BacktestResult;
use crate::error::PairsTradingError;
use crate::signals::{PositionSeries, SpreadPosition};
use crate::PairsResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalEventKind {
    LongEntry,
    ShortEntry,
    Exit,
}

/// A position change at a given period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub kind: SignalEventKind,
}

/// One entry and its matching exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub direction: SpreadPosition,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    /// Period the position returned to flat, or the last period if still open
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub holding_periods: usize,
    /// Compounded strategy return from entry close to exit close
    pub trade_return: Decimal,
    /// True when the series ended with this position still open
    pub open: bool,
}

/// Mark every entry and exit. The period before the first observation is
/// treated as flat; a direct reversal yields an exit and an entry on the same
/// date.
pub fn signal_events(positions: &PositionSeries) -> Vec<SignalEvent> {
    let mut events = Vec::new();
    let mut previous = SpreadPosition::Flat;
    for (index, point) in positions.points.iter().enumerate() {
        let current = point.position;
        if current != previous {
            if previous.is_open() {
                events.push(SignalEvent {
                    index,
                    date: point.date,
                    kind: SignalEventKind::Exit,
                });
            }
            let entry = match current {
                SpreadPosition::LongSpread => Some(SignalEventKind::LongEntry),
                SpreadPosition::ShortSpread => Some(SignalEventKind::ShortEntry),
                SpreadPosition::Flat => None,
            };
            if let Some(kind) = entry {
                events.push(SignalEvent {
                    index,
                    date: point.date,
                    kind,
                });
            }
        }
        previous = current;
    }
    events
}

/// Pair entries with exits and attach the return earned over each holding
/// window, read off the backtest equity curve.
pub fn round_trips(
    positions: &PositionSeries,
    backtest: &BacktestResult,
) -> PairsResult<Vec<RoundTrip>> {
    let n = positions.len();
    if backtest.equity_curve.len() != n {
        return Err(PairsTradingError::data(
            "equity_curve",
            format!(
                "{} equity points for {} positions; series must be aligned",
                backtest.equity_curve.len(),
                n
            ),
        ));
    }

    let mut trips = Vec::new();
    // (direction, entry index)
    let mut current: Option<(SpreadPosition, usize)> = None;
    for (index, point) in positions.points.iter().enumerate() {
        if let Some((direction, entry)) = current {
            if point.position != direction {
                trips.push(build_trip(positions, backtest, direction, entry, index, false)?);
                current = None;
            }
        }
        if current.is_none() && point.position.is_open() {
            current = Some((point.position, index));
        }
    }
    if let Some((direction, entry)) = current {
        if n > 0 {
            trips.push(build_trip(positions, backtest, direction, entry, n - 1, true)?);
        }
    }
    Ok(trips)
}

fn build_trip(
    positions: &PositionSeries,
    backtest: &BacktestResult,
    direction: SpreadPosition,
    entry_index: usize,
    exit_index: usize,
    open: bool,
) -> PairsResult<RoundTrip> {
    let entry_equity = backtest.equity_curve[entry_index];
    let exit_equity = backtest.equity_curve[exit_index];
    let trade_return = if entry_equity.is_zero() {
        Decimal::ZERO
    } else {
        exit_equity
            .checked_div(entry_equity)
            .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
            .ok_or_else(|| PairsTradingError::overflow("round-trip return"))?
    };
    Ok(RoundTrip {
        direction,
        entry_index,
        entry_date: positions.points[entry_index].date,
        exit_index,
        exit_date: positions.points[exit_index].date,
        holding_periods: exit_index - entry_index,
        trade_return,
        open,
    })
}

/// Fraction of closed round trips with a positive return. Zero when none
/// have closed.
pub fn win_rate(trips: &[RoundTrip]) -> Decimal {
    let closed: Vec<&RoundTrip> = trips.iter().filter(|t| !t.open).collect();
    if closed.is_empty() {
        return Decimal::ZERO;
    }
    let wins = closed
        .iter()
        .filter(|t| t.trade_return > Decimal::ZERO)
        .count();
    Decimal::from(wins as i64) / Decimal::from(closed.len() as i64)
}
