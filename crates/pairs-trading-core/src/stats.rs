//! Decimal statistics shared by the transformer and the simulator.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::PairsTradingError;
use crate::PairsResult;

fn checked_sum<'a>(
    mut values: impl Iterator<Item = &'a Decimal>,
    context: &str,
) -> PairsResult<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, x| {
        acc.checked_add(*x)
            .ok_or_else(|| PairsTradingError::overflow(context))
    })
}

/// Arithmetic mean. Zero for an empty slice.
pub(crate) fn mean(values: &[Decimal]) -> PairsResult<Decimal> {
    if values.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let sum = checked_sum(values.iter(), "mean")?;
    Ok(sum / Decimal::from(values.len() as i64))
}

/// Sample standard deviation (n-1 denominator). `None` for fewer than two
/// observations.
pub(crate) fn sample_std(values: &[Decimal]) -> PairsResult<Option<Decimal>> {
    let n = values.len();
    if n < 2 {
        return Ok(None);
    }
    // exact zero for a flat window, independent of rounding in the mean
    if values.iter().all(|x| *x == values[0]) {
        return Ok(Some(Decimal::ZERO));
    }
    let m = mean(values)?;
    let squares = values
        .iter()
        .map(|x| {
            x.checked_sub(m)
                .and_then(|d| d.checked_mul(d))
                .ok_or_else(|| PairsTradingError::overflow("standard deviation"))
        })
        .collect::<PairsResult<Vec<Decimal>>>()?;
    let sum_sq = checked_sum(squares.iter(), "standard deviation")?;
    let variance = sum_sq / Decimal::from((n - 1) as i64);
    // sqrt is None only for negative input
    Ok(variance.max(Decimal::ZERO).sqrt())
}

/// Largest peak-to-trough decline of an equity curve, as a positive fraction.
pub(crate) fn max_drawdown(equity: &[Decimal]) -> PairsResult<Decimal> {
    let mut peak = Decimal::ONE;
    let mut max_dd = Decimal::ZERO;
    for value in equity {
        if *value > peak {
            peak = *value;
        }
        // peak >= 1, so only the subtraction can leave the range
        let dd = peak
            .checked_sub(*value)
            .and_then(|d| d.checked_div(peak))
            .ok_or_else(|| PairsTradingError::overflow("max drawdown"))?;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    Ok(max_dd)
}
