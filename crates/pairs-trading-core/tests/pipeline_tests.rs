use pairs_trading_core::backtest::{backtest_pairs_strategy, count_trades, BacktestParams};
use pairs_trading_core::hedge_ratio::{estimate_hedge_ratio, fit_log_regression};
use pairs_trading_core::pipeline::{run_pairs_backtest, PairsBacktestInput};
use pairs_trading_core::signals::SpreadPosition::{self, Flat, LongSpread, ShortSpread};
use pairs_trading_core::spread::compute_spread_and_zscore;
use pairs_trading_core::{ErrorCategory, PricePoint, PriceSeries, StrategyParams};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 1).unwrap() + chrono::Days::new(i as u64)
}

fn series(a1: &[Decimal], a2: &[Decimal]) -> PriceSeries {
    PriceSeries::new(
        a1.iter()
            .zip(a2.iter())
            .enumerate()
            .map(|(i, (x, y))| PricePoint {
                date: day(i),
                asset1: *x,
                asset2: *y,
            })
            .collect(),
    )
}

/// asset1 = 1.5 * asset2 with a cyclical deviation that crosses the
/// z-score bands several times.
fn oscillating_pair(n: usize) -> PriceSeries {
    let deviation = [
        dec!(0),
        dec!(0.02),
        dec!(0.04),
        dec!(0.06),
        dec!(0.03),
        dec!(0),
        dec!(-0.02),
        dec!(-0.05),
        dec!(-0.06),
        dec!(-0.03),
    ];
    let mut a2 = dec!(40);
    let mut a1s = Vec::with_capacity(n);
    let mut a2s = Vec::with_capacity(n);
    for i in 0..n {
        a2 += if i % 4 == 0 { dec!(0.3) } else { dec!(-0.05) };
        a1s.push(dec!(1.5) * a2 * (Decimal::ONE + deviation[i % deviation.len()]));
        a2s.push(a2);
    }
    series(&a1s, &a2s)
}

fn default_input(prices: PriceSeries, lookback: usize) -> PairsBacktestInput {
    PairsBacktestInput {
        asset1_name: "XLE".into(),
        asset2_name: "XOP".into(),
        prices,
        params: StrategyParams {
            lookback,
            entry_z: dec!(1.0),
            exit_z: dec!(0.25),
            ..StrategyParams::default()
        },
    }
}

// ===========================================================================
// Hedge ratio
// ===========================================================================

#[test]
fn test_hedge_ratio_exact_power_relationship() {
    // ln(a1) = ln(3) + 0.5 * ln(a2)  =>  beta = 0.5
    let a2: Vec<Decimal> = [dec!(4), dec!(9), dec!(16), dec!(25), dec!(36)].to_vec();
    let a1: Vec<Decimal> = [dec!(6), dec!(9), dec!(12), dec!(15), dec!(18)].to_vec();
    let fit = fit_log_regression(&series(&a1, &a2)).unwrap();
    assert!((fit.beta - dec!(0.5)).abs() < dec!(0.000001), "beta = {}", fit.beta);
    assert!((fit.r_squared - Decimal::ONE).abs() < dec!(0.000001));
    assert_eq!(fit.observations, 5);
}

#[test]
fn test_hedge_ratio_constant_asset2_is_singular() {
    let prices = series(&[dec!(10), dec!(11), dec!(12)], &[dec!(5); 3]);
    assert!(estimate_hedge_ratio(&prices).is_err());
}

#[test]
fn test_hedge_ratio_single_point_insufficient() {
    let err = estimate_hedge_ratio(&series(&[dec!(10)], &[dec!(5)])).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Data);
}

// ===========================================================================
// Causality
// ===========================================================================

#[test]
fn test_future_prices_do_not_change_past_results() {
    let base = oscillating_pair(60);
    let mut altered = base.clone();
    for point in altered.points.iter_mut().skip(45) {
        point.asset1 *= dec!(1.3);
    }
    let beta = dec!(1.0);
    let lookback = 6;

    let spread_a = compute_spread_and_zscore(&base, beta, lookback).unwrap();
    let spread_b = compute_spread_and_zscore(&altered, beta, lookback).unwrap();
    assert_eq!(spread_a.zscores()[..45], spread_b.zscores()[..45]);

    let thresholds = pairs_trading_core::signals::SignalThresholds::new(dec!(1.0), dec!(0.25)).unwrap();
    let pos_a = pairs_trading_core::signals::generate_signals(&spread_a.zscores(), &thresholds);
    let pos_b = pairs_trading_core::signals::generate_signals(&spread_b.zscores(), &thresholds);
    assert_eq!(pos_a[..45], pos_b[..45]);

    let params = BacktestParams::default();
    let bt_a = backtest_pairs_strategy(&base, &pos_a, beta, &params).unwrap();
    let bt_b = backtest_pairs_strategy(&altered, &pos_b, beta, &params).unwrap();
    assert_eq!(bt_a.daily_returns[..45], bt_b.daily_returns[..45]);
    assert_eq!(bt_a.equity_curve[..45], bt_b.equity_curve[..45]);
}

#[test]
fn test_position_at_t_does_not_earn_return_at_t() {
    // a position that only exists on the final day earns nothing
    let prices = series(
        &[dec!(100), dec!(100), dec!(100), dec!(140)],
        &[dec!(50), dec!(50), dec!(50), dec!(50)],
    );
    let positions = [Flat, Flat, Flat, LongSpread];
    let result =
        backtest_pairs_strategy(&prices, &positions, Decimal::ONE, &BacktestParams::default())
            .unwrap();
    assert_eq!(result.cumulative_return, Decimal::ZERO);
    assert_eq!(result.trades, 1);
}

// ===========================================================================
// Simulator properties
// ===========================================================================

#[test]
fn test_trade_count_example() {
    let positions: Vec<SpreadPosition> = [0, 0, 1, 1, -1, -1, 0]
        .iter()
        .map(|v| SpreadPosition::from_i8(*v).unwrap())
        .collect();
    assert_eq!(count_trades(&positions), 3);
}

#[test]
fn test_equity_curve_compounds_daily_returns() {
    let prices = oscillating_pair(30);
    let positions: Vec<SpreadPosition> = (0..30)
        .map(|i| match i % 6 {
            0 | 1 => LongSpread,
            2 | 3 => ShortSpread,
            _ => Flat,
        })
        .collect();
    let result =
        backtest_pairs_strategy(&prices, &positions, dec!(1.5), &BacktestParams::default())
            .unwrap();
    let mut equity = Decimal::ONE;
    for (r, e) in result.daily_returns.iter().zip(result.equity_curve.iter()) {
        equity *= Decimal::ONE + *r;
        assert_eq!(equity, *e);
    }
    assert_eq!(
        result.cumulative_return,
        *result.equity_curve.last().unwrap() - Decimal::ONE
    );
}

#[test]
fn test_zero_variance_returns_give_zero_sharpe() {
    let prices = series(&[dec!(10); 5], &[dec!(20); 5]);
    let result = backtest_pairs_strategy(
        &prices,
        &[LongSpread; 5],
        Decimal::ONE,
        &BacktestParams {
            max_leverage: Decimal::ONE,
            risk_free_rate: dec!(0.03),
        },
    )
    .unwrap();
    assert_eq!(result.sharpe_ratio, Decimal::ZERO);
    assert_eq!(result.cumulative_return, Decimal::ZERO);
}

#[test]
fn test_leverage_doubles_each_daily_return() {
    let prices = oscillating_pair(20);
    let positions: Vec<SpreadPosition> = (0..20)
        .map(|i| if i % 3 == 0 { ShortSpread } else { LongSpread })
        .collect();
    let one = backtest_pairs_strategy(&prices, &positions, dec!(1.5), &BacktestParams::default())
        .unwrap();
    let two = backtest_pairs_strategy(
        &prices,
        &positions,
        dec!(1.5),
        &BacktestParams {
            max_leverage: dec!(2),
            risk_free_rate: Decimal::ZERO,
        },
    )
    .unwrap();
    for (a, b) in one.daily_returns.iter().zip(two.daily_returns.iter()) {
        assert!((*b - dec!(2) * *a).abs() < dec!(0.0000000001));
    }
}

#[test]
fn test_compounding_past_decimal_range_returns_error() {
    // asset1 swings 100 <-> 110 while the position flips every day, so each
    // period compounds the equity by roughly 6x at 50x leverage
    let n = 60;
    let a1: Vec<Decimal> = (0..n)
        .map(|i| if i % 2 == 0 { dec!(100) } else { dec!(110) })
        .collect();
    let prices = series(&a1, &vec![dec!(50); n]);
    let positions: Vec<SpreadPosition> = (0..n)
        .map(|i| if i % 2 == 0 { LongSpread } else { ShortSpread })
        .collect();
    let params = BacktestParams {
        max_leverage: dec!(50),
        risk_free_rate: Decimal::ZERO,
    };
    let err = backtest_pairs_strategy(&prices, &positions, Decimal::ONE, &params).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Data);
    assert!(err.to_string().contains("overflow"), "{}", err);
}

// ===========================================================================
// End-to-end pipeline
// ===========================================================================

#[test]
fn test_pipeline_end_to_end() {
    let out = run_pairs_backtest(&default_input(oscillating_pair(120), 10)).unwrap();
    let r = &out.result;

    assert_eq!(r.asset1_name, "XLE");
    assert!((r.hedge_ratio.beta - Decimal::ONE).abs() < dec!(0.5));
    assert_eq!(r.spread.len(), 120);
    assert!(r.spread.points[..9].iter().all(|p| p.zscore.is_none()));
    assert!(r.backtest.trades > 0);
    assert_eq!(r.backtest.trades, count_trades(&r.positions.positions()));
    assert!(r.backtest.max_drawdown >= Decimal::ZERO);
    assert!(r.backtest.exposure > Decimal::ZERO && r.backtest.exposure <= Decimal::ONE);
    assert!(out.warnings.iter().all(|w| !w.contains("No trades")));
}

#[test]
fn test_pipeline_flat_when_z_never_breaches() {
    let mut input = default_input(oscillating_pair(60), 10);
    input.params.entry_z = dec!(50);
    input.params.exit_z = dec!(1);
    let out = run_pairs_backtest(&input).unwrap();
    assert!(out.result.positions.positions().iter().all(|p| *p == Flat));
    assert_eq!(out.result.backtest.trades, 0);
    assert_eq!(out.result.backtest.cumulative_return, Decimal::ZERO);
    assert!(out.result.round_trips.is_empty());
    assert!(out.warnings.iter().any(|w| w.contains("No trades")));
}

#[test]
fn test_pipeline_extreme_leverage_fails_cleanly() {
    let mut input = default_input(oscillating_pair(120), 10);
    input.params.max_leverage = dec!(100000000000000000000);
    let err = run_pairs_backtest(&input).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Data);
}

#[test]
fn test_pipeline_rejects_unordered_dates() {
    let mut prices = oscillating_pair(30);
    prices.points.swap(3, 4);
    let err = run_pairs_backtest(&default_input(prices, 5)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Data);
}

#[test]
fn test_pipeline_output_serializes() {
    let out = run_pairs_backtest(&default_input(oscillating_pair(40), 5)).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert!(json["result"]["backtest"]["sharpe_ratio"].is_string());
    assert!(json["result"]["hedge_ratio"]["beta"].is_string());
    // undefined z-scores serialize as null
    assert!(json["result"]["spread"]["points"][0]["zscore"].is_null());
    assert_eq!(json["metadata"]["precision"], "rust_decimal_128bit");
}
