use pairs_trading_core::signals::{
    generate_position_series, generate_signals, SignalGenerator, SignalThresholds, SpreadPosition,
};
use pairs_trading_core::spread::compute_spread_and_zscore;
use pairs_trading_core::{ErrorCategory, PricePoint, PriceSeries};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn thresholds(entry: Decimal, exit: Decimal) -> SignalThresholds {
    SignalThresholds::new(entry, exit).unwrap()
}

fn codes(positions: &[SpreadPosition]) -> Vec<i8> {
    positions.iter().map(|p| p.as_i8()).collect()
}

// ===========================================================================
// Hysteresis state machine
// ===========================================================================

#[test]
fn test_entry_hold_exit_reentry() {
    // entry at breach, hold inside the dead-band, exit only below the exit
    // threshold, then re-enter on the opposite extreme
    let z: Vec<Option<Decimal>> = [dec!(0), dec!(2.5), dec!(1.0), dec!(0.3), dec!(-2.5), dec!(-0.4)]
        .into_iter()
        .map(Some)
        .collect();
    let positions = generate_signals(&z, &thresholds(dec!(2.0), dec!(0.5)));
    assert_eq!(codes(&positions), vec![0, -1, -1, 0, 1, 0]);
}

#[test]
fn test_same_value_different_paths() {
    // z = 1.0 maps to flat from a flat path and to short from a short path
    let t = thresholds(dec!(2.0), dec!(0.5));
    let from_flat = generate_signals(&[Some(dec!(0)), Some(dec!(1.0))], &t);
    let from_short = generate_signals(&[Some(dec!(2.5)), Some(dec!(1.0))], &t);
    assert_eq!(from_flat[1], SpreadPosition::Flat);
    assert_eq!(from_short[1], SpreadPosition::ShortSpread);
}

#[test]
fn test_boundary_oscillation_does_not_thrash() {
    // z oscillating just around the entry threshold opens once and holds
    let t = thresholds(dec!(2.0), dec!(0.5));
    let z: Vec<Option<Decimal>> = (0..20)
        .map(|i| Some(if i % 2 == 0 { dec!(2.05) } else { dec!(1.95) }))
        .collect();
    let positions = generate_signals(&z, &t);
    assert!(positions.iter().all(|p| *p == SpreadPosition::ShortSpread));
}

#[test]
fn test_missing_values_never_leak_state() {
    let t = thresholds(dec!(1.5), dec!(0.25));
    let z = vec![
        Some(dec!(-1.6)),
        Some(dec!(-1.0)),
        None,
        Some(dec!(-1.0)),
        Some(dec!(-1.6)),
    ];
    let positions = generate_signals(&z, &t);
    assert_eq!(codes(&positions), vec![1, 1, 0, 0, 1]);
}

#[test]
fn test_streaming_generator_matches_batch_over_long_path() {
    let t = thresholds(dec!(1.2), dec!(0.3));
    let z: Vec<Option<Decimal>> = (0..200)
        .map(|i| {
            if i % 37 == 0 {
                None
            } else {
                // deterministic saw-tooth in [-2, 2)
                Some(Decimal::from((i * 7) % 40) / dec!(10) - dec!(2))
            }
        })
        .collect();
    let batch = generate_signals(&z, &t);
    let mut generator = SignalGenerator::new(t);
    let streamed: Vec<SpreadPosition> = z.iter().map(|v| generator.step(*v)).collect();
    assert_eq!(batch, streamed);
}

#[test]
fn test_invalid_thresholds_are_config_errors() {
    for (entry, exit) in [
        (dec!(0), dec!(0)),
        (dec!(-2), dec!(0.5)),
        (dec!(2), dec!(-0.5)),
        (dec!(2), dec!(2)),
        (dec!(1), dec!(1.5)),
    ] {
        let err = SignalThresholds::new(entry, exit).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config, "entry {entry}, exit {exit}");
    }
}

// ===========================================================================
// Dated positions from a spread series
// ===========================================================================

#[test]
fn test_position_series_aligned_with_spread() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let a1 = [
        dec!(100),
        dec!(101),
        dec!(99),
        dec!(104),
        dec!(98),
        dec!(100),
        dec!(107),
        dec!(101),
    ];
    let prices = PriceSeries::new(
        a1.iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                date: start + chrono::Days::new(i as u64),
                asset1: *p,
                asset2: dec!(50),
            })
            .collect(),
    );
    let spread = compute_spread_and_zscore(&prices, Decimal::ONE, 3).unwrap();
    let positions = generate_position_series(&spread, &thresholds(dec!(1.0), dec!(0.2)));
    assert_eq!(positions.len(), prices.len());
    for (p, s) in positions.points.iter().zip(spread.points.iter()) {
        assert_eq!(p.date, s.date);
        if s.zscore.is_none() {
            assert_eq!(p.position, SpreadPosition::Flat);
        }
    }
}
