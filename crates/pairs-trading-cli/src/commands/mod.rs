pub mod backtest;
pub mod generate;
pub mod hedge_ratio;
pub mod signals;

use clap::Args;
use rust_decimal::Decimal;

use pairs_trading_core::{PriceSeries, StrategyParams};

use crate::input;
use crate::input::prices::PriceColumns;

/// Where to read the two price series from.
#[derive(Args, Debug, Clone)]
pub struct PriceArgs {
    /// Path to a CSV file with a date column and one column per asset
    #[arg(long)]
    pub file: Option<String>,

    /// Column holding the first asset's prices (dependent leg)
    #[arg(long)]
    pub asset1: Option<String>,

    /// Column holding the second asset's prices (hedge leg)
    #[arg(long)]
    pub asset2: Option<String>,

    /// Name of the date column
    #[arg(long, default_value = "Date")]
    pub date_col: String,
}

impl PriceArgs {
    /// Asset labels, defaulting to the generic leg names.
    pub fn names(&self) -> (String, String) {
        (
            self.asset1.clone().unwrap_or_else(|| "asset1".to_string()),
            self.asset2.clone().unwrap_or_else(|| "asset2".to_string()),
        )
    }

    /// Load the CSV named by `--file`, or None when no file was given.
    pub fn load(&self) -> Result<Option<PriceSeries>, Box<dyn std::error::Error>> {
        let Some(path) = self.file.as_deref() else {
            return Ok(None);
        };
        let (Some(asset1), Some(asset2)) = (self.asset1.as_deref(), self.asset2.as_deref())
        else {
            return Err("--asset1 and --asset2 are required with --file".into());
        };
        let columns = PriceColumns {
            date: &self.date_col,
            asset1,
            asset2,
        };
        Ok(Some(input::prices::read_price_csv(path, &columns)?))
    }
}

/// Strategy parameters from a config file, overridden by individual flags.
#[derive(Args, Debug, Clone, Default)]
pub struct StrategyArgs {
    /// YAML or JSON strategy config file
    #[arg(long)]
    pub config: Option<String>,

    /// Rolling window for the spread mean and standard deviation
    #[arg(long)]
    pub lookback: Option<usize>,

    /// |z| above which a position is opened
    #[arg(long)]
    pub entry_z: Option<Decimal>,

    /// |z| below which an open position is closed
    #[arg(long)]
    pub exit_z: Option<Decimal>,

    /// Notional per leg
    #[arg(long)]
    pub max_leverage: Option<Decimal>,

    /// Annual risk-free rate for the excess-return ratio
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,
}

impl StrategyArgs {
    /// Start from `base` (or the config file, when given) and apply flags.
    pub fn resolve(
        &self,
        base: StrategyParams,
    ) -> Result<StrategyParams, Box<dyn std::error::Error>> {
        let mut params = match self.config.as_deref() {
            Some(path) => input::file::read_config(path)?,
            None => base,
        };
        if let Some(v) = self.lookback {
            params.lookback = v;
        }
        if let Some(v) = self.entry_z {
            params.entry_z = v;
        }
        if let Some(v) = self.exit_z {
            params.exit_z = v;
        }
        if let Some(v) = self.max_leverage {
            params.max_leverage = v;
        }
        if let Some(v) = self.risk_free_rate {
            params.risk_free_rate = v;
        }
        Ok(params)
    }
}

/// Prices from `--file`, or an error naming both accepted sources.
pub fn require_prices(args: &PriceArgs) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    args.load()?
        .ok_or_else(|| "--file <prices.csv> with --asset1 and --asset2 is required".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flags_override_base() {
        let args = StrategyArgs {
            lookback: Some(20),
            exit_z: Some(dec!(0.1)),
            ..StrategyArgs::default()
        };
        let params = args.resolve(StrategyParams::default()).unwrap();
        assert_eq!(params.lookback, 20);
        assert_eq!(params.exit_z, dec!(0.1));
        assert_eq!(params.entry_z, dec!(2.0));
    }

    #[test]
    fn test_no_flags_keeps_base() {
        let base = StrategyParams {
            lookback: 15,
            ..StrategyParams::default()
        };
        let params = StrategyArgs::default().resolve(base.clone()).unwrap();
        assert_eq!(params, base);
    }

    #[test]
    fn test_file_requires_both_columns() {
        let args = PriceArgs {
            file: Some("prices.csv".into()),
            asset1: Some("XOM".into()),
            asset2: None,
            date_col: "Date".into(),
        };
        assert!(args.load().is_err());
    }

    #[test]
    fn test_no_file_is_none() {
        let args = PriceArgs {
            file: None,
            asset1: None,
            asset2: None,
            date_col: "Date".into(),
        };
        assert!(args.load().unwrap().is_none());
        assert_eq!(args.names(), ("asset1".to_string(), "asset2".to_string()));
    }
}
