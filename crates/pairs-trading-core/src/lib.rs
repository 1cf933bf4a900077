pub mod backtest;
pub mod error;
pub mod events;
pub mod hedge_ratio;
pub mod pipeline;
pub mod signals;
pub mod spread;
mod stats;
pub mod types;

#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use error::{ErrorCategory, PairsTradingError};
pub use types::*;

/// Standard result type for all pairs-trading operations
pub type PairsResult<T> = Result<T, PairsTradingError>;
