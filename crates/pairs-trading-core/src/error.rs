use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairsTradingError {
    #[error("Invalid data: {field}: {reason}")]
    InvalidData { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Singular regression in {context}")]
    SingularRegression { context: String },

    /// A result left the range of a 96-bit decimal.
    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Invalid config: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification of a [`PairsTradingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or insufficient input series.
    Data,
    /// Invalid parameter combination.
    Config,
    Serialization,
}

impl PairsTradingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PairsTradingError::InvalidData { .. }
            | PairsTradingError::InsufficientData(_)
            | PairsTradingError::SingularRegression { .. }
            | PairsTradingError::ArithmeticOverflow { .. } => ErrorCategory::Data,
            PairsTradingError::InvalidConfig { .. } => ErrorCategory::Config,
            PairsTradingError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        PairsTradingError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        PairsTradingError::ArithmeticOverflow {
            context: context.into(),
        }
    }

    pub(crate) fn data(field: &str, reason: impl Into<String>) -> Self {
        PairsTradingError::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PairsTradingError {
    fn from(e: serde_json::Error) -> Self {
        PairsTradingError::SerializationError(e.to_string())
    }
}
