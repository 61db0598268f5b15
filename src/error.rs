use chrono::NaiveDate;
use thiserror::Error;

/// Whole-series failure reported by the batch engine.
///
/// Per-entry conditions (a value before the lookback is filled, RSI
/// saturation) are encoded in the output as `None` or a bounded value and
/// never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The input series holds no bars.
    #[error("insufficient data: price series is empty")]
    InsufficientData,

    /// A configuration value is out of range.
    #[error("invalid config `{param}`: {reason}")]
    InvalidConfig { param: &'static str, reason: String },
}

/// Rejected [`PriceSeries`](crate::PriceSeries) construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("bar {index}: date {current} does not follow {previous}")]
    UnorderedDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("bar {index}: {field} is not a finite number")]
    NonFinite { index: usize, field: &'static str },

    #[error("bar {index}: volume is negative")]
    NegativeVolume { index: usize },
}
