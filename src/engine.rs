//! Batch indicator computation over a whole [`PriceSeries`].
//!
//! Each function drives the matching streaming indicator once across the
//! series and returns a [`DerivedSeries`] aligned 1:1 by date with the
//! input. An empty series is rejected with
//! [`EngineError::InsufficientData`]; a window longer than the series is
//! not an error and yields an output whose entries are all `None`.
//!
//! ```
//! use bist_ta::{Bar, EngineError, PriceSeries, SmaConfig, engine};
//! use chrono::NaiveDate;
//! use std::num::NonZero;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
//! let series = PriceSeries::new(
//!     (1..=5).map(|d| Bar::new(day(d), 10.0, 10.0, 10.0, 10.0, 0.0)).collect(),
//! )
//! .unwrap();
//!
//! let sma = engine::sma(&series, SmaConfig::close(NonZero::new(20).unwrap())).unwrap();
//! assert_eq!(sma.len(), 5);
//! assert_eq!(sma.first_defined(), None);
//!
//! assert_eq!(
//!     engine::sma(&PriceSeries::empty(), SmaConfig::close(NonZero::new(20).unwrap())),
//!     Err(EngineError::InsufficientData),
//! );
//! ```

use crate::{
    Atr, AtrConfig, Bb, BbConfig, BbValue, DerivedSeries, Ema, EmaConfig, EngineError, Indicator,
    Macd, MacdConfig, MacdValue, Price, PriceSeries, Rsi, RsiConfig, Sma, SmaConfig, monthly,
};

/// Feeds every bar of `series` to a fresh indicator built from `config`.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn run<I: Indicator>(
    series: &PriceSeries,
    config: I::Config,
) -> Result<DerivedSeries<I::Output>, EngineError> {
    ensure_not_empty(series)?;

    let mut indicator = I::new(config);
    Ok(series
        .bars()
        .iter()
        .map(|bar| (bar.date, indicator.compute(bar)))
        .collect())
}

/// Simple moving average. Undefined for the first `length − 1` bars.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn sma(series: &PriceSeries, config: SmaConfig) -> Result<DerivedSeries<Price>, EngineError> {
    run::<Sma>(series, config)
}

/// Exponential moving average. Defined from the first bar.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn ema(series: &PriceSeries, config: EmaConfig) -> Result<DerivedSeries<Price>, EngineError> {
    run::<Ema>(series, config)
}

/// Relative strength index. Undefined for the first `length` bars and
/// wherever the window holds neither gains nor losses.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn rsi(series: &PriceSeries, config: RsiConfig) -> Result<DerivedSeries<Price>, EngineError> {
    run::<Rsi>(series, config)
}

/// MACD line, signal line and histogram. Defined from the first bar.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn macd(
    series: &PriceSeries,
    config: MacdConfig,
) -> Result<DerivedSeries<MacdValue>, EngineError> {
    run::<Macd>(series, config)
}

/// Bollinger bands. Undefined for the first `length − 1` bars.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn bollinger(
    series: &PriceSeries,
    config: BbConfig,
) -> Result<DerivedSeries<BbValue>, EngineError> {
    run::<Bb>(series, config)
}

/// Average true range. Undefined for the first `length − 1` bars.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn atr(series: &PriceSeries, config: AtrConfig) -> Result<DerivedSeries<Price>, EngineError> {
    run::<Atr>(series, config)
}

/// Closing price resampled to one value per calendar month, keyed by the
/// last day of the month. Months without bars carry the previous close
/// forward.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn monthly_closes(series: &PriceSeries) -> Result<DerivedSeries<Price>, EngineError> {
    ensure_not_empty(series)?;
    Ok(monthly::month_end_closes(series))
}

/// Month-over-month percent change of the resampled close. The first month
/// is undefined, as is any month following a zero close.
///
/// # Errors
///
/// [`EngineError::InsufficientData`] if `series` is empty.
pub fn monthly_percent_change(series: &PriceSeries) -> Result<DerivedSeries<Price>, EngineError> {
    monthly_closes(series).map(|closes| monthly::percent_change(&closes))
}

fn ensure_not_empty(series: &PriceSeries) -> Result<(), EngineError> {
    if series.is_empty() {
        return Err(EngineError::InsufficientData);
    }
    Ok(())
}
