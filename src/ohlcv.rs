use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Daily OHLCV data used as input to all indicators.
///
/// Implement this on your own bar type to feed streaming indicators
/// without conversion. Indicators accept `&impl Ohlcv` and extract the
/// configured [`PriceSource`](crate::PriceSource) internally.
///
/// # Example
///
/// ```
/// use bist_ta::{Ohlcv, Price};
/// use chrono::NaiveDate;
///
/// struct MyBar {
///     o: f64, h: f64, l: f64, c: f64,
///     day: NaiveDate,
/// }
///
/// impl Ohlcv for MyBar {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn date(&self) -> NaiveDate { self.day }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the session.
    fn open(&self) -> Price;

    /// Highest price during the session.
    fn high(&self) -> Price;

    /// Lowest price during the session.
    fn low(&self) -> Price;

    /// Closing price of the session.
    fn close(&self) -> Price;

    /// Trading date of the bar.
    ///
    /// Each call to [`Indicator::compute`](crate::Indicator::compute) advances
    /// the indicator by one bar, so dates must be strictly increasing between
    /// calls. This is checked in debug builds.
    fn date(&self) -> NaiveDate;

    /// Traded volume. Defaults to `0.0`.
    fn volume(&self) -> f64 {
        0.0
    }
}

/// One trading day of open/high/low/close/volume data.
///
/// Serializes with an ISO `YYYY-MM-DD` date so rows from a CSV or JSON
/// download deserialize directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
}

impl Bar {
    #[must_use]
    pub fn new(
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: f64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` when `low <= open, close <= high`.
    ///
    /// Bars failing this check are still accepted by
    /// [`PriceSeries`](crate::PriceSeries) and fed to indicators unchanged.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}
