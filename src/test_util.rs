// src/test_util.rs

use crate::{Bar, PriceSeries};
use chrono::{Days, NaiveDate};
use std::num::NonZero;

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).unwrap()
}

/// `n` days after 2024-01-01.
pub fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n)
}

pub fn date(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap()
}

/// Full OHLC bar on day `n`.
pub fn ohlc(open: f64, high: f64, low: f64, close: f64, n: u64) -> Bar {
    Bar::new(day(n), open, high, low, close, 0.0)
}

/// Convenience: bar with just a close price (OHLC all equal to close).
pub fn bar(close: f64, n: u64) -> Bar {
    ohlc(close, close, close, close, n)
}

/// Series of flat bars on consecutive days.
pub fn series(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .zip(0..)
        .map(|(&close, n)| bar(close, n))
        .collect();
    PriceSeries::new(bars).unwrap()
}
