#![allow(dead_code)]

use bist_ta::{Bar, DerivedSeries, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, de::DeserializeOwned};

/// Reference value per date; empty when the indicator is undefined.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub date: NaiveDate,
    pub expected: Option<f64>,
}

/// Reference Bollinger bands per date.
#[derive(Debug, Deserialize)]
pub struct RefBbValue {
    pub date: NaiveDate,
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

/// Reference MACD lines per date.
#[derive(Debug, Deserialize)]
pub struct RefMacdValue {
    pub date: NaiveDate,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Reference month-end close and percent change.
#[derive(Debug, Deserialize)]
pub struct RefMonthlyValue {
    pub date: NaiveDate,
    pub close: f64,
    pub expected: Option<f64>,
}

const OHLCV_PATH: &str = "tests/fixtures/data/bist-daily.csv";

/// Daily bars for one symbol, January 2023 to March 2024, with no
/// trading in August 2023.
pub fn load_reference_bars() -> Vec<Bar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

pub fn load_reference_series() -> PriceSeries {
    PriceSeries::new(load_reference_bars()).expect("reference bars are ordered")
}

pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

pub fn load_bb_ref(path: &str) -> Vec<RefBbValue> {
    load_records(path, "invalid BB reference record")
}

pub fn load_macd_ref(path: &str) -> Vec<RefMacdValue> {
    load_records(path, "invalid MACD reference record")
}

pub fn load_monthly_ref(path: &str) -> Vec<RefMonthlyValue> {
    load_records(path, "invalid monthly reference record")
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Assert an optional value matches its reference, including where both
/// are undefined.
pub fn assert_option_near(
    actual: Option<f64>,
    expected: Option<f64>,
    tolerance: f64,
    context: &str,
) {
    match (actual, expected) {
        (None, None) => {}
        (Some(a), Some(e)) => assert_near(a, e, tolerance, context),
        (a, e) => panic!("{context}: definedness mismatch, expected {e:?}, got {a:?}"),
    }
}

/// Compare a scalar derived series against a reference file row by row.
pub fn assert_matches_reference(
    name: &str,
    actual: &DerivedSeries<f64>,
    reference: &[RefValue],
    tolerance: f64,
) {
    assert_eq!(
        actual.len(),
        reference.len(),
        "{name}: length mismatch with reference"
    );

    for (i, ((date, value), expected)) in actual.iter().zip(reference).enumerate() {
        assert_eq!(date, expected.date, "{name}: date mismatch at row {i}");
        assert_option_near(
            value,
            expected.expected,
            tolerance,
            &format!("{name} at row {i} ({date})"),
        );
    }
}

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
