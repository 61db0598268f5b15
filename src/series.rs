use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Bar, Price, SeriesError};

/// Time-ordered daily bars for one symbol.
///
/// Construction checks that dates are strictly increasing and that every
/// number is finite, with non-negative volume. Bars whose OHLC values
/// violate `low <= open, close <= high` are accepted unchanged: each one is
/// logged at `warn` level and its index is kept in
/// [`malformed_bars`](Self::malformed_bars).
///
/// An empty series is a valid value. Batch operations in
/// [`engine`](crate::engine) reject it with
/// [`EngineError::InsufficientData`](crate::EngineError::InsufficientData).
///
/// # Example
///
/// ```
/// use bist_ta::{Bar, PriceSeries};
/// use chrono::NaiveDate;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
/// let series = PriceSeries::new(vec![
///     Bar::new(day(1), 10.0, 11.0, 9.5, 10.5, 1_000.0),
///     Bar::new(day(4), 10.5, 12.0, 10.0, 11.8, 1_500.0),
/// ])
/// .unwrap();
///
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.closes().collect::<Vec<_>>(), [10.5, 11.8]);
/// assert!(series.malformed_bars().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct PriceSeries {
    bars: Vec<Bar>,
    malformed: Vec<usize>,
}

impl PriceSeries {
    /// Validates `bars` and builds a series.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::UnorderedDates`] if a date does not follow its
    ///   predecessor (duplicates included).
    /// - [`SeriesError::NonFinite`] if any price or the volume is NaN or
    ///   infinite.
    /// - [`SeriesError::NegativeVolume`] if volume is below zero.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let mut malformed = Vec::new();

        for (index, bar) in bars.iter().enumerate() {
            check_finite(index, bar)?;

            if bar.volume < 0.0 {
                return Err(SeriesError::NegativeVolume { index });
            }

            if let Some(previous) = index.checked_sub(1).map(|i| bars[i].date)
                && previous >= bar.date
            {
                return Err(SeriesError::UnorderedDates {
                    index,
                    previous,
                    current: bar.date,
                });
            }

            if !bar.is_well_formed() {
                tracing::warn!(
                    index,
                    date = %bar.date,
                    open = bar.open,
                    high = bar.high,
                    low = bar.low,
                    close = bar.close,
                    "malformed bar passed through unchanged"
                );
                malformed.push(index);
            }
        }

        Ok(Self { bars, malformed })
    }

    /// Series with no bars.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn dates(&self) -> impl ExactSizeIterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|bar| bar.date)
    }

    pub fn closes(&self) -> impl ExactSizeIterator<Item = Price> + '_ {
        self.bars.iter().map(|bar| bar.close)
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|bar| bar.date)
    }

    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|bar| bar.date)
    }

    /// Indices of bars that violate the OHLC ordering invariant.
    #[must_use]
    pub fn malformed_bars(&self) -> &[usize] {
        &self.malformed
    }

    /// Bars dated within `start..=end`.
    ///
    /// Returns an empty series when the range holds no bars or
    /// `start > end`.
    ///
    /// ```
    /// use bist_ta::{Bar, PriceSeries};
    /// use chrono::NaiveDate;
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
    /// let series = PriceSeries::new(
    ///     (1..=10).map(|d| Bar::new(day(d), 1.0, 1.0, 1.0, 1.0, 0.0)).collect(),
    /// )
    /// .unwrap();
    ///
    /// let window = series.between(day(3), day(5));
    /// assert_eq!(window.first_date(), Some(day(3)));
    /// assert_eq!(window.last_date(), Some(day(5)));
    /// assert!(series.between(day(5), day(3)).is_empty());
    /// ```
    #[must_use]
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            return Self::empty();
        }

        let from = self.bars.partition_point(|bar| bar.date < start);
        let to = self.bars.partition_point(|bar| bar.date <= end);

        Self {
            bars: self.bars[from..to].to_vec(),
            malformed: self
                .malformed
                .iter()
                .filter(|&&i| (from..to).contains(&i))
                .map(|i| i - from)
                .collect(),
        }
    }
}

fn check_finite(index: usize, bar: &Bar) -> Result<(), SeriesError> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
        ("volume", bar.volume),
    ];

    match fields.into_iter().find(|(_, value)| !value.is_finite()) {
        Some((field, _)) => Err(SeriesError::NonFinite { index, field }),
        None => Ok(()),
    }
}

impl TryFrom<Vec<Bar>> for PriceSeries {
    type Error = SeriesError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<Bar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

/// Indicator output aligned 1:1 by date with its input series.
///
/// Entries before the indicator's lookback is filled are `None`, which is
/// distinct from a computed `Some(0.0)`. Serializes as
/// `{"dates": [...], "values": [...]}` with undefined entries as `null`, so a
/// chart can share its x-axis across panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries<T> {
    dates: Vec<NaiveDate>,
    values: Vec<Option<T>>,
}

impl<T> Default for DerivedSeries<T> {
    fn default() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Copy> DerivedSeries<T> {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Option<T>] {
        &self.values
    }

    /// Value at position `index`, or `None` when the entry is undefined or
    /// out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied().flatten()
    }

    /// `(date, value)` pairs, undefined entries included.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = (NaiveDate, Option<T>)> + ExactSizeIterator + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Defined entries only.
    pub fn defined(&self) -> impl Iterator<Item = (NaiveDate, T)> + '_ {
        self.iter()
            .filter_map(|(date, value)| value.map(|value| (date, value)))
    }

    #[must_use]
    pub fn first_defined(&self) -> Option<(NaiveDate, T)> {
        self.defined().next()
    }

    /// Most recent defined entry.
    #[must_use]
    pub fn last_defined(&self) -> Option<(NaiveDate, T)> {
        self.iter()
            .rev()
            .find_map(|(date, value)| value.map(|value| (date, value)))
    }

    /// Projects every defined value, keeping alignment.
    ///
    /// ```
    /// use bist_ta::{Bar, BbConfig, PriceSeries, engine};
    /// use chrono::NaiveDate;
    /// use std::num::NonZero;
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
    /// let series = PriceSeries::new(
    ///     (1..=3).map(|d| Bar::new(day(d), 5.0, 5.0, 5.0, 5.0, 0.0)).collect(),
    /// )
    /// .unwrap();
    ///
    /// let bands = engine::bollinger(&series, BbConfig::close(NonZero::new(2).unwrap())).unwrap();
    /// let upper = bands.map(|band| band.upper());
    /// assert_eq!(upper.values(), [None, Some(5.0), Some(5.0)]);
    /// ```
    #[must_use]
    pub fn map<U, F>(&self, mut f: F) -> DerivedSeries<U>
    where
        F: FnMut(T) -> U,
    {
        DerivedSeries {
            dates: self.dates.clone(),
            values: self.values.iter().map(|value| value.map(&mut f)).collect(),
        }
    }
}

impl<T> FromIterator<(NaiveDate, Option<T>)> for DerivedSeries<T> {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Option<T>)>>(iter: I) -> Self {
        let (dates, values) = iter.into_iter().unzip();
        Self { dates, values }
    }
}
