use chrono::{Datelike, Months, NaiveDate};

use crate::{DerivedSeries, Price, PriceSeries};

/// Last calendar day of the month containing `date`.
///
/// ```
/// use bist_ta::month_end;
/// use chrono::NaiveDate;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
///
/// assert_eq!(month_end(date(2024, 2, 10)), date(2024, 2, 29));
/// assert_eq!(month_end(date(2023, 12, 31)), date(2023, 12, 31));
/// ```
#[must_use]
pub fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// One close per calendar month, keyed by month end.
///
/// Each month holds the last close observed in it. Months without bars
/// between the first and last month of the series carry the previous
/// month's close forward, so every entry is defined.
pub(crate) fn month_end_closes(series: &PriceSeries) -> DerivedSeries<Price> {
    let (Some(first), Some(last)) = (series.bars().first(), series.last_date()) else {
        return DerivedSeries::default();
    };

    let last_month = month_end(last);
    let mut month = month_end(first.date);
    let mut close = first.close;
    let mut bars = series.bars().iter().peekable();
    let mut out = Vec::new();

    loop {
        while let Some(bar) = bars.next_if(|bar| bar.date <= month) {
            close = bar.close;
        }
        out.push((month, Some(close)));

        if month >= last_month {
            break;
        }
        match month.succ_opt() {
            Some(next) => month = month_end(next),
            None => break,
        }
    }

    out.into_iter().collect()
}

/// Percent change between consecutive entries: `(cur − prev) / prev × 100`.
///
/// The first entry has no predecessor and is undefined. An entry whose
/// predecessor is zero or undefined is undefined as well.
pub(crate) fn percent_change(closes: &DerivedSeries<Price>) -> DerivedSeries<Price> {
    let mut prev: Option<Price> = None;

    closes
        .iter()
        .map(|(date, value)| {
            let change = match (prev, value) {
                (Some(p), Some(c)) if p != 0.0 => Some((c - p) / p * 100.0),
                _ => None,
            };
            prev = value;
            (date, change)
        })
        .collect()
}
