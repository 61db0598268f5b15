use crate::{Ohlcv, Price, PriceSource, ring_buffer::RingBuffer};
use chrono::NaiveDate;

/// Fixed-size rolling window with a running sum (and optionally a running
/// sum of squares).
///
/// Values enter either from a bar through the configured [`PriceSource`]
/// ([`add`](Self::add)) or directly ([`push`](Self::push)) for derived
/// sequences such as per-bar gains.
#[derive(Clone, Debug)]
pub(crate) struct PriceWindow<const SUM_OF_SQUARES: bool = false> {
    buffer: RingBuffer,
    /// Running sum of values in the window. Maintained incrementally via
    /// add/subtract, may accumulate FP rounding drift over very long runs,
    /// but negligible for typical window sizes on daily data.
    sum: Price,
    sum_of_squares: f64,
    /// Count of non-zero values in the window. When zero, the sums are
    /// reported as exactly `0.0` regardless of accumulated drift.
    non_zero: usize,
    /// Close of the last added bar, used for `TrueRange` extraction.
    prev_close: Option<Price>,
    source: PriceSource,
    last_date: Option<NaiveDate>,
}

pub(crate) type PriceWindowWithSumOfSquares = PriceWindow<true>;

impl PriceWindow {
    pub fn new(size: usize, source: PriceSource) -> Self {
        Self::with_capacity(size, source)
    }
}

impl PriceWindow<true> {
    pub fn with_sum_of_squares(size: usize, source: PriceSource) -> Self {
        Self::with_capacity(size, source)
    }
}

impl<const SUM_OF_SQUARES: bool> PriceWindow<SUM_OF_SQUARES> {
    fn with_capacity(size: usize, source: PriceSource) -> Self {
        Self {
            buffer: RingBuffer::new(size),
            sum: 0.0,
            sum_of_squares: 0.0,
            non_zero: 0,
            prev_close: None,
            source,
            last_date: None,
        }
    }

    #[inline]
    pub fn add(&mut self, ohlcv: &impl Ohlcv) {
        debug_assert!(
            self.last_date.is_none_or(|d| d < ohlcv.date()),
            "dates must be strictly increasing: last={:?}, got={}",
            self.last_date,
            ohlcv.date(),
        );
        self.last_date = Some(ohlcv.date());

        let price = self.source.extract(ohlcv, self.prev_close);
        self.prev_close = Some(ohlcv.close());

        self.push(price);
    }

    #[inline]
    pub fn push(&mut self, value: Price) {
        if let Some(old) = self.buffer.push(value) {
            self.sum -= old;
            if SUM_OF_SQUARES {
                self.sum_of_squares -= old * old;
            }
            if old != 0.0 {
                self.non_zero -= 1;
            }
        }

        self.sum += value;
        if SUM_OF_SQUARES {
            self.sum_of_squares += value * value;
        }
        if value != 0.0 {
            self.non_zero += 1;
        }
    }

    #[inline]
    pub fn sum(&self) -> Option<Price> {
        self.buffer
            .is_ready()
            .then(|| if self.non_zero == 0 { 0.0 } else { self.sum })
    }

    #[inline]
    pub fn sum_of_squares(&self) -> Option<Price> {
        assert!(SUM_OF_SQUARES, "sum_of_squares requires PriceWindow<true>");
        self.buffer.is_ready().then(|| {
            if self.non_zero == 0 {
                0.0
            } else {
                self.sum_of_squares
            }
        })
    }
}
