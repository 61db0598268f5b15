use std::{
    fmt::{Debug, Display},
    num::NonZero,
};

use chrono::NaiveDate;

use crate::{Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource};

/// Configuration for the Exponential Moving Average ([`Ema`])
/// indicator.
///
/// # Warm-up
///
/// EMA is seeded with the first price and has infinite memory: the
/// seed influences every later value, decaying by `1 − α` per bar.
/// Values are emitted from the first bar but are not representative
/// until roughly `length` bars have been seen.
///
/// # Example
///
/// ```
/// use bist_ta::{EmaConfig, IndicatorConfig};
/// use std::num::NonZero;
///
/// let config = EmaConfig::close(NonZero::new(20).unwrap());
///
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.lookback(), 0);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for EmaConfig {
    type Builder = EmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        EmaConfigBuilder::new()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    #[inline]
    fn lookback(&self) -> usize {
        0
    }
}

impl EmaConfig {
    /// Span (number of bars) used to derive the smoothing factor.
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Smoothing factor `α = 2 / (length + 1)`.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let length = self.length as f64;
        2.0 / (length + 1.0)
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }

    /// EMA on median price: `(high + low) / 2`.
    #[must_use]
    pub fn hl2(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::HL2)
            .build()
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`EmaConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct EmaConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
}

impl EmaConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
        }
    }

    /// Sets the indicator span.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }
}

impl IndicatorConfigBuilder<EmaConfig> for EmaConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> EmaConfig {
        EmaConfig {
            length: self.length.expect("length is required"),
            source: self.source,
        }
    }
}

/// Exponential Moving Average (EMA), recursive form.
///
/// A weighted moving average that gives more weight to recent
/// prices. Uses the standard smoothing factor
/// `α = 2 / (length + 1)`:
///
/// ```text
/// EMA[0] = price[0]
/// EMA[i] = α × price[i] + (1 − α) × EMA[i − 1]
/// ```
///
/// Every prior output feeds forward, so there is no lookback gap:
/// the first bar already yields a value. Runs in O(1) memory per
/// bar via a single fused multiply-add.
///
/// # Example
///
/// ```
/// use bist_ta::{Bar, Ema, EmaConfig};
/// use chrono::NaiveDate;
/// use std::num::NonZero;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let bar = |close, d| Bar::new(day(d), close, close, close, close, 0.0);
///
/// // EMA(3): α = 0.5
/// let mut ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
///
/// assert_eq!(ema.compute(&bar(2.0, 1)), Some(2.0));
/// assert_eq!(ema.compute(&bar(4.0, 2)), Some(3.0));
/// assert_eq!(ema.compute(&bar(8.0, 3)), Some(5.5));
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    config: EmaConfig,
    alpha: f64,
    current: Option<Price>,
    prev_close: Option<Price>,
    last_date: Option<NaiveDate>,
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            alpha: config.alpha(),
            current: None,
            prev_close: None,
            last_date: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Price> {
        debug_assert!(
            self.last_date.is_none_or(|d| d < ohlcv.date()),
            "dates must be strictly increasing: last={:?}, got={}",
            self.last_date,
            ohlcv.date(),
        );
        self.last_date = Some(ohlcv.date());

        let price = self.config.source.extract(ohlcv, self.prev_close);
        self.prev_close = Some(ohlcv.close());

        Some(self.update(price))
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Ema {
    /// Advances the average with a raw value, bypassing price extraction.
    ///
    /// Used to smooth derived sequences such as the MACD line.
    #[inline]
    pub(crate) fn update(&mut self, price: Price) -> Price {
        let next = match self.current {
            Some(previous) => self.alpha.mul_add(price - previous, previous),
            None => price,
        };
        self.current = Some(next);
        next
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}, {})", self.config.length, self.config.source)
    }
}
