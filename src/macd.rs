use std::{fmt::Display, num::NonZero};

use serde::Serialize;

use crate::{
    Ema, EmaConfig, Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource,
};

/// Configuration for the Moving Average Convergence Divergence ([`Macd`])
/// indicator.
///
/// # Warm-up
///
/// All three lines are built from recursive EMAs seeded with the first
/// price, so MACD is defined from the first bar. Values are numerically
/// unreliable until roughly `slow` bars have been seen; they are emitted
/// anyway and [`warm_up_bars`](Self::warm_up_bars) reports the threshold
/// for callers that want to shade or trim that region.
///
/// # Example
///
/// ```
/// use bist_ta::{IndicatorConfig, MacdConfig};
///
/// let config = MacdConfig::default_12_26_9();
/// assert_eq!(config.fast(), 12);
/// assert_eq!(config.slow(), 26);
/// assert_eq!(config.signal(), 9);
/// assert_eq!(config.lookback(), 0);
/// assert_eq!(config.warm_up_bars(), 26);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MacdConfig {
    fast: NonZero<usize>,
    slow: NonZero<usize>,
    signal: NonZero<usize>,
    source: PriceSource,
}

impl IndicatorConfig for MacdConfig {
    type Builder = MacdConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        MacdConfigBuilder::new()
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

impl MacdConfig {
    /// Fast EMA span.
    #[inline]
    #[must_use]
    pub fn fast(&self) -> usize {
        self.fast.get()
    }

    /// Slow EMA span.
    #[inline]
    #[must_use]
    pub fn slow(&self) -> usize {
        self.slow.get()
    }

    /// Signal line EMA span.
    #[inline]
    #[must_use]
    pub fn signal(&self) -> usize {
        self.signal.get()
    }

    /// Bars before the output is representative: the longer of the two
    /// price EMA spans.
    #[inline]
    #[must_use]
    pub fn warm_up_bars(&self) -> usize {
        self.fast.max(self.slow).get()
    }

    /// MACD(12, 26, 9) on closing price.
    #[must_use]
    pub fn default_12_26_9() -> Self {
        Self::builder().build()
    }
}

impl Display for MacdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MacdConfig({}, {}, {}, {})",
            self.fast, self.slow, self.signal, self.source
        )
    }
}

/// Builder for [`MacdConfig`].
///
/// Defaults: fast = 12, slow = 26, signal = 9,
/// source = [`PriceSource::Close`]. Every field has a default, so
/// [`build`](IndicatorConfigBuilder::build) never panics.
pub struct MacdConfigBuilder {
    fast: NonZero<usize>,
    slow: NonZero<usize>,
    signal: NonZero<usize>,
    source: PriceSource,
}

const DEFAULT_FAST: NonZero<usize> = NonZero::new(12).unwrap();
const DEFAULT_SLOW: NonZero<usize> = NonZero::new(26).unwrap();
const DEFAULT_SIGNAL: NonZero<usize> = NonZero::new(9).unwrap();

impl MacdConfigBuilder {
    fn new() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
            source: PriceSource::Close,
        }
    }

    #[inline]
    #[must_use]
    pub fn fast(mut self, length: NonZero<usize>) -> Self {
        self.fast = length;
        self
    }

    #[inline]
    #[must_use]
    pub fn slow(mut self, length: NonZero<usize>) -> Self {
        self.slow = length;
        self
    }

    #[inline]
    #[must_use]
    pub fn signal(mut self, length: NonZero<usize>) -> Self {
        self.signal = length;
        self
    }
}

impl IndicatorConfigBuilder<MacdConfig> for MacdConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> MacdConfig {
        MacdConfig {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
            source: self.source,
        }
    }
}

/// MACD output: MACD line, signal line and histogram.
///
/// ```text
/// macd      = EMA(fast) − EMA(slow)
/// signal    = EMA(macd, signal)
/// histogram = macd − signal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdValue {
    macd: Price,
    signal: Price,
    histogram: Price,
}

impl MacdValue {
    /// MACD line: fast EMA minus slow EMA.
    #[inline]
    #[must_use]
    pub fn macd(&self) -> Price {
        self.macd
    }

    /// Signal line: EMA of the MACD line.
    #[inline]
    #[must_use]
    pub fn signal(&self) -> Price {
        self.signal
    }

    /// Histogram: MACD line minus signal line.
    #[inline]
    #[must_use]
    pub fn histogram(&self) -> Price {
        self.histogram
    }
}

impl Display for MacdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD(m: {}, s: {}, h: {})",
            self.macd, self.signal, self.histogram
        )
    }
}

/// Moving Average Convergence Divergence (MACD).
///
/// Trend-following oscillator pair: the difference between a fast and a
/// slow [`Ema`] of price, and an EMA of that difference (the signal line).
/// All three EMAs use the recursive form seeded with their first input, so
/// the output is defined from the first bar.
///
/// # Example
///
/// ```
/// use bist_ta::{Bar, Macd, MacdConfig};
/// use chrono::NaiveDate;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let bar = |close, d| Bar::new(day(d), close, close, close, close, 0.0);
///
/// let mut macd = Macd::new(MacdConfig::default_12_26_9());
///
/// // Both EMAs start at the first close
/// let first = macd.compute(&bar(100.0, 1)).unwrap();
/// assert_eq!(first.macd(), 0.0);
/// assert_eq!(first.signal(), 0.0);
///
/// // A rising price pulls the fast EMA above the slow one
/// let second = macd.compute(&bar(110.0, 2)).unwrap();
/// assert!(second.macd() > 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct Macd {
    config: MacdConfig,
    fast: Ema,
    slow: Ema,
    signal: Ema,
    current: Option<MacdValue>,
}

impl Indicator for Macd {
    type Config = MacdConfig;
    type Output = MacdValue;

    fn new(config: Self::Config) -> Self {
        let ema = |length: NonZero<usize>| {
            Ema::new(
                EmaConfig::builder()
                    .length(length)
                    .source(config.source)
                    .build(),
            )
        };

        Self {
            config,
            fast: ema(config.fast),
            slow: ema(config.slow),
            signal: ema(config.signal),
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<MacdValue> {
        let fast = self.fast.compute(ohlcv)?;
        let slow = self.slow.compute(ohlcv)?;

        let macd = fast - slow;
        let signal = self.signal.update(macd);

        self.current = Some(MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        });

        self.current
    }

    #[inline]
    fn value(&self) -> Option<MacdValue> {
        self.current
    }
}

impl Display for Macd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({}, {}, {}, {})",
            self.config.fast, self.config.slow, self.config.signal, self.config.source
        )
    }
}
