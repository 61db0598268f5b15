use std::{fmt::Display, num::NonZero};

use chrono::NaiveDate;

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource,
    smoothing::{Averager, Smoothing},
};

/// Configuration for the Average True Range ([`Atr`]) indicator.
///
/// # Example
///
/// ```
/// use bist_ta::{AtrConfig, IndicatorConfig, PriceSource, Smoothing};
///
/// let config = AtrConfig::default_14();
/// assert_eq!(config.length(), 14);
/// assert_eq!(*config.source(), PriceSource::TrueRange);
/// assert_eq!(config.smoothing(), Smoothing::Simple);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct AtrConfig {
    length: usize,
    source: PriceSource,
    smoothing: Smoothing,
}

impl IndicatorConfig for AtrConfig {
    type Builder = AtrConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        AtrConfigBuilder::new()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    #[inline]
    fn lookback(&self) -> usize {
        self.length - 1
    }
}

impl AtrConfig {
    /// Window length (number of bars).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Averaging method for the true range.
    #[inline]
    #[must_use]
    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// ATR(14) with simple averaging.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn default_14() -> Self {
        Self::builder().length(NonZero::new(14).unwrap()).build()
    }

    /// ATR with Wilder's smoothing, as in Wilder's original definition.
    #[must_use]
    pub fn wilder(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .smoothing(Smoothing::Wilder)
            .build()
    }
}

impl Display for AtrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AtrConfig({}, {}, {})",
            self.length, self.source, self.smoothing
        )
    }
}

/// Builder for [`AtrConfig`].
///
/// Defaults: source = [`PriceSource::TrueRange`],
/// smoothing = [`Smoothing::Simple`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct AtrConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
    smoothing: Smoothing,
}

impl AtrConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::TrueRange,
            smoothing: Smoothing::Simple,
        }
    }

    /// Sets the indicator window length.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }

    /// Sets the averaging method.
    #[inline]
    #[must_use]
    pub fn smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }
}

impl IndicatorConfigBuilder<AtrConfig> for AtrConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> AtrConfig {
        AtrConfig {
            length: self.length.expect("length is required"),
            source: self.source,
            smoothing: self.smoothing,
        }
    }
}

/// Average True Range (ATR).
///
/// Volatility measure averaging the true range of each bar:
///
/// ```text
/// TR[0] = high − low
/// TR[i] = max(high − low, |high − close[i − 1]|, |low − close[i − 1]|)
/// ATR   = average of TR over `length` bars
/// ```
///
/// The first bar has no previous close, so its true range is the
/// plain high-low range. The first defined ATR is at bar index
/// `length − 1`. ATR is never negative for well-formed bars.
///
/// # Example
///
/// ```
/// use bist_ta::{Atr, AtrConfig, Bar, IndicatorConfig, IndicatorConfigBuilder};
/// use chrono::NaiveDate;
/// use std::num::NonZero;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
///
/// let mut atr = Atr::new(AtrConfig::builder().length(NonZero::new(2).unwrap()).build());
///
/// // TR = 20 - 5 = 15
/// assert_eq!(atr.compute(&Bar::new(day(1), 10.0, 20.0, 5.0, 15.0, 0.0)), None);
/// // TR = max(10, |22 - 15|, |12 - 15|) = 10 → (15 + 10) / 2
/// assert_eq!(atr.compute(&Bar::new(day(2), 16.0, 22.0, 12.0, 18.0, 0.0)), Some(12.5));
/// ```
#[derive(Clone, Debug)]
pub struct Atr {
    config: AtrConfig,
    averager: Averager,
    prev_close: Option<Price>,
    current: Option<Price>,
    last_date: Option<NaiveDate>,
}

impl Indicator for Atr {
    type Config = AtrConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            averager: Averager::new(config.smoothing, config.length),
            prev_close: None,
            current: None,
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

        let range = self.config.source.extract(ohlcv, self.prev_close);
        self.prev_close = Some(ohlcv.close());

        self.current = self.averager.push(range);
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Atr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ATR({}, {}, {})",
            self.config.length, self.config.source, self.config.smoothing
        )
    }
}
