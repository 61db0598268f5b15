use std::{fmt::Display, num::NonZero};

use chrono::NaiveDate;

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource,
    smoothing::{Averager, Smoothing},
};

/// Configuration for the Relative Strength Index ([`Rsi`])
/// indicator.
///
/// RSI needs `length` price changes, i.e. `length + 1` bars, before
/// the first value: output begins at bar index `length`.
///
/// # Example
///
/// ```
/// use bist_ta::{IndicatorConfig, RsiConfig, Smoothing};
///
/// let config = RsiConfig::default_14();
/// assert_eq!(config.length(), 14);
/// assert_eq!(config.smoothing(), Smoothing::Simple);
/// assert_eq!(config.lookback(), 14);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RsiConfig {
    length: usize,
    source: PriceSource,
    smoothing: Smoothing,
}

impl IndicatorConfig for RsiConfig {
    type Builder = RsiConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        RsiConfigBuilder::new()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    #[inline]
    fn lookback(&self) -> usize {
        self.length
    }
}

impl RsiConfig {
    /// Window length (number of price changes averaged).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Averaging method for gains and losses.
    #[inline]
    #[must_use]
    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// RSI(14) on closing price with simple averaging.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn default_14() -> Self {
        Self::close(NonZero::new(14).unwrap())
    }

    /// RSI on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }
}

impl Display for RsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RsiConfig({}, {}, {})",
            self.length, self.source, self.smoothing
        )
    }
}

/// Builder for [`RsiConfig`].
///
/// Defaults: source = [`PriceSource::Close`],
/// smoothing = [`Smoothing::Simple`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct RsiConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
    smoothing: Smoothing,
}

impl RsiConfigBuilder {
    #[must_use]
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
            smoothing: Smoothing::Simple,
        }
    }

    /// Sets the indicator window length.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length = Some(length.get());
        self
    }

    /// Sets the averaging method for gains and losses.
    #[inline]
    #[must_use]
    pub fn smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }
}

impl IndicatorConfigBuilder<RsiConfig> for RsiConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> RsiConfig {
        RsiConfig {
            length: self.length.expect("length is required"),
            source: self.source,
            smoothing: self.smoothing,
        }
    }
}

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes on
/// a 0–100 scale. Values above 70 are conventionally considered
/// overbought; below 30, oversold.
///
/// Each bar's change is split into a gain and a loss, which are
/// averaged over `length` changes with the configured [`Smoothing`]:
///
/// ```text
/// RS  = avg_gain / avg_loss
/// RSI = 100 − 100 / (1 + RS) = 100 × avg_gain / (avg_gain + avg_loss)
/// ```
///
/// A zero `avg_loss` never divides by zero: a window with gains and no
/// losses saturates at exactly `100`. A window with neither gains nor
/// losses (flat price) has no defined ratio and yields `None`, never
/// NaN.
///
/// # Example
///
/// ```
/// use bist_ta::{Bar, Rsi, RsiConfig};
/// use chrono::NaiveDate;
/// use std::num::NonZero;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let bar = |close, d| Bar::new(day(d), close, close, close, close, 0.0);
///
/// let mut rsi = Rsi::new(RsiConfig::close(NonZero::new(3).unwrap()));
///
/// // Need 3 price changes (4 bars)
/// assert_eq!(rsi.compute(&bar(10.0, 1)), None);
/// assert_eq!(rsi.compute(&bar(12.0, 2)), None);
/// assert_eq!(rsi.compute(&bar(11.0, 3)), None);
///
/// // Bar 4: changes = +2, −1, +2 → avg_gain=4/3, avg_loss=1/3 → RSI=80
/// assert_eq!(rsi.compute(&bar(13.0, 4)), Some(80.0));
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    config: RsiConfig,
    gains: Averager,
    losses: Averager,
    prev_price: Option<Price>,
    prev_close: Option<Price>,
    current: Option<Price>,
    last_date: Option<NaiveDate>,
}

impl Indicator for Rsi {
    type Config = RsiConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            gains: Averager::new(config.smoothing, config.length),
            losses: Averager::new(config.smoothing, config.length),
            prev_price: None,
            prev_close: None,
            current: None,
            last_date: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        debug_assert!(
            self.last_date.is_none_or(|d| d < ohlcv.date()),
            "dates must be strictly increasing: last={:?}, got={}",
            self.last_date,
            ohlcv.date(),
        );
        self.last_date = Some(ohlcv.date());

        let price = self.config.source.extract(ohlcv, self.prev_close);
        self.prev_close = Some(ohlcv.close());

        // First bar has no change to measure
        let Some(prev_price) = self.prev_price.replace(price) else {
            return None;
        };

        let (gain, loss) = Self::gain_and_loss(prev_price, price);
        let avg_gain = self.gains.push(gain);
        let avg_loss = self.losses.push(loss);

        self.current = avg_gain
            .zip(avg_loss)
            .and_then(|(avg_gain, avg_loss)| Self::rsi_from_averages(avg_gain, avg_loss));

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Rsi {
    #[inline]
    fn gain_and_loss(prev_price: Price, price: Price) -> (Price, Price) {
        let change = price - prev_price;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        (gain, loss)
    }

    #[inline]
    fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
        if avg_loss == 0.0 {
            return (avg_gain > 0.0).then_some(100.0);
        }

        Some((100.0 * avg_gain / (avg_gain + avg_loss)).clamp(0.0, 100.0))
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RSI({}, {}, {})",
            self.config.length, self.config.source, self.config.smoothing
        )
    }
}
