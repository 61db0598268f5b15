use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
};

use serde::{Deserialize, Serialize};

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource,
    price_window::{PriceWindow, PriceWindowWithSumOfSquares},
};

/// Standard deviation multiplier for Bollinger Bands.
///
/// Wraps a positive, finite `f64`. The constructor panics otherwise;
/// use [`StdDev::try_new`] for values from untrusted input.
///
/// Defaults to `2.0` (the standard Bollinger Bands setting).
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe because
/// NaN is rejected at construction.
#[derive(Clone, Copy, Debug)]
pub struct StdDev(f64);

impl StdDev {
    /// Creates a new standard deviation multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `value` is zero, negative, infinite or NaN.
    #[must_use]
    pub fn new(value: f64) -> Self {
        assert!(!value.is_nan(), "std_dev must not be NaN");
        assert!(value > 0.0, "std_dev must be positive");
        assert!(value.is_finite(), "std_dev must be finite");
        Self(value)
    }

    /// Creates a multiplier, or `None` if `value` is not positive and finite.
    #[must_use]
    pub fn try_new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for StdDev {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for StdDev {}

impl Hash for StdDev {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for StdDev {
    fn default() -> Self {
        Self(2.0)
    }
}

/// Which standard deviation the bands are built from.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub enum Deviation {
    /// Sample standard deviation (divides by `n − 1`).
    ///
    /// A window of length 1 has no sample deviation; it is treated as `0`
    /// so the bands collapse onto the middle band.
    #[default]
    Sample,
    /// Population standard deviation (divides by `n`).
    Population,
}

impl Display for Deviation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Configuration for the Bollinger Bands ([`Bb`]) indicator.
///
/// Like SMA, values are exact once the window is full; the first defined
/// value is at bar index `length − 1`.
///
/// # Example
///
/// ```
/// use bist_ta::{BbConfig, Deviation, IndicatorConfig};
///
/// // Length 20, close, 2.0 sample std devs
/// let config = BbConfig::default_20();
///
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.deviation(), Deviation::Sample);
/// assert_eq!(config.lookback(), 19);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct BbConfig {
    length: usize,
    source: PriceSource,
    std_dev: StdDev,
    deviation: Deviation,
}

impl IndicatorConfig for BbConfig {
    type Builder = BbConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        BbConfigBuilder::new()
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

impl BbConfig {
    /// Window length (number of bars).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Standard deviation multiplier for the upper and lower bands.
    #[inline]
    #[must_use]
    pub fn std_dev(&self) -> StdDev {
        self.std_dev
    }

    /// Sample or population standard deviation.
    #[inline]
    #[must_use]
    pub fn deviation(&self) -> Deviation {
        self.deviation
    }

    /// BB(20, Close, 2σ): the standard Bollinger Bands setting.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn default_20() -> Self {
        Self::builder().length(NonZero::new(20).unwrap()).build()
    }

    /// BB with custom length, close price, 2σ.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }
}

impl Display for BbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BbConfig({}, {}, {}, {})",
            self.length,
            self.source,
            self.std_dev.value(),
            self.deviation,
        )
    }
}

/// Builder for [`BbConfig`].
///
/// Defaults: source = [`PriceSource::Close`],
/// `std_dev` = `2.0`, deviation = [`Deviation::Sample`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct BbConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
    std_dev: StdDev,
    deviation: Deviation,
}

impl BbConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
            std_dev: StdDev::default(),
            deviation: Deviation::default(),
        }
    }

    /// Sets the indicator window length.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }

    #[inline]
    #[must_use]
    pub fn std_dev(mut self, std_dev: StdDev) -> Self {
        self.std_dev = std_dev;
        self
    }

    #[inline]
    #[must_use]
    pub fn deviation(mut self, deviation: Deviation) -> Self {
        self.deviation = deviation;
        self
    }
}

impl IndicatorConfigBuilder<BbConfig> for BbConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> BbConfig {
        BbConfig {
            length: self.length.expect("length is required"),
            source: self.source,
            std_dev: self.std_dev,
            deviation: self.deviation,
        }
    }
}

/// Bollinger Bands output: upper, middle, and lower bands.
///
/// The middle band is the SMA. Upper and lower bands are offset by
/// `std_dev × σ`, where `σ` is the standard deviation of the window.
///
/// ```text
/// upper  = SMA + k × σ
/// middle = SMA
/// lower  = SMA − k × σ
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BbValue {
    upper: Price,
    middle: Price,
    lower: Price,
}

impl BbValue {
    /// Upper band: `SMA + k × σ`.
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Price {
        self.upper
    }

    /// Middle band: SMA of the window.
    #[inline]
    #[must_use]
    pub fn middle(&self) -> Price {
        self.middle
    }

    /// Lower band: `SMA − k × σ`.
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Price {
        self.lower
    }

    /// Band width: `upper − lower`.
    ///
    /// Narrow width indicates consolidation (Bollinger squeeze); wide
    /// width indicates high volatility.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Display for BbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB(u: {}, m: {}, l: {})",
            self.upper, self.middle, self.lower
        )
    }
}

/// Bollinger Bands (BB).
///
/// A volatility indicator consisting of three bands: a simple moving average
/// (middle) with upper and lower bands offset by a configurable number of
/// standard deviations. The deviation is taken over the same window as the
/// SMA so all three bands become defined on the same bar.
///
/// Uses a running sum and sum of squares for O(1) updates per bar.
///
/// # Example
///
/// ```
/// use bist_ta::{Bar, Bb, BbConfig};
/// use chrono::{Days, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let bar = |close, d| Bar::new(start + Days::new(d), close, close, close, close, 0.0);
///
/// let mut bb = Bb::new(BbConfig::default_20());
///
/// for d in 0..19 {
///     assert!(bb.compute(&bar(100.0, d)).is_none());
/// }
///
/// let value = bb.compute(&bar(100.0, 19)).unwrap();
/// assert_eq!(value.upper(), 100.0);
/// assert_eq!(value.lower(), 100.0);
/// ```
#[derive(Clone, Debug)]
pub struct Bb {
    config: BbConfig,
    length_reciprocal: f64,
    divisor_reciprocal: f64,
    std_dev_multiplier: f64,
    window: PriceWindowWithSumOfSquares,
    current: Option<BbValue>,
}

impl Indicator for Bb {
    type Config = BbConfig;
    type Output = BbValue;

    fn new(config: Self::Config) -> Self {
        let window = PriceWindow::with_sum_of_squares(config.length, config.source);

        #[allow(clippy::cast_precision_loss)]
        let n = config.length as f64;
        let divisor = match config.deviation {
            Deviation::Sample if config.length > 1 => n - 1.0,
            _ => n,
        };

        Self {
            config,
            length_reciprocal: 1.0 / n,
            divisor_reciprocal: 1.0 / divisor,
            std_dev_multiplier: config.std_dev.0,
            window,
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.window.add(ohlcv);

        self.current = match (self.window.sum(), self.window.sum_of_squares()) {
            (Some(sum), Some(sum_of_squares)) => {
                let mean = sum * self.length_reciprocal;

                // Σ(x − mean)² = Σx² − Σx × mean
                let squared_deviations = (sum_of_squares - sum * mean).max(0.0);
                let std_dev =
                    (squared_deviations * self.divisor_reciprocal).sqrt() * self.std_dev_multiplier;

                Some(Self::Output {
                    upper: mean + std_dev,
                    middle: mean,
                    lower: mean - std_dev,
                })
            }
            _ => None,
        };

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Display for Bb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB({}, {}, {}, {})",
            self.config.length, self.config.source, self.std_dev_multiplier, self.config.deviation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{bar, nz, ohlc};

    fn bb(length: usize, deviation: Deviation) -> Bb {
        Bb::new(
            BbConfig::builder()
                .length(nz(length))
                .deviation(deviation)
                .build(),
        )
    }

    fn population(length: usize) -> Bb {
        bb(length, Deviation::Population)
    }

    fn bb_with_std_dev(length: usize, std_dev: f64) -> Bb {
        Bb::new(
            BbConfig::builder()
                .length(nz(length))
                .deviation(Deviation::Population)
                .std_dev(StdDev::new(std_dev))
                .build(),
        )
    }

    fn assert_bb(value: Option<BbValue>, upper: f64, middle: f64, lower: f64) {
        let v = value.expect("expected Some(BbValue)");
        assert!(
            (v.upper() - upper).abs() < 1e-10,
            "upper: expected {upper}, got {}",
            v.upper()
        );
        assert!(
            (v.middle() - middle).abs() < 1e-10,
            "middle: expected {middle}, got {}",
            v.middle()
        );
        assert!(
            (v.lower() - lower).abs() < 1e-10,
            "lower: expected {lower}, got {}",
            v.lower()
        );
    }

    mod filling {
        use super::*;

        #[test]
        fn none_until_window_full() {
            let mut bb = population(3);
            assert!(bb.compute(&bar(10.0, 1)).is_none());
            assert!(bb.compute(&bar(20.0, 2)).is_none());
            assert!(bb.compute(&bar(30.0, 3)).is_some());
        }
    }

    mod population_deviation {
        use super::*;

        #[test]
        fn basic_bands() {
            // window [3, 5]: mean=4, variance=1, σ=1 → (6, 4, 2)
            let mut bb = population(2);
            bb.compute(&bar(3.0, 1));
            assert_bb(bb.compute(&bar(5.0, 2)), 6.0, 4.0, 2.0);
        }

        #[test]
        fn updates_on_advance() {
            // [3, 5] → [5, 7]: mean=6, σ=1 → (8, 6, 4)
            let mut bb = population(2);
            bb.compute(&bar(3.0, 1));
            bb.compute(&bar(5.0, 2));
            assert_bb(bb.compute(&bar(7.0, 3)), 8.0, 6.0, 4.0);
        }
    }

    mod sample_deviation {
        use super::*;

        #[test]
        fn divides_by_n_minus_one() {
            // [2, 4, 6]: mean=4, sample variance=(4+0+4)/2=4, σ=2 → (8, 4, 0)
            let mut bb = bb(3, Deviation::Sample);
            bb.compute(&bar(2.0, 1));
            bb.compute(&bar(4.0, 2));
            assert_bb(bb.compute(&bar(6.0, 3)), 8.0, 4.0, 0.0);
        }

        #[test]
        fn length_one_collapses_bands() {
            let mut bb = bb(1, Deviation::Sample);
            assert_bb(bb.compute(&bar(7.0, 1)), 7.0, 7.0, 7.0);
        }

        #[test]
        fn wider_than_population() {
            let mut sample = bb(3, Deviation::Sample);
            let mut pop = population(3);
            for (i, p) in [1.0, 4.0, 2.0].into_iter().enumerate() {
                sample.compute(&bar(p, i as u64));
                pop.compute(&bar(p, i as u64));
            }
            assert!(sample.value().unwrap().width() > pop.value().unwrap().width());
        }
    }

    mod width {
        use super::*;

        #[test]
        fn spans_both_bands() {
            let mut bb = bb(2, Deviation::Sample);
            bb.compute(&bar(1.0, 1));
            let value = bb.compute(&bar(3.0, 2)).unwrap();
            // mean 2, sample std dev sqrt(2), two deviations each side
            assert!((value.width() - 4.0 * 2f64.sqrt()).abs() < 1e-12);
            assert!((value.width() - (value.upper() - value.lower())).abs() < 1e-12);
        }

        #[test]
        fn zero_on_flat_window() {
            let mut bb = population(3);
            bb.compute(&bar(5.0, 1));
            bb.compute(&bar(5.0, 2));
            assert!(bb.compute(&bar(5.0, 3)).unwrap().width().abs() < 1e-12);
        }
    }

    mod constant_input {
        use super::*;

        #[test]
        fn bands_collapse_to_price() {
            for deviation in [Deviation::Sample, Deviation::Population] {
                let mut bb = bb(3, deviation);
                bb.compute(&bar(10.0, 1));
                bb.compute(&bar(10.0, 2));
                assert_bb(bb.compute(&bar(10.0, 3)), 10.0, 10.0, 10.0);
            }
        }

        #[test]
        fn bands_are_symmetric() {
            let mut bb = population(2);
            bb.compute(&bar(3.0, 1));
            let v = bb.compute(&bar(5.0, 2)).unwrap();
            let upper_dist = v.upper() - v.middle();
            let lower_dist = v.middle() - v.lower();
            assert!((upper_dist - lower_dist).abs() < 1e-10);
        }
    }

    mod std_dev_multiplier {
        use super::*;

        #[test]
        fn multiplier_of_one() {
            // [3, 5], σ=1 → (5, 4, 3)
            let mut bb = bb_with_std_dev(2, 1.0);
            bb.compute(&bar(3.0, 1));
            assert_bb(bb.compute(&bar(5.0, 2)), 5.0, 4.0, 3.0);
        }

        #[test]
        fn fractional_multiplier() {
            // [3, 5], k=1.5 → (5.5, 4, 2.5)
            let mut bb = bb_with_std_dev(2, 1.5);
            bb.compute(&bar(3.0, 1));
            assert_bb(bb.compute(&bar(5.0, 2)), 5.5, 4.0, 2.5);
        }
    }

    mod price_source {
        use super::*;

        #[test]
        fn hl2_source() {
            let mut bb = Bb::new(
                BbConfig::builder()
                    .length(nz(2))
                    .source(PriceSource::HL2)
                    .build(),
            );
            bb.compute(&ohlc(0.0, 20.0, 10.0, 0.0, 1)); // HL2 = 15
            let v = bb.compute(&ohlc(0.0, 30.0, 20.0, 0.0, 2)).unwrap(); // HL2 = 25
            assert!((v.middle() - 20.0).abs() < 1e-10);
        }
    }

    mod config {
        use super::*;
        use std::collections::HashSet;

        #[test]
        fn defaults() {
            let config = BbConfig::default_20();
            assert!((config.std_dev().value() - 2.0).abs() < f64::EPSILON);
            assert_eq!(*config.source(), PriceSource::Close);
            assert_eq!(config.deviation(), Deviation::Sample);
        }

        #[test]
        #[should_panic(expected = "length is required")]
        fn panics_without_length() {
            let _ = BbConfig::builder().build();
        }

        #[test]
        #[should_panic(expected = "std_dev must be positive")]
        fn std_dev_rejects_zero() {
            let _ = StdDev::new(0.0);
        }

        #[test]
        #[should_panic(expected = "std_dev must not be NaN")]
        fn std_dev_rejects_nan() {
            let _ = StdDev::new(f64::NAN);
        }

        #[test]
        fn try_new_rejects_invalid() {
            assert!(StdDev::try_new(-1.0).is_none());
            assert!(StdDev::try_new(f64::INFINITY).is_none());
            assert_eq!(StdDev::try_new(2.5), Some(StdDev::new(2.5)));
        }

        #[test]
        fn eq_and_hash() {
            let mut set = HashSet::new();
            set.insert(BbConfig::default_20());

            assert!(set.contains(&BbConfig::close(nz(20))));
            assert!(!set.contains(&BbConfig::close(nz(10))));
            assert!(!set.contains(
                &BbConfig::builder()
                    .length(nz(20))
                    .deviation(Deviation::Population)
                    .build()
            ));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn bb_formats_correctly() {
            assert_eq!(population(20).to_string(), "BB(20, Close, 2, Population)");
        }

        #[test]
        fn bb_value_formats_correctly() {
            let v = BbValue {
                upper: 6.0,
                middle: 4.0,
                lower: 2.0,
            };
            assert_eq!(v.to_string(), "BB(u: 6, m: 4, l: 2)");
        }

        #[test]
        fn config_formats_correctly() {
            assert_eq!(
                BbConfig::default_20().to_string(),
                "BbConfig(20, Close, 2, Sample)"
            );
        }
    }
}
