use std::{collections::BTreeMap, num::NonZero};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    AtrConfig, BbConfig, BbValue, DerivedSeries, Deviation, EmaConfig, EngineError,
    IndicatorConfig, IndicatorConfigBuilder, MacdConfig, MacdValue, Price, PriceSeries,
    RsiConfig, SmaConfig, Smoothing, StdDev, engine,
};

/// Parameters for a full [`Report`].
///
/// Every field has a default, so a partial JSON or TOML document
/// deserializes with the remaining values filled in. Values coming from
/// outside the program are checked by [`validate`](Self::validate), which
/// [`Engine::new`] calls.
///
/// ```
/// use bist_ta::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"sma_windows": [10]}"#).unwrap();
/// assert_eq!(config.sma_windows, [10]);
/// assert_eq!(config.rsi.length, 14);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// One SMA per window.
    pub sma_windows: Vec<usize>,
    /// One EMA per span.
    pub ema_spans: Vec<usize>,
    pub rsi: RsiParams,
    pub macd: MacdParams,
    pub bollinger: BollingerParams,
    pub atr: AtrParams,
    /// Whether to compute month-over-month percent change.
    pub monthly_change: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sma_windows: vec![20, 50],
            ema_spans: vec![20],
            rsi: RsiParams::default(),
            macd: MacdParams::default(),
            bollinger: BollingerParams::default(),
            atr: AtrParams::default(),
            monthly_change: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub length: usize,
    pub smoothing: Smoothing,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            length: 14,
            smoothing: Smoothing::Simple,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerParams {
    pub length: usize,
    pub std_dev: f64,
    pub deviation: Deviation,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            length: 20,
            std_dev: 2.0,
            deviation: Deviation::Sample,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtrParams {
    pub length: usize,
    pub smoothing: Smoothing,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self {
            length: 14,
            smoothing: Smoothing::Simple,
        }
    }
}

impl EngineConfig {
    /// Checks that every length is at least one, that the MACD fast span is
    /// shorter than the slow span, and that the Bollinger multiplier is a
    /// positive finite number.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), EngineError> {
        for &window in &self.sma_windows {
            length("sma_windows", window)?;
        }
        for &span in &self.ema_spans {
            length("ema_spans", span)?;
        }
        length("rsi.length", self.rsi.length)?;
        length("macd.fast", self.macd.fast)?;
        length("macd.slow", self.macd.slow)?;
        length("macd.signal", self.macd.signal)?;
        length("bollinger.length", self.bollinger.length)?;
        length("atr.length", self.atr.length)?;

        if self.macd.fast >= self.macd.slow {
            return Err(invalid(
                "macd.fast",
                format!(
                    "must be shorter than macd.slow ({} >= {})",
                    self.macd.fast, self.macd.slow
                ),
            ));
        }

        std_dev(self.bollinger.std_dev)?;

        Ok(())
    }
}

fn std_dev(value: f64) -> Result<StdDev, EngineError> {
    StdDev::try_new(value).ok_or_else(|| {
        invalid(
            "bollinger.std_dev",
            format!("must be positive and finite, got {value}"),
        )
    })
}

fn length(param: &'static str, value: usize) -> Result<NonZero<usize>, EngineError> {
    NonZero::new(value).ok_or_else(|| invalid(param, "must be at least 1".to_string()))
}

fn invalid(param: &'static str, reason: String) -> EngineError {
    EngineError::InvalidConfig { param, reason }
}

/// Every configured indicator for one price series, aligned by date.
///
/// This is what the presentation layer renders: each series has one entry
/// per input bar (monthly change: one per calendar month), with `null`
/// where the indicator is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<Price>,
    /// Keyed by window length.
    pub sma: BTreeMap<usize, DerivedSeries<Price>>,
    /// Keyed by span.
    pub ema: BTreeMap<usize, DerivedSeries<Price>>,
    pub rsi: DerivedSeries<Price>,
    pub macd: DerivedSeries<MacdValue>,
    pub bollinger: DerivedSeries<BbValue>,
    pub atr: DerivedSeries<Price>,
    pub monthly_change: Option<DerivedSeries<Price>>,
    /// Indices of bars that violate the OHLC ordering invariant.
    pub malformed_bars: Vec<usize>,
}

/// Computes a [`Report`] from a validated [`EngineConfig`].
///
/// Holds only indicator configs; every call to [`compute`](Self::compute)
/// starts from fresh indicator state, so one engine can serve any number of
/// series, from any thread.
///
/// # Example
///
/// ```
/// use bist_ta::{Bar, Engine, EngineConfig, EngineError, PriceSeries};
/// use chrono::{Days, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let bars = (0..60u32)
///     .map(|i| {
///         let close = 100.0 + f64::from(i);
///         Bar::new(start + Days::new(u64::from(i)), close, close + 1.0, close - 1.0, close, 1e6)
///     })
///     .collect();
/// let series = PriceSeries::new(bars).unwrap();
///
/// let engine = Engine::new(&EngineConfig::default()).unwrap();
/// let report = engine.compute(&series).unwrap();
///
/// assert_eq!(report.dates.len(), 60);
/// assert_eq!(report.sma[&20].get(19), Some(109.5));
/// assert_eq!(report.rsi.get(59), Some(100.0));
///
/// assert_eq!(
///     engine.compute(&PriceSeries::empty()),
///     Err(EngineError::InsufficientData),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    sma: Vec<SmaConfig>,
    ema: Vec<EmaConfig>,
    rsi: RsiConfig,
    macd: MacdConfig,
    bollinger: BbConfig,
    atr: AtrConfig,
    monthly_change: bool,
}

impl Engine {
    /// Validates `config` and builds the indicator configs.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] if `config` fails
    /// [`EngineConfig::validate`].
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let sma: Vec<_> = config
            .sma_windows
            .iter()
            .map(|&window| length("sma_windows", window).map(SmaConfig::close))
            .collect::<Result<_, _>>()?;
        let ema: Vec<_> = config
            .ema_spans
            .iter()
            .map(|&span| length("ema_spans", span).map(EmaConfig::close))
            .collect::<Result<_, _>>()?;

        let rsi = RsiConfig::builder()
            .length(length("rsi.length", config.rsi.length)?)
            .smoothing(config.rsi.smoothing)
            .build();
        let macd = MacdConfig::builder()
            .fast(length("macd.fast", config.macd.fast)?)
            .slow(length("macd.slow", config.macd.slow)?)
            .signal(length("macd.signal", config.macd.signal)?)
            .build();
        let bollinger = BbConfig::builder()
            .length(length("bollinger.length", config.bollinger.length)?)
            .std_dev(std_dev(config.bollinger.std_dev)?)
            .deviation(config.bollinger.deviation)
            .build();
        let atr = AtrConfig::builder()
            .length(length("atr.length", config.atr.length)?)
            .smoothing(config.atr.smoothing)
            .build();

        Ok(Self {
            sma,
            ema,
            rsi,
            macd,
            bollinger,
            atr,
            monthly_change: config.monthly_change,
        })
    }

    /// Runs every configured indicator over `series`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InsufficientData`] if `series` is empty.
    pub fn compute(&self, series: &PriceSeries) -> Result<Report, EngineError> {
        if series.is_empty() {
            tracing::warn!("no bars to compute indicators on");
            return Err(EngineError::InsufficientData);
        }

        let sma: BTreeMap<_, _> = self
            .sma
            .iter()
            .map(|&config| engine::sma(series, config).map(|derived| (config.length(), derived)))
            .collect::<Result<_, _>>()?;
        let ema: BTreeMap<_, _> = self
            .ema
            .iter()
            .map(|&config| engine::ema(series, config).map(|derived| (config.length(), derived)))
            .collect::<Result<_, _>>()?;

        let monthly_change = if self.monthly_change {
            Some(engine::monthly_percent_change(series)?)
        } else {
            None
        };

        let report = Report {
            dates: series.dates().collect(),
            closes: series.closes().collect(),
            sma,
            ema,
            rsi: engine::rsi(series, self.rsi)?,
            macd: engine::macd(series, self.macd)?,
            bollinger: engine::bollinger(series, self.bollinger)?,
            atr: engine::atr(series, self.atr)?,
            monthly_change,
            malformed_bars: series.malformed_bars().to_vec(),
        };

        tracing::debug!(
            bars = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            malformed = report.malformed_bars.len(),
            "indicator report computed"
        );

        Ok(report)
    }
}
