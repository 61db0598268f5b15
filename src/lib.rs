//! Technical indicator engine for daily stock price series.
//!
//! Two surfaces share one implementation:
//!
//! - **Streaming.** [`Sma`], [`Ema`], [`Rsi`], [`Macd`], [`Bb`] and [`Atr`]
//!   accept any type implementing [`Ohlcv`], one bar at a time, and return
//!   typed results. Values are `None` until the lookback window is filled.
//! - **Batch.** The [`engine`] functions run an indicator over a whole
//!   [`PriceSeries`] and return a date-aligned [`DerivedSeries`], and
//!   [`Engine`] computes every configured indicator into one [`Report`].
//!
//! Each indicator type exposes [`new`](Sma::new), [`compute`](Sma::compute),
//! and [`value`](Sma::value) as inherent methods, so no trait import is
//! needed. Import [`Indicator`] only for generic code.
//!
//! The crate installs no `tracing` subscriber; malformed bars and empty
//! input are reported as `warn` events for the application to collect.

mod atr;
mod bb;
mod ema;
pub mod engine;
mod error;
mod indicator;
mod macd;
mod monthly;
mod ohlcv;
mod price_source;
mod price_window;
mod report;
mod ring_buffer;
mod rsi;
mod series;
mod sma;
mod smoothing;

pub use crate::error::{EngineError, SeriesError};
pub use crate::indicator::{Indicator, IndicatorConfig, IndicatorConfigBuilder};
pub use crate::monthly::month_end;
pub use crate::ohlcv::{Bar, Ohlcv, Price};
pub use crate::price_source::PriceSource;
pub use crate::report::{
    AtrParams, BollingerParams, Engine, EngineConfig, MacdParams, Report, RsiParams,
};
pub use crate::series::{DerivedSeries, PriceSeries};
pub use crate::smoothing::Smoothing;

pub use crate::atr::{Atr, AtrConfig, AtrConfigBuilder};
pub use crate::bb::{Bb, BbConfig, BbConfigBuilder, BbValue, Deviation, StdDev};
pub use crate::ema::{Ema, EmaConfig, EmaConfigBuilder};
pub use crate::macd::{Macd, MacdConfig, MacdConfigBuilder, MacdValue};
pub use crate::rsi::{Rsi, RsiConfig, RsiConfigBuilder};
pub use crate::sma::{Sma, SmaConfig, SmaConfigBuilder};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::compute`].
            #[inline]
            pub fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::compute(self, ohlcv)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Sma, SmaConfig, Price);
impl_indicator_methods!(Ema, EmaConfig, Price);
impl_indicator_methods!(Rsi, RsiConfig, Price);
impl_indicator_methods!(Macd, MacdConfig, MacdValue);
impl_indicator_methods!(Bb, BbConfig, BbValue);
impl_indicator_methods!(Atr, AtrConfig, Price);

#[cfg(test)]
mod test_util;

#[cfg(test)]
mod inherent_methods {
    use super::{
        Atr, AtrConfig, Bb, BbConfig, BbValue, Ema, EmaConfig, Macd, MacdConfig, Ohlcv, Price,
        Rsi, RsiConfig, Sma, SmaConfig,
    };
    use chrono::{Days, NaiveDate};
    use std::num::NonZero;

    struct Close(f64, u64);
    impl Ohlcv for Close {
        fn open(&self) -> Price {
            self.0
        }
        fn high(&self) -> Price {
            self.0
        }
        fn low(&self) -> Price {
            self.0
        }
        fn close(&self) -> Price {
            self.0
        }
        fn date(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(self.1)
        }
    }

    #[test]
    fn sma_without_indicator_import() {
        let mut sma = Sma::new(SmaConfig::close(NonZero::new(2).unwrap()));
        assert_eq!(sma.compute(&Close(10.0, 1)), None);
        assert_eq!(sma.compute(&Close(20.0, 2)), Some(15.0));
        assert_eq!(sma.value(), Some(15.0));
    }

    #[test]
    fn ema_without_indicator_import() {
        let mut ema = Ema::new(EmaConfig::close(NonZero::new(2).unwrap()));
        assert_eq!(ema.compute(&Close(10.0, 1)), Some(10.0));
        assert!(ema.compute(&Close(20.0, 2)).is_some());
        assert!(ema.value().is_some());
    }

    #[test]
    fn rsi_without_indicator_import() {
        let mut rsi = Rsi::new(RsiConfig::close(NonZero::new(1).unwrap()));
        assert_eq!(rsi.compute(&Close(10.0, 1)), None);
        assert_eq!(rsi.compute(&Close(20.0, 2)), Some(100.0));
        assert_eq!(rsi.value(), Some(100.0));
    }

    #[test]
    fn macd_without_indicator_import() {
        let mut macd = Macd::new(MacdConfig::default_12_26_9());
        assert!(macd.compute(&Close(10.0, 1)).is_some());
        assert!(macd.value().is_some());
    }

    #[test]
    fn bb_without_indicator_import() {
        let mut bb = Bb::new(BbConfig::close(NonZero::new(2).unwrap()));
        assert!(bb.compute(&Close(10.0, 1)).is_none());
        let v: Option<BbValue> = bb.compute(&Close(20.0, 2));
        assert!(v.is_some());
        assert!(bb.value().is_some());
    }

    #[test]
    fn atr_without_indicator_import() {
        let mut atr = Atr::new(AtrConfig::default_14());
        assert_eq!(atr.compute(&Close(10.0, 1)), None);
        assert!(atr.value().is_none());
    }
}
