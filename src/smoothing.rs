use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Price, PriceSource, price_window::PriceWindow};

/// Averaging method for indicators built on a running mean of per-bar
/// values ([`Rsi`](crate::Rsi) gains and losses, [`Atr`](crate::Atr) true
/// range).
///
/// Both methods produce their first value once `length` values have been
/// seen.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub enum Smoothing {
    /// Simple moving average over the last `length` values.
    #[default]
    Simple,
    /// Wilder's smoothing: SMA of the first `length` values as seed,
    /// then `avg = (prev_avg × (length − 1) + value) / length`.
    Wilder,
}

impl Display for Smoothing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Averager {
    Simple {
        window: PriceWindow,
        length_reciprocal: f64,
    },
    Wilder {
        seed: PriceWindow,
        length_reciprocal: f64,
        length_minus_one: f64,
        current: Option<Price>,
    },
}

impl Averager {
    pub(crate) fn new(smoothing: Smoothing, length: usize) -> Self {
        // The source is unused: values enter through `push`.
        let window = PriceWindow::new(length, PriceSource::Close);
        #[allow(clippy::cast_precision_loss)]
        let length_reciprocal = 1.0 / length as f64;

        match smoothing {
            Smoothing::Simple => Self::Simple {
                window,
                length_reciprocal,
            },
            Smoothing::Wilder => Self::Wilder {
                seed: window,
                length_reciprocal,
                #[allow(clippy::cast_precision_loss)]
                length_minus_one: (length - 1) as f64,
                current: None,
            },
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, value: Price) -> Option<Price> {
        match self {
            Self::Simple {
                window,
                length_reciprocal,
            } => {
                window.push(value);
                window.sum().map(|sum| sum * *length_reciprocal)
            }
            Self::Wilder {
                seed,
                length_reciprocal,
                length_minus_one,
                current,
            } => {
                *current = match *current {
                    Some(prev) => Some(prev.mul_add(*length_minus_one, value) * *length_reciprocal),
                    None => {
                        seed.push(value);
                        seed.sum().map(|sum| sum * *length_reciprocal)
                    }
                };
                *current
            }
        }
    }
}
