//! Aligned series frame — the validated per-bar view of raw inputs.
//!
//! Callers hand the engine two (optionally three) parallel sequences:
//! signals, prices, and dates. This module joins them into a compacted
//! frame with non-finite rows removed and per-bar price returns attached.
//! The frame is built, consumed, and discarded within a single engine
//! call; it is never persisted.
//!
//! Signals are nominally -1/0/1 (short/flat/long). Arbitrary finite
//! values are accepted and treated as position weights; only length and
//! finiteness are validated.

use chrono::NaiveDate;
use thiserror::Error;

/// Input validation errors. Numeric degeneracy (zero volatility, empty
/// drawdown, and so on) is never an error — the metrics layer resolves
/// those to safe defaults.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("signals and prices must have same length (signals: {signals}, prices: {prices})")]
    LengthMismatch { signals: usize, prices: usize },

    #[error("need at least 2 usable data points for backtesting (have {rows})")]
    InsufficientData { rows: usize },
}

/// Compacted, validated join of (signal, price, date) rows.
///
/// Row 0 carries no price return; every later row has
/// `returns[i] = prices[i] / prices[i-1] - 1`.
#[derive(Debug, Clone)]
pub struct AlignedFrame {
    pub signals: Vec<f64>,
    pub prices: Vec<f64>,
    /// Dates survive only for labeling output; they never enter a metric.
    pub dates: Option<Vec<NaiveDate>>,
    /// Per-bar price returns, aligned with rows 1..n. `returns[0]` pairs
    /// with row 1 of the frame.
    pub returns: Vec<f64>,
}

impl AlignedFrame {
    /// Join, filter, and validate the raw input sequences.
    ///
    /// Rows where either signal or price is non-finite are dropped
    /// (explicit replacement for pandas' dropna). Fails when lengths
    /// differ or fewer than 2 rows survive filtering.
    pub fn build(
        signals: &[f64],
        prices: &[f64],
        dates: Option<&[NaiveDate]>,
    ) -> Result<Self, BacktestError> {
        if signals.len() != prices.len() {
            return Err(BacktestError::LengthMismatch {
                signals: signals.len(),
                prices: prices.len(),
            });
        }
        if let Some(d) = dates {
            if d.len() != prices.len() {
                return Err(BacktestError::LengthMismatch {
                    signals: d.len(),
                    prices: prices.len(),
                });
            }
        }
        if signals.len() < 2 {
            return Err(BacktestError::InsufficientData {
                rows: signals.len(),
            });
        }

        let mut clean_signals = Vec::with_capacity(signals.len());
        let mut clean_prices = Vec::with_capacity(prices.len());
        let mut clean_dates = dates.map(|d| Vec::with_capacity(d.len()));

        for i in 0..signals.len() {
            if !signals[i].is_finite() || !prices[i].is_finite() {
                continue;
            }
            clean_signals.push(signals[i]);
            clean_prices.push(prices[i]);
            if let (Some(out), Some(d)) = (clean_dates.as_mut(), dates) {
                out.push(d[i]);
            }
        }

        if clean_signals.len() < 2 {
            return Err(BacktestError::InsufficientData {
                rows: clean_signals.len(),
            });
        }

        // Returns are computed on the compacted rows: a gap left by a
        // dropped row spans the two surviving neighbors.
        let returns: Vec<f64> = clean_prices
            .windows(2)
            .map(|w| w[1] / w[0] - 1.0)
            .collect();

        Ok(Self {
            signals: clean_signals,
            prices: clean_prices,
            dates: clean_dates,
            returns,
        })
    }

    /// Number of rows after filtering.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Number of return-bearing bars (rows minus the first).
    pub fn n_periods(&self) -> usize {
        self.returns.len()
    }
}
