//! Backtest engine — replays a position-signal series against prices.
//!
//! The engine consumes equal-length signal and price sequences, replays
//! position changes bar by bar with lag-one execution (the signal observed
//! at bar i takes effect for bar i+1's return — no look-ahead), accrues
//! transaction fees at the bar where each new signal is observed, and
//! produces a compounding equity curve plus the aggregate
//! [`BacktestMetrics`] record.
//!
//! Fees are applied as a single multiplicative haircut on the finished
//! curve (`1 - total_fees / initial_capital`) rather than compounding
//! bar by bar. That is a documented policy of this engine, preserved so
//! historical metric outputs stay comparable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frame::{AlignedFrame, BacktestError};
use crate::metrics::{BacktestMetrics, TRADING_DAYS_PER_YEAR};

/// Immutable engine configuration. One engine instance may run any number
/// of independent backtests, including concurrently — a run mutates no
/// engine state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting capital. Must be positive.
    pub initial_capital: f64,
    /// Transaction fee as a fraction of traded notional per unit of
    /// position change. Must be non-negative.
    pub fee_rate: f64,
    /// Annualized risk-free rate, used only in the Sharpe calculation.
    pub risk_free_rate: f64,
    /// Bars per year for annualization. Defaults to the 252 trading-day
    /// convention regardless of actual timestamp spacing.
    pub periods_per_year: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            fee_rate: 0.001,
            risk_free_rate: 0.02,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Aggregate metrics — the stable external contract.
    pub metrics: BacktestMetrics,
    /// Fee-adjusted equity per return-bearing bar. `equity_curve[0]`
    /// corresponds to the first bar with a defined return (bar 1 of the
    /// cleaned input), not bar 0.
    pub equity_curve: Vec<f64>,
    /// Per-bar strategy returns aligned with `equity_curve`.
    pub strategy_returns: Vec<f64>,
    /// Date labels aligned with `equity_curve`, when the caller supplied
    /// timestamps. Cosmetic: they never affect a metric.
    pub dates: Option<Vec<NaiveDate>>,
}

/// Signal-series backtester with lag-one execution and flat-fee modeling.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: EngineConfig,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a backtest over aligned signal and price sequences.
    ///
    /// Signals are -1/0/1 by convention (short/flat/long); arbitrary
    /// finite values act as position weights. `dates` are optional labels
    /// carried through to the report. Pure function of inputs and config:
    /// no I/O, no mutation of inputs.
    ///
    /// Fails with [`BacktestError::LengthMismatch`] on unequal input
    /// lengths and [`BacktestError::InsufficientData`] when fewer than
    /// 2 rows remain after non-finite rows are dropped.
    pub fn run_backtest(
        &self,
        signals: &[f64],
        prices: &[f64],
        dates: Option<&[NaiveDate]>,
    ) -> Result<BacktestReport, BacktestError> {
        let frame = AlignedFrame::build(signals, prices, dates)?;

        // Replay. The position in effect during bar i is the signal
        // observed at bar i-1, so the final bar's signal never earns a
        // return. Fees are charged at the bar where the new signal is
        // observed, priced at that bar; the first bar's signal is the
        // starting position and costs nothing, while a signal change on
        // the final bar is still billed.
        let mut total_fees = 0.0;
        let mut strategy_returns = Vec::with_capacity(frame.n_periods());

        for i in 1..frame.len() {
            let entering = frame.signals[i - 1];
            let change = frame.signals[i] - entering;
            if change != 0.0 {
                total_fees += change.abs() * frame.prices[i] * self.config.fee_rate;
            }
            strategy_returns.push(entering * frame.returns[i - 1]);
        }

        // Compounding equity, then the uniform fee haircut.
        let haircut = 1.0 - total_fees / self.config.initial_capital;
        let mut equity_curve = Vec::with_capacity(strategy_returns.len());
        let mut acc = self.config.initial_capital;
        for r in &strategy_returns {
            acc *= 1.0 + r;
            equity_curve.push(acc * haircut);
        }

        let metrics =
            BacktestMetrics::compute(&strategy_returns, &equity_curve, total_fees, &self.config);

        Ok(BacktestReport {
            metrics,
            equity_curve,
            strategy_returns,
            dates: frame.dates.map(|d| d[1..].to_vec()),
        })
    }
}
