//! Performance metrics — pure functions that summarize a replayed run.
//!
//! Every metric is a pure function: return series and/or equity curve in,
//! scalar out. Degenerate inputs (zero volatility, zero drawdown, single
//! bar) resolve to 0.0 rather than NaN/Inf — downstream dashboards must
//! never crash on an edge-case history.

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;

/// Trading-day annualization convention. Crypto callers can substitute
/// 365 through [`EngineConfig::periods_per_year`].
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance record for a single backtest run.
///
/// Field names are a stable external contract — serialized output is
/// consumed by dashboards keyed on these exact names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    pub win_rate: f64,
    /// Count of return-bearing bars, *not* position-change events. The
    /// name is historical; consumers key on the existing meaning.
    pub total_trades: usize,
    pub final_equity: f64,
    pub total_fees: f64,
    pub fee_impact: f64,
}

impl BacktestMetrics {
    /// Compute all metrics from per-bar strategy returns, the fee-adjusted
    /// equity curve, and accumulated fees.
    pub fn compute(
        strategy_returns: &[f64],
        equity: &[f64],
        total_fees: f64,
        config: &EngineConfig,
    ) -> Self {
        let final_equity = equity.last().copied().unwrap_or(config.initial_capital);
        let total_return = final_equity / config.initial_capital - 1.0;
        let n_periods = strategy_returns.len();

        let annualized = annualized_return(total_return, n_periods, config.periods_per_year);
        let volatility = annualized_volatility(strategy_returns, config.periods_per_year);
        let sharpe_ratio = if volatility > 0.0 {
            (annualized - config.risk_free_rate) / volatility
        } else {
            0.0
        };
        let max_dd = max_drawdown(equity);
        let calmar_ratio = if max_dd.abs() > 0.0 {
            annualized / max_dd.abs()
        } else {
            0.0
        };

        Self {
            total_return,
            annualized_return: annualized,
            volatility,
            sharpe_ratio,
            max_drawdown: max_dd,
            calmar_ratio,
            win_rate: win_rate(strategy_returns),
            total_trades: n_periods,
            final_equity,
            total_fees,
            fee_impact: total_fees / config.initial_capital,
        }
    }

    /// True when every float field is finite (division guards held).
    pub fn is_finite(&self) -> bool {
        [
            self.total_return,
            self.annualized_return,
            self.volatility,
            self.sharpe_ratio,
            self.max_drawdown,
            self.calmar_ratio,
            self.win_rate,
            self.final_equity,
            self.total_fees,
            self.fee_impact,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Annualize a total return over `n_periods` bars.
///
/// `(1 + total)^(ppy / n) - 1`, clamped to -1.0 when the base is
/// non-positive (total loss) so the result stays finite.
pub fn annualized_return(total_return: f64, n_periods: usize, periods_per_year: f64) -> f64 {
    if n_periods == 0 {
        return 0.0;
    }
    let base = 1.0 + total_return;
    if base <= 0.0 {
        return -1.0;
    }
    base.powf(periods_per_year / n_periods as f64) - 1.0
}

/// Annualized volatility: sample std of per-bar returns * sqrt(ppy).
///
/// Returns 0.0 with fewer than 2 observations.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(returns) * periods_per_year.sqrt()
}

/// Maximum drawdown as a non-positive fraction (0 = no drawdown).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of return-bearing bars with a strictly positive return.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let winners = returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / returns.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1, pandas' default).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
