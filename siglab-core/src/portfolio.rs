//! Portfolio metrics — standalone statistics over a raw return stream.
//!
//! No signals or positions involved: any period-return series can be
//! summarized, with optional beta/alpha against a benchmark series.
//! Reused by callers that already have returns (live ledgers, external
//! strategies) and do not need a backtest replay.

use serde::{Deserialize, Serialize};

use crate::metrics::{max_drawdown, std_dev, TRADING_DAYS_PER_YEAR};

/// Summary statistics for a period-return series.
///
/// `beta`/`alpha` are present only when a benchmark was supplied with at
/// least 2 aligned points and nonzero variance; they are omitted from
/// serialized output entirely otherwise (absent, not zero).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

/// Compute portfolio metrics from a period-return series.
///
/// Non-finite returns are dropped first; `None` when nothing remains.
/// Annualization uses the 252 trading-day convention.
pub fn portfolio_metrics(
    returns: &[f64],
    benchmark_returns: Option<&[f64]>,
    risk_free_rate: f64,
) -> Option<PortfolioMetrics> {
    let clean: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if clean.is_empty() {
        return None;
    }

    let periods_per_year = TRADING_DAYS_PER_YEAR;
    let n_periods = clean.len();

    let total_return = clean.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
    let annualized_return = annualize(total_return, periods_per_year / n_periods as f64);

    let volatility = std_dev(&clean) * periods_per_year.sqrt();
    let sharpe_ratio = if volatility > 0.0 {
        (annualized_return - risk_free_rate) / volatility
    } else {
        0.0
    };

    // Compounded curve for drawdown (unit initial capital).
    let mut cumulative = Vec::with_capacity(n_periods);
    let mut acc = 1.0;
    for r in &clean {
        acc *= 1.0 + r;
        cumulative.push(acc);
    }
    let max_dd = max_drawdown(&cumulative);

    let (beta, alpha) = match benchmark_returns {
        Some(benchmark) => beta_alpha(
            returns,
            benchmark,
            annualized_return,
            risk_free_rate,
            periods_per_year,
        ),
        None => (None, None),
    };

    Some(PortfolioMetrics {
        total_return,
        annualized_return,
        volatility,
        sharpe_ratio,
        max_drawdown: max_dd,
        beta,
        alpha,
    })
}

/// Beta/alpha against a benchmark, aligned on original index positions
/// keeping only pairs where both values are finite (inner join).
///
/// Historical ddof mismatch preserved on purpose: covariance is the
/// sample estimate (n-1), benchmark variance the population estimate (n).
fn beta_alpha(
    returns: &[f64],
    benchmark: &[f64],
    annualized_return: f64,
    risk_free_rate: f64,
    periods_per_year: f64,
) -> (Option<f64>, Option<f64>) {
    let pairs: Vec<(f64, f64)> = returns
        .iter()
        .zip(benchmark.iter())
        .filter(|(r, b)| r.is_finite() && b.is_finite())
        .map(|(&r, &b)| (r, b))
        .collect();

    if pairs.len() < 2 {
        return (None, None);
    }

    let n = pairs.len() as f64;
    let mean_r = pairs.iter().map(|(r, _)| r).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let covariance = pairs
        .iter()
        .map(|(r, b)| (r - mean_r) * (b - mean_b))
        .sum::<f64>()
        / (n - 1.0);
    let benchmark_variance = pairs.iter().map(|(_, b)| (b - mean_b).powi(2)).sum::<f64>() / n;

    if benchmark_variance <= 0.0 {
        return (None, None);
    }

    let beta = covariance / benchmark_variance;
    let benchmark_annualized = annualize(mean_b, periods_per_year);
    let alpha =
        annualized_return - (risk_free_rate + beta * (benchmark_annualized - risk_free_rate));

    (Some(beta), Some(alpha))
}

/// `(1 + growth)^exponent - 1`, clamped to -1 when the base is
/// non-positive so results stay finite.
fn annualize(growth: f64, exponent: f64) -> f64 {
    let base = 1.0 + growth;
    if base <= 0.0 {
        return -1.0;
    }
    base.powf(exponent) - 1.0
}
