//! SigLab Core — signal-series backtesting and performance metrics.
//!
//! This crate contains the pure-computation heart of SigLab:
//! - Aligned frame construction with explicit NaN filtering (`frame`)
//! - The bar-by-bar replay engine with lag-one execution (`engine`)
//! - Performance metrics with guarded degenerate cases (`metrics`)
//! - Standalone return-stream statistics with beta/alpha (`portfolio`)
//!
//! Everything here is synchronous, deterministic, and free of I/O. An
//! engine instance holds only immutable configuration and can be shared
//! across threads.

pub mod engine;
pub mod frame;
pub mod metrics;
pub mod portfolio;

pub use engine::{BacktestEngine, BacktestReport, EngineConfig};
pub use frame::{AlignedFrame, BacktestError};
pub use metrics::{BacktestMetrics, TRADING_DAYS_PER_YEAR};
pub use portfolio::{portfolio_metrics, PortfolioMetrics};
