//! Walk-forward retraining — rolling train/predict signal generation.
//!
//! Slides a fixed-size training window over a feature matrix, refits the
//! supplied model at each step, thresholds its class-1 probabilities into
//! long/flat signals for the following `step_size` bars, and hands the
//! assembled signal series to the backtest engine.
//!
//! This runner emits {0, 1} signals only (long/flat) — an intentionally
//! narrower space than the engine's -1/0/1 contract; there is no short
//! side in the retraining loop.
//!
//! Per-window model failures are recoverable: the window degrades to flat
//! signals and the failure is collected for diagnostics. Only malformed
//! series inputs abort the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::{BacktestEngine, BacktestError, BacktestReport};

/// Opaque model failure. Third-party training errors carry no structure
/// this crate can usefully inspect.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// The model seam: anything that can fit on tabular features and emit
/// class-1 probabilities. Mirrors the fit/predict_proba surface of an
/// sklearn-style classifier.
pub trait TrainablePredictor {
    /// Fit on training rows. Called once per window, on cleaned rows only.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<(), ModelError>;

    /// Probability of class 1 for each row, in row order.
    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

/// Configuration for the walk-forward loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalkForwardConfig {
    /// Training window size in bars (default 252).
    pub train_window: usize,
    /// Bars between refits, and prediction span per window (default 21).
    pub step_size: usize,
    /// Class-1 probability strictly above this becomes a long signal
    /// (default 0.5).
    pub threshold: f64,
    /// Minimum clean training rows; below this the window emits flat
    /// signals without fitting (default 10).
    pub min_train_rows: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_window: 252,
            step_size: 21,
            threshold: 0.5,
            min_train_rows: 10,
        }
    }
}

/// Errors from walk-forward orchestration.
#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("features and labels must have same length (features: {features}, labels: {labels})")]
    FeatureLabelMismatch { features: usize, labels: usize },

    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
}

/// A window whose fit or predict call failed. The window's signals were
/// replaced with flat; the run continued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowFailure {
    pub window: usize,
    /// Training range [start, end) in bar indices.
    pub train_start: usize,
    pub train_end: usize,
    pub reason: String,
}

/// Result of a walk-forward run: the backtest report, the signal series
/// that produced it, and any per-window diagnostics.
#[derive(Debug)]
pub struct WalkForwardOutcome {
    pub report: BacktestReport,
    pub signals: Vec<f64>,
    pub failures: Vec<WindowFailure>,
}

/// Run a walk-forward backtest with periodic model retraining.
///
/// Windows start at `train_window` and advance by `step_size` while a
/// full prediction span remains. The assembled signal sequence is padded
/// with flat signals (or truncated) to exactly match `prices`, then
/// replayed through `engine`.
pub fn run_walk_forward<M: TrainablePredictor>(
    model: &mut M,
    features: &[Vec<f64>],
    labels: &[f64],
    prices: &[f64],
    engine: &BacktestEngine,
    config: &WalkForwardConfig,
) -> Result<WalkForwardOutcome, WalkForwardError> {
    if features.len() != labels.len() {
        return Err(WalkForwardError::FeatureLabelMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }

    let mut signals: Vec<f64> = Vec::with_capacity(prices.len());
    let mut failures = Vec::new();
    let step = config.step_size;

    let mut window = 0;
    let mut start = config.train_window;
    while start + step < features.len() {
        let train_start = start - config.train_window;
        signals.extend(run_window(
            model,
            &features[train_start..start],
            &labels[train_start..start],
            &features[start..start + step],
            config,
            window,
            train_start,
            start,
            &mut failures,
        ));
        window += 1;
        start += step;
    }

    // Pad or truncate to the price series length.
    signals.resize(prices.len(), 0.0);

    let report = engine.run_backtest(&signals, prices, None)?;
    Ok(WalkForwardOutcome {
        report,
        signals,
        failures,
    })
}

/// Fit and predict for one window, degrading to flat signals on any
/// failure. Always returns exactly `config.step_size` signals.
#[allow(clippy::too_many_arguments)]
fn run_window<M: TrainablePredictor>(
    model: &mut M,
    train_features: &[Vec<f64>],
    train_labels: &[f64],
    test_features: &[Vec<f64>],
    config: &WalkForwardConfig,
    window: usize,
    train_start: usize,
    train_end: usize,
    failures: &mut Vec<WindowFailure>,
) -> Vec<f64> {
    let flat = vec![0.0; config.step_size];

    // Drop training rows with any non-finite feature or label.
    let mut clean_features = Vec::with_capacity(train_features.len());
    let mut clean_labels = Vec::with_capacity(train_labels.len());
    for (row, &label) in train_features.iter().zip(train_labels) {
        if label.is_finite() && row.iter().all(|v| v.is_finite()) {
            clean_features.push(row.clone());
            clean_labels.push(label);
        }
    }
    if clean_features.len() < config.min_train_rows {
        return flat;
    }

    if let Err(e) = model.fit(&clean_features, &clean_labels) {
        failures.push(WindowFailure {
            window,
            train_start,
            train_end,
            reason: format!("fit failed: {e}"),
        });
        return flat;
    }

    // Predict only on rows with complete features; the rest stay flat.
    let test_mask: Vec<bool> = test_features
        .iter()
        .map(|row| row.iter().all(|v| v.is_finite()))
        .collect();
    let clean_test: Vec<Vec<f64>> = test_features
        .iter()
        .zip(&test_mask)
        .filter(|(_, &ok)| ok)
        .map(|(row, _)| row.clone())
        .collect();

    if clean_test.is_empty() {
        return flat;
    }

    let probabilities = match model.predict_proba(&clean_test) {
        Ok(p) => p,
        Err(e) => {
            failures.push(WindowFailure {
                window,
                train_start,
                train_end,
                reason: format!("predict failed: {e}"),
            });
            return flat;
        }
    };
    if probabilities.len() != clean_test.len() {
        failures.push(WindowFailure {
            window,
            train_start,
            train_end,
            reason: format!(
                "predict returned {} probabilities for {} rows",
                probabilities.len(),
                clean_test.len()
            ),
        });
        return flat;
    }

    // Scatter thresholded predictions back over the full step span.
    let mut out = Vec::with_capacity(config.step_size);
    let mut clean_idx = 0;
    for j in 0..config.step_size {
        if j < test_mask.len() && test_mask[j] {
            let signal = if probabilities[clean_idx] > config.threshold {
                1.0
            } else {
                0.0
            };
            out.push(signal);
            clean_idx += 1;
        } else {
            out.push(0.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglab_core::EngineConfig;

    /// Always predicts the same class-1 probability.
    struct ConstantModel {
        proba: f64,
        fit_calls: usize,
    }

    impl ConstantModel {
        fn new(proba: f64) -> Self {
            Self {
                proba,
                fit_calls: 0,
            }
        }
    }

    impl TrainablePredictor for ConstantModel {
        fn fit(&mut self, _features: &[Vec<f64>], _labels: &[f64]) -> Result<(), ModelError> {
            self.fit_calls += 1;
            Ok(())
        }

        fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.proba; features.len()])
        }
    }

    /// Fails every fit call.
    struct BrokenModel;

    impl TrainablePredictor for BrokenModel {
        fn fit(&mut self, _features: &[Vec<f64>], _labels: &[f64]) -> Result<(), ModelError> {
            Err("singular matrix".into())
        }

        fn predict_proba(&self, _features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            unreachable!("fit never succeeds")
        }
    }

    fn rising_prices(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn features(n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect()
    }

    fn small_config() -> WalkForwardConfig {
        WalkForwardConfig {
            train_window: 10,
            step_size: 5,
            threshold: 0.5,
            min_train_rows: 5,
        }
    }

    #[test]
    fn confident_model_goes_long() {
        let n = 30;
        let mut model = ConstantModel::new(0.9);
        let labels = vec![1.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &features(n),
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();

        // Windows at 10, 15, 20 (start + step < 30): 3 fits, 15 signals,
        // padded to 30.
        assert_eq!(model.fit_calls, 3);
        assert_eq!(outcome.signals.len(), n);
        assert!(outcome.signals[..15].iter().all(|&s| s == 1.0));
        assert!(outcome.signals[15..].iter().all(|&s| s == 0.0));
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn unconfident_model_stays_flat() {
        let n = 30;
        let mut model = ConstantModel::new(0.3);
        let labels = vec![0.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &features(n),
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();
        assert!(outcome.signals.iter().all(|&s| s == 0.0));
        assert!((outcome.report.metrics.final_equity - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn probability_equal_to_threshold_is_flat() {
        // Strictly-above comparison: 0.5 at threshold 0.5 is not a long.
        let n = 30;
        let mut model = ConstantModel::new(0.5);
        let labels = vec![1.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &features(n),
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();
        assert!(outcome.signals.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn broken_model_degrades_to_flat_and_collects_failures() {
        let n = 30;
        let mut model = BrokenModel;
        let labels = vec![1.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &features(n),
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();

        assert!(outcome.signals.iter().all(|&s| s == 0.0));
        assert_eq!(outcome.failures.len(), 3);
        assert!(outcome.failures[0].reason.contains("singular matrix"));
        assert_eq!(outcome.failures[0].train_start, 0);
        assert_eq!(outcome.failures[0].train_end, 10);
    }

    #[test]
    fn nan_training_rows_below_minimum_skip_fitting() {
        let n = 30;
        let mut model = ConstantModel::new(0.9);
        // Poison enough training rows that every window drops below the
        // 5-row minimum.
        let mut feats = features(n);
        for row in feats.iter_mut().take(25) {
            row[0] = f64::NAN;
        }
        let labels = vec![1.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &feats,
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();

        assert_eq!(model.fit_calls, 0);
        assert!(outcome.signals.iter().all(|&s| s == 0.0));
        // Insufficient data is a silent degrade, not a failure.
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn nan_test_rows_get_flat_signals() {
        let n = 30;
        let mut model = ConstantModel::new(0.9);
        let mut feats = features(n);
        // Rows 10 and 12 sit in the first prediction span (bars 10..15).
        feats[10][1] = f64::NAN;
        feats[12][1] = f64::NAN;
        let labels = vec![1.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &feats,
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();

        // First window scatters predictions around the NaN rows.
        assert_eq!(&outcome.signals[..5], &[0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn signal_length_always_matches_prices() {
        // Prices longer than the assembled signals: pad with flat.
        let n = 30;
        let mut model = ConstantModel::new(0.9);
        let labels = vec![1.0; n];
        let prices = rising_prices(100);
        let outcome = run_walk_forward(
            &mut model,
            &features(n),
            &labels,
            &prices,
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();
        assert_eq!(outcome.signals.len(), 100);
    }

    #[test]
    fn feature_label_mismatch_rejected() {
        let mut model = ConstantModel::new(0.9);
        let err = run_walk_forward(
            &mut model,
            &features(30),
            &[1.0; 20],
            &rising_prices(30),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WalkForwardError::FeatureLabelMismatch {
                features: 30,
                labels: 20
            }
        ));
    }

    #[test]
    fn too_little_data_for_any_window_still_runs_flat() {
        // 12 bars with train_window 10 and step 5: no window fits.
        let n = 12;
        let mut model = ConstantModel::new(0.9);
        let labels = vec![1.0; n];
        let outcome = run_walk_forward(
            &mut model,
            &features(n),
            &labels,
            &rising_prices(n),
            &BacktestEngine::new(EngineConfig::default()),
            &small_config(),
        )
        .unwrap();
        assert_eq!(model.fit_calls, 0);
        assert_eq!(outcome.signals, vec![0.0; n]);
    }
}
