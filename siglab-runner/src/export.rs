//! Artifact export — JSON metrics and CSV equity curves.
//!
//! Two artifacts per run:
//! - `metrics.json` — the flat metrics record; field names are the
//!   stable contract downstream dashboards key on
//! - `equity.csv` — the fee-adjusted equity curve with bar index and,
//!   when the input carried timestamps, a date column

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use siglab_core::BacktestReport;

/// Serialize the metrics record to pretty JSON.
pub fn export_metrics_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(&report.metrics).context("failed to serialize metrics to JSON")
}

/// Export the equity curve as CSV.
///
/// Columns are `bar_index,equity`, or `bar_index,date,equity` when the
/// report carries date labels.
pub fn export_equity_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    match &report.dates {
        Some(dates) => {
            wtr.write_record(["bar_index", "date", "equity"])?;
            for (i, (date, eq)) in dates.iter().zip(&report.equity_curve).enumerate() {
                wtr.write_record([
                    &i.to_string(),
                    &date.to_string(),
                    &format!("{eq:.4}"),
                ])?;
            }
        }
        None => {
            wtr.write_record(["bar_index", "equity"])?;
            for (i, eq) in report.equity_curve.iter().enumerate() {
                wtr.write_record([&i.to_string(), &format!("{eq:.4}")])?;
            }
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Save the artifact set for a run.
///
/// Creates `{run_name}_{timestamp}/` under `output_dir` containing
/// `metrics.json` and `equity.csv`, and returns the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path, run_name: &str) -> Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let dir = output_dir.join(format!("{run_name}_{timestamp}"));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact directory {}", dir.display()))?;

    fs::write(dir.join("metrics.json"), export_metrics_json(report)?)
        .context("failed to write metrics.json")?;
    fs::write(dir.join("equity.csv"), export_equity_csv(report)?)
        .context("failed to write equity.csv")?;

    Ok(dir)
}
