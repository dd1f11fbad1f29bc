//! Series loading — CSV input for the runner and CLI.
//!
//! Reads a price/signal series from a CSV file with a header row. Column
//! names are configurable; blank or unparseable numeric cells become NaN
//! and are handled by the engine's row filter, so a partially dirty file
//! still backtests over its clean rows.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the series loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read series file '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("series file '{path}' has no column named '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("bad date '{value}' at row {row} (expected YYYY-MM-DD)")]
    BadDate { row: usize, value: String },
}

/// Which CSV columns hold the series. Defaults to `price` and `signal`
/// with no date column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeriesColumns {
    pub price: String,
    pub signal: String,
    /// Optional date column (YYYY-MM-DD); carried through to the report
    /// as labels only.
    pub date: Option<String>,
}

impl Default for SeriesColumns {
    fn default() -> Self {
        Self {
            price: "price".to_string(),
            signal: "signal".to_string(),
            date: None,
        }
    }
}

/// A loaded series, ready for the engine.
#[derive(Debug, Clone)]
pub struct SeriesData {
    pub signals: Vec<f64>,
    pub prices: Vec<f64>,
    pub dates: Option<Vec<NaiveDate>>,
}

/// Load a price/signal series from a CSV file.
pub fn load_series_csv(path: &Path, columns: &SeriesColumns) -> Result<SeriesData, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let find = |name: &str| -> Result<usize, LoadError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };

    let price_idx = find(&columns.price)?;
    let signal_idx = find(&columns.signal)?;
    let date_idx = columns.date.as_deref().map(find).transpose()?;

    let mut signals = Vec::new();
    let mut prices = Vec::new();
    let mut dates = date_idx.map(|_| Vec::new());

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        prices.push(parse_cell(record.get(price_idx)));
        signals.push(parse_cell(record.get(signal_idx)));

        if let (Some(out), Some(idx)) = (dates.as_mut(), date_idx) {
            let value = record.get(idx).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                LoadError::BadDate {
                    row: row + 1,
                    value: value.to_string(),
                }
            })?;
            out.push(date);
        }
    }

    Ok(SeriesData {
        signals,
        prices,
        dates,
    })
}

/// Blank or unparseable cells become NaN; the engine drops those rows.
fn parse_cell(cell: Option<&str>) -> f64 {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_default_columns() {
        let file = write_csv("price,signal\n100.0,1\n102.0,0\n101.5,-1\n");
        let data = load_series_csv(file.path(), &SeriesColumns::default()).unwrap();
        assert_eq!(data.prices, vec![100.0, 102.0, 101.5]);
        assert_eq!(data.signals, vec![1.0, 0.0, -1.0]);
        assert!(data.dates.is_none());
    }

    #[test]
    fn load_renamed_columns_with_dates() {
        let columns = SeriesColumns {
            price: "close".to_string(),
            signal: "position".to_string(),
            date: Some("date".to_string()),
        };
        let file = write_csv(
            "date,close,position\n2024-01-02,100.0,1\n2024-01-03,102.0,0\n",
        );
        let data = load_series_csv(file.path(), &columns).unwrap();
        assert_eq!(data.prices, vec![100.0, 102.0]);
        assert_eq!(
            data.dates.unwrap()[0],
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn blank_and_junk_cells_become_nan() {
        let file = write_csv("price,signal\n100.0,1\n,0\nn/a,1\n103.0,\n");
        let data = load_series_csv(file.path(), &SeriesColumns::default()).unwrap();
        assert!(data.prices[1].is_nan());
        assert!(data.prices[2].is_nan());
        assert!(data.signals[3].is_nan());
        assert_eq!(data.prices[3], 103.0);
    }

    #[test]
    fn missing_column_reported_by_name() {
        let file = write_csv("close,signal\n100.0,1\n");
        let err = load_series_csv(file.path(), &SeriesColumns::default()).unwrap_err();
        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "price"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_date_reported_with_row() {
        let columns = SeriesColumns {
            date: Some("date".to_string()),
            ..SeriesColumns::default()
        };
        let file = write_csv("date,price,signal\n2024-01-02,100.0,1\n02/03/2024,101.0,0\n");
        let err = load_series_csv(file.path(), &columns).unwrap_err();
        match err {
            LoadError::BadDate { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "02/03/2024");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
