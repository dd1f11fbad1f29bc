//! Serializable run configuration.
//!
//! A run config is a small TOML file describing where the series lives
//! and how the engine should be parameterized:
//!
//! ```toml
//! [data]
//! path = "btc_daily.csv"
//!
//! [data.columns]
//! price = "close"
//! signal = "position"
//! date = "date"
//!
//! [engine]
//! initial_capital = 25000.0
//! fee_rate = 0.0005
//! periods_per_year = 365.0
//! ```
//!
//! Every engine field is optional and falls back to the engine defaults,
//! so a minimal config is just a data path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::EngineConfig;

use crate::data::SeriesColumns;

/// Errors from loading a run configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Complete description of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Where the series lives and which columns to read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// CSV file with price and signal columns.
    pub path: PathBuf,
    #[serde(default)]
    pub columns: SeriesColumns,
}

impl RunConfig {
    /// Load and parse a TOML run configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
