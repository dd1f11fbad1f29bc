//! SigLab Runner — orchestration around the core engine.
//!
//! - Walk-forward retraining over a pluggable model (`walk_forward`)
//! - TOML run configuration (`config`)
//! - CSV series loading (`data`)
//! - JSON/CSV artifact export (`export`)

pub mod config;
pub mod data;
pub mod export;
pub mod walk_forward;

pub use config::{ConfigError, DataConfig, RunConfig};
pub use data::{load_series_csv, LoadError, SeriesColumns, SeriesData};
pub use export::{export_equity_csv, export_metrics_json, save_artifacts};
pub use walk_forward::{
    run_walk_forward, ModelError, TrainablePredictor, WalkForwardConfig, WalkForwardError,
    WalkForwardOutcome, WindowFailure,
};
