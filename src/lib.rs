//! # ridership-forecast
//!
//! Daily ridership forecasting for subway passenger counts.
//!
//! The crate ingests a legacy-encoded ridership CSV, renders descriptive
//! charts, fits an ARIMA(5,1,0) model to the daily total and exports a
//! 30-day point forecast. Each stage is exposed on its own so it can be
//! driven without running the whole [`pipeline`].

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod aggregate;
pub mod artifacts;
pub mod chart;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use error::{ForecastError, PipelineError, PipelineResult, Result};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{DailySeries, Forecast};
    pub use crate::error::{ForecastError, PipelineError, PipelineResult, Result};
    pub use crate::models::{ARIMASpec, Forecaster, ARIMA};
    pub use crate::pipeline::{run, PipelineReport};
}
