//! The end-to-end ridership analysis run.
//!
//! Stages execute strictly in order and the first failure halts the run;
//! artifacts written by earlier stages are left in place.

use crate::aggregate::{daily_totals, station_totals, STATION_CHART_COLUMNS};
use crate::artifacts::remove_stale_artifacts;
use crate::chart::{render_daily_chart, render_forecast_chart, render_station_chart};
use crate::config::PipelineConfig;
use crate::core::{DailySeries, Forecast};
use crate::error::PipelineResult;
use crate::export::write_forecast_csv;
use crate::ingest::{read_records, RidershipRecord};
use crate::models::{ARIMASpec, Forecaster, ARIMA};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Fitted model summary carried in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub spec: ARIMASpec,
    pub ar_coefficients: Vec<f64>,
    pub ma_coefficients: Vec<f64>,
    pub residual_variance: Option<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub converged: bool,
}

impl ModelSummary {
    fn from_model(model: &ARIMA) -> Self {
        Self {
            spec: model.spec(),
            ar_coefficients: model.ar_coefficients().to_vec(),
            ma_coefficients: model.ma_coefficients().to_vec(),
            residual_variance: model.residual_variance(),
            aic: model.aic(),
            bic: model.bic(),
            converged: model.converged(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub rows_dropped: usize,
    /// Days in the reindexed series used for fitting.
    pub series_days: usize,
    /// Days inserted by reindexing and forward-filled.
    pub filled_days: usize,
    pub model: ModelSummary,
    pub forecast: Forecast,
    /// Artifacts written by this run, in write order.
    pub artifacts: Vec<PathBuf>,
}

/// Series prepared for fitting plus the fitted model and its forecast.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub series: DailySeries,
    pub filled_days: usize,
    pub model: ARIMA,
    pub forecast: Forecast,
}

/// Reindex `daily` to every calendar day, forward-fill the gaps, fit an
/// ARIMA model and forecast `horizon` days past the last observation.
pub fn forecast_daily(
    daily: &DailySeries,
    spec: ARIMASpec,
    horizon: usize,
) -> PipelineResult<ForecastOutcome> {
    let reindexed = daily.as_daily_frequency();
    let filled_days = reindexed.len() - daily.len();
    let series = reindexed.forward_filled();

    let mut model = ARIMA::from_spec(spec);
    model.fit(&series)?;
    let forecast = model.predict(horizon)?;

    Ok(ForecastOutcome {
        series,
        filled_days,
        model,
        forecast,
    })
}

fn station_stage(
    config: &PipelineConfig,
    records: &[RidershipRecord],
) -> PipelineResult<Option<PathBuf>> {
    if !config.columns.contains_all(&STATION_CHART_COLUMNS) {
        warn!(
            required = ?STATION_CHART_COLUMNS,
            columns = ?config.columns.names(),
            "column schema has no station column; skipping station chart"
        );
        return Ok(None);
    }

    let totals = station_totals(records, &config.line_filter);
    if totals.is_empty() {
        warn!(line = %config.line_filter, "no records for line; skipping station chart");
        return Ok(None);
    }

    let path = config.artifact_path(&config.artifacts.station_chart);
    render_station_chart(&path, &totals, &config.line_filter)?;
    Ok(Some(path))
}

/// Run every stage once with `config`.
#[tracing::instrument(skip_all, fields(input = %config.input_path.display()))]
pub fn run(config: &PipelineConfig) -> PipelineResult<PipelineReport> {
    config.validate()?;
    let mut artifacts = Vec::new();

    remove_stale_artifacts(&config.output_dir, &config.artifacts.all())?;

    let ingested = read_records(&config.input_path, &config.encoding, &config.columns)?;

    if let Some(path) = station_stage(config, &ingested.records)? {
        artifacts.push(path);
    }

    let daily = daily_totals(&ingested.records)?;
    let daily_path = config.artifact_path(&config.artifacts.daily_chart);
    render_daily_chart(&daily_path, &daily)?;
    artifacts.push(daily_path);

    let spec = config.arima_spec();
    let outcome = forecast_daily(&daily, spec, config.horizon)?;
    let model = ModelSummary::from_model(&outcome.model);
    info!(
        model = %spec,
        days = outcome.series.len(),
        filled = outcome.filled_days,
        aic = ?model.aic,
        converged = model.converged,
        "fitted model"
    );
    debug!(ar = ?model.ar_coefficients, ma = ?model.ma_coefficients, sigma2 = ?model.residual_variance);
    if !model.converged {
        debug!(
            iterations = outcome.model.iterations(),
            "likelihood optimizer stopped before converging"
        );
    }

    let history = outcome.series.tail(config.history_window);
    let forecast_chart = config.artifact_path(&config.artifacts.forecast_chart);
    render_forecast_chart(&forecast_chart, &history, &outcome.forecast)?;
    artifacts.push(forecast_chart);

    let csv_path = config.artifact_path(&config.artifacts.forecast_csv);
    write_forecast_csv(&csv_path, &outcome.forecast)?;
    artifacts.push(csv_path);

    Ok(PipelineReport {
        rows_read: ingested.rows_read,
        rows_dropped: ingested.rows_dropped,
        series_days: outcome.series.len(),
        filled_days: outcome.filled_days,
        model,
        forecast: outcome.forecast,
        artifacts,
    })
}
