//! CSV export of forecast results.

use crate::core::Forecast;
use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One exported forecast row.
#[derive(Debug, Serialize)]
struct ForecastRow {
    date: NaiveDate,
    forecast_total: f64,
}

/// Write `forecast` as `date,forecast_total` rows, replacing any existing file.
pub fn write_forecast_csv(path: &Path, forecast: &Forecast) -> PipelineResult<()> {
    let file = std::fs::File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);

    // Serialized structs only emit a header once a row is written.
    if forecast.is_empty() {
        writer.write_record(["date", "forecast_total"])?;
    }
    for (date, forecast_total) in forecast.rows() {
        writer.serialize(ForecastRow {
            date,
            forecast_total,
        })?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    info!(path = %path.display(), rows = forecast.horizon(), "wrote forecast CSV");
    Ok(())
}
