//! Pipeline configuration.
//!
//! Defaults reproduce the fixed constants of the original analysis run; a TOML
//! file may override any subset of them.

use crate::error::{PipelineError, PipelineResult};
use crate::ingest::{resolve_encoding, ColumnSchema};
use crate::models::ARIMASpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File names of the artifacts a run writes into the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactNames {
    pub station_chart: String,
    pub daily_chart: String,
    pub forecast_chart: String,
    pub forecast_csv: String,
}

impl ArtifactNames {
    /// All artifact names, in the order the pipeline writes them.
    pub fn all(&self) -> [&str; 4] {
        [
            self.station_chart.as_str(),
            self.daily_chart.as_str(),
            self.forecast_chart.as_str(),
            self.forecast_csv.as_str(),
        ]
    }
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            station_chart: "line_2_station_passenger.svg".to_string(),
            daily_chart: "daily_total_passenger.svg".to_string(),
            forecast_chart: "forecast_passenger.svg".to_string(),
            forecast_csv: "forecast_result.csv".to_string(),
        }
    }
}

/// Everything a pipeline run needs to know.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Ridership CSV to ingest.
    pub input_path: PathBuf,
    /// Text encoding label of the input (WHATWG label or `cp949`).
    pub encoding: String,
    /// Directory receiving every artifact; must already exist.
    pub output_dir: PathBuf,
    pub artifacts: ArtifactNames,
    /// Names applied to the input columns by position.
    pub columns: ColumnSchema,
    /// Line label selected for the per-station chart.
    pub line_filter: String,
    /// ARIMA order as `[p, d, q]`.
    pub order: [usize; 3],
    /// Number of days to forecast.
    pub horizon: usize,
    /// Trailing observed days shown next to the forecast.
    pub history_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("/kaggle/input/seoul-subway/Seoul subway.csv"),
            encoding: "cp949".to_string(),
            output_dir: PathBuf::from("/kaggle/working/"),
            artifacts: ArtifactNames::default(),
            columns: ColumnSchema::default(),
            line_filter: "2호선".to_string(),
            order: [5, 1, 0],
            horizon: 30,
            history_window: 30,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn arima_spec(&self) -> ARIMASpec {
        let [p, d, q] = self.order;
        ARIMASpec::new(p, d, q)
    }

    /// Full path of an artifact inside the output directory.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.horizon == 0 {
            return Err(PipelineError::Config("horizon must be at least 1".into()));
        }
        if self.history_window == 0 {
            return Err(PipelineError::Config(
                "history_window must be at least 1".into(),
            ));
        }
        if self.artifacts.all().iter().any(|name| name.trim().is_empty()) {
            return Err(PipelineError::Config("artifact names must not be empty".into()));
        }
        resolve_encoding(&self.encoding)?;
        self.columns.validate()
    }
}
