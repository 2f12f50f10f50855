//! Command-line entry point: runs the ridership pipeline once.

use anyhow::{Context, Result};
use clap::Parser;
use ridership_forecast::config::PipelineConfig;
use ridership_forecast::pipeline;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "ridership-forecast")]
#[command(about = "Chart daily subway ridership and forecast the next days with ARIMA", long_about = None)]
struct Cli {
    /// TOML configuration file; unset keys keep their defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config from '{}'", path.display())),
            None => Ok(PipelineConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry().with(stderr_layer).init();

    let config = Cli::parse().into_config()?;
    let report = pipeline::run(&config).context("ridership pipeline failed")?;

    info!(
        rows_read = report.rows_read,
        rows_dropped = report.rows_dropped,
        days = report.series_days,
        horizon = report.forecast.horizon(),
        "pipeline finished"
    );
    for path in &report.artifacts {
        info!(path = %path.display(), "artifact written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn no_arguments_runs_with_defaults() {
        let cli = Cli::try_parse_from(["ridership-forecast"]).unwrap();
        assert_eq!(cli.into_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn only_the_config_flag_is_accepted() {
        assert!(Cli::try_parse_from(["ridership-forecast", "--config", "run.toml"]).is_ok());
        assert!(Cli::try_parse_from(["ridership-forecast", "--input", "a.csv"]).is_err());
        assert!(Cli::try_parse_from(["ridership-forecast", "--horizon", "7"]).is_err());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "horizon = 7\nline_filter = \"1호선\"\n").unwrap();

        let args = [
            OsStr::new("ridership-forecast"),
            OsStr::new("--config"),
            path.as_os_str(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.horizon, 7);
        assert_eq!(config.line_filter, "1호선");
        assert_eq!(config.encoding, "cp949");
    }
}
