//! SVG chart rendering.

use crate::aggregate::StationTotals;
use crate::core::{DailySeries, Forecast};
use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::FontTransform;
use std::path::Path;
use tracing::info;

const STATION_CHART_SIZE: (u32, u32) = (1200, 600);
const DAILY_CHART_SIZE: (u32, u32) = (1200, 500);
const FORECAST_CHART_SIZE: (u32, u32) = (1000, 500);
const FONT: &str = "sans-serif";

fn chart_error(path: &Path, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Chart {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Dates are plotted as day offsets from `origin` and labelled back as dates.
fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn offset_label(origin: NaiveDate, offset: f64) -> String {
    origin
        .checked_add_signed(chrono::Duration::days(offset.round() as i64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `(low, high)` with some headroom, never degenerate.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(hi.abs() * 0.01).max(1.0);
    (lo - pad, hi + pad)
}

/// Grouped bar chart of boarding and alighting totals per station.
pub fn render_station_chart(path: &Path, totals: &[StationTotals], line: &str) -> PipelineResult<()> {
    let root = SVGBackend::new(path, STATION_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_error(path, e))?;

    let y_max = totals
        .iter()
        .map(|t| t.boarding.max(t.alighting))
        .max()
        .unwrap_or(0) as f64
        * 1.05
        + 1.0;
    let x_max = totals.len().max(1) as f64 - 0.5;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{line} boarding and alighting by station"), (FONT, 24))
        .margin(15)
        .x_label_area_size(110)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5f64..x_max, 0f64..y_max)
        .map_err(|e| chart_error(path, e))?;

    let label_for = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        totals
            .get(idx as usize)
            .map(|t| t.station.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(totals.len().max(1))
        .x_label_formatter(&label_for)
        .x_label_style((FONT, 11).into_font().transform(FontTransform::Rotate90))
        .x_desc("Station")
        .y_desc("Passengers")
        .draw()
        .map_err(|e| chart_error(path, e))?;

    chart
        .draw_series(totals.iter().enumerate().map(|(i, t)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x, t.boarding as f64)], BLUE.filled())
        }))
        .map_err(|e| chart_error(path, e))?
        .label("Boarding")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], BLUE.filled()));

    chart
        .draw_series(totals.iter().enumerate().map(|(i, t)| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + 0.4, t.alighting as f64)], RED.filled())
        }))
        .map_err(|e| chart_error(path, e))?
        .label("Alighting")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| chart_error(path, e))?;

    root.present().map_err(|e| chart_error(path, e))?;
    info!(path = %path.display(), stations = totals.len(), "rendered station chart");
    Ok(())
}

/// Line chart of the daily total. An empty series renders an empty frame.
pub fn render_daily_chart(path: &Path, series: &DailySeries) -> PipelineResult<()> {
    let root = SVGBackend::new(path, DAILY_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_error(path, e))?;

    let origin = series.first_date().unwrap_or_default();
    let x_max = series
        .last_date()
        .map(|last| day_offset(origin, last))
        .unwrap_or(0.0)
        .max(1.0);
    let (y_lo, y_hi) = padded_range(series.values().iter().copied());

    let mut chart = ChartBuilder::on(&root)
        .caption("Daily total passengers", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..x_max, y_lo..y_hi)
        .map_err(|e| chart_error(path, e))?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x: &f64| offset_label(origin, *x))
        .x_desc("Date")
        .y_desc("Total passengers")
        .draw()
        .map_err(|e| chart_error(path, e))?;

    chart
        .draw_series(LineSeries::new(
            series.iter().map(|(d, v)| (day_offset(origin, d), v)),
            BLUE.stroke_width(2),
        ))
        .map_err(|e| chart_error(path, e))?;

    root.present().map_err(|e| chart_error(path, e))?;
    info!(path = %path.display(), days = series.len(), "rendered daily chart");
    Ok(())
}

/// Trailing actual values followed by the forecast, drawn dashed in red.
pub fn render_forecast_chart(
    path: &Path,
    history: &DailySeries,
    forecast: &Forecast,
) -> PipelineResult<()> {
    let root = SVGBackend::new(path, FORECAST_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_error(path, e))?;

    let origin = history
        .first_date()
        .or_else(|| forecast.dates().first().copied())
        .unwrap_or_default();
    let x_max = forecast
        .dates()
        .last()
        .copied()
        .or_else(|| history.last_date())
        .map(|last| day_offset(origin, last))
        .unwrap_or(0.0)
        .max(1.0);
    let (y_lo, y_hi) = padded_range(
        history
            .values()
            .iter()
            .chain(forecast.point().iter())
            .copied(),
    );

    let mut chart = ChartBuilder::on(&root)
        .caption("Forecast: total passengers", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..x_max, y_lo..y_hi)
        .map_err(|e| chart_error(path, e))?;

    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|x: &f64| offset_label(origin, *x))
        .x_desc("Date")
        .y_desc("Total passengers")
        .draw()
        .map_err(|e| chart_error(path, e))?;

    chart
        .draw_series(LineSeries::new(
            history.iter().map(|(d, v)| (day_offset(origin, d), v)),
            BLUE.stroke_width(2),
        ))
        .map_err(|e| chart_error(path, e))?
        .label("Actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    let forecast_points: Vec<(f64, f64)> = forecast
        .rows()
        .map(|(d, v)| (day_offset(origin, d), v))
        .collect();
    chart
        .draw_series(DashedLineSeries::new(
            forecast_points,
            8,
            5,
            RED.stroke_width(2),
        ))
        .map_err(|e| chart_error(path, e))?
        .label("Forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| chart_error(path, e))?;

    root.present().map_err(|e| chart_error(path, e))?;
    info!(path = %path.display(), horizon = forecast.horizon(), "rendered forecast chart");
    Ok(())
}
