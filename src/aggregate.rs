//! Group-by aggregations over normalized ridership records.

use crate::core::DailySeries;
use crate::error::Result;
use crate::ingest::schema::{ALIGHTING, BOARDING, LINE, STATION};
use crate::ingest::RidershipRecord;
use std::collections::BTreeMap;

/// Columns the per-station chart needs.
pub const STATION_CHART_COLUMNS: [&str; 4] = [LINE, STATION, BOARDING, ALIGHTING];

/// Boarding and alighting sums for one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationTotals {
    pub station: String,
    pub boarding: u64,
    pub alighting: u64,
}

/// Sum boarding and alighting per station for records on `line`.
///
/// Sorted by boarding, largest first; ties are ordered by station name.
/// Records without a station are ignored.
pub fn station_totals(records: &[RidershipRecord], line: &str) -> Vec<StationTotals> {
    let mut sums: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for record in records.iter().filter(|r| r.line == line) {
        let Some(station) = record.station.as_deref() else {
            continue;
        };
        let entry = sums.entry(station).or_default();
        entry.0 = entry.0.saturating_add(record.boarding);
        entry.1 = entry.1.saturating_add(record.alighting);
    }

    let mut totals: Vec<StationTotals> = sums
        .into_iter()
        .map(|(station, (boarding, alighting))| StationTotals {
            station: station.to_string(),
            boarding,
            alighting,
        })
        .collect();

    // BTreeMap order already breaks ties by name; the sort is stable.
    totals.sort_by(|a, b| b.boarding.cmp(&a.boarding));
    totals
}

/// Sum the `total` column per calendar day.
pub fn daily_totals(records: &[RidershipRecord]) -> Result<DailySeries> {
    let mut sums: BTreeMap<_, u64> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(record.date).or_default();
        *entry = entry.saturating_add(record.total);
    }

    let (dates, values) = sums.into_iter().map(|(d, v)| (d, v as f64)).unzip();
    DailySeries::new(dates, values)
}
