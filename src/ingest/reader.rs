//! Decoding and parsing of ridership CSV files.

use crate::error::{PipelineError, PipelineResult};
use crate::ingest::schema::{ColumnSchema, ALIGHTING, BOARDING, DATE, LINE, STATION, TOTAL};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::Encoding;
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"];
const PREVIEW_ROWS: usize = 5;

/// Field values read as missing, besides the empty string.
const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True for an empty field or a conventional missing-value marker.
pub fn is_missing_field(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || MISSING_TOKENS.contains(&raw)
}

/// One normalized input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RidershipRecord {
    pub date: NaiveDate,
    pub line: String,
    /// Present only when the schema has a station column.
    pub station: Option<String>,
    pub boarding: u64,
    pub alighting: u64,
    /// Taken as given; not checked against `boarding + alighting`.
    pub total: u64,
}

/// Records that survived normalization plus row accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub records: Vec<RidershipRecord>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Resolve an encoding label.
///
/// Accepts WHATWG labels and the code page names `cp949`/`ms949`, which map
/// to the EUC-KR decoder (a superset covering the unified Hangul code).
pub fn resolve_encoding(label: &str) -> PipelineResult<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase();
    let whatwg = match normalized.as_str() {
        "cp949" | "ms949" | "uhc" => "windows-949",
        other => other,
    };
    Encoding::for_label(whatwg.as_bytes())
        .ok_or_else(|| PipelineError::UnknownEncoding(label.to_string()))
}

/// Decode `bytes`, failing on any malformed sequence.
pub fn decode(bytes: &[u8], encoding: &'static Encoding, path: &Path) -> PipelineResult<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(PipelineError::Encoding {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Parse a calendar date, ignoring a trailing `HH:MM:SS` time.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt).ok().or_else(|| {
            NaiveDateTime::parse_from_str(raw, &format!("{fmt} %H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
    })
}

fn parse_count(raw: &str, row: usize, column: &str) -> PipelineResult<u64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }
    // Counts exported as floats ("1234.0") are accepted when integral.
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Ok(v as u64)
        }
        _ => Err(PipelineError::InvalidCount {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

struct Positions {
    date: usize,
    line: usize,
    station: Option<usize>,
    boarding: usize,
    alighting: usize,
    total: usize,
}

impl Positions {
    fn resolve(schema: &ColumnSchema) -> PipelineResult<Self> {
        let required = |name: &str| {
            schema.index_of(name).ok_or_else(|| {
                PipelineError::Config(format!("column schema lacks required column '{name}'"))
            })
        };
        Ok(Self {
            date: required(DATE)?,
            line: required(LINE)?,
            station: schema.index_of(STATION),
            boarding: required(BOARDING)?,
            alighting: required(ALIGHTING)?,
            total: required(TOTAL)?,
        })
    }
}

/// Parse decoded CSV text against a positional schema.
///
/// Rows that are short, hold a missing field (see [`is_missing_field`]) or
/// carry an unparseable date are dropped. A row wider than the schema, or a
/// count that is present but not a non-negative integer, is an error.
pub fn parse_records(text: &str, schema: &ColumnSchema) -> PipelineResult<Ingested> {
    let positions = Positions::resolve(schema)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let width = reader.headers()?.len();
    if width != schema.len() {
        return Err(PipelineError::SchemaMismatch {
            expected: schema.len(),
            got: width,
        });
    }

    let mut ingested = Ingested::default();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = idx + 1;
        ingested.rows_read += 1;

        if record.len() > schema.len() {
            return Err(PipelineError::SchemaMismatch {
                expected: schema.len(),
                got: record.len(),
            });
        }

        if record.len() < schema.len() || record.iter().any(is_missing_field) {
            ingested.rows_dropped += 1;
            continue;
        }

        let Some(date) = parse_date(&record[positions.date]) else {
            debug!(row, value = &record[positions.date], "dropping row with unparseable date");
            ingested.rows_dropped += 1;
            continue;
        };

        ingested.records.push(RidershipRecord {
            date,
            line: record[positions.line].trim().to_string(),
            station: positions.station.map(|i| record[i].trim().to_string()),
            boarding: parse_count(&record[positions.boarding], row, BOARDING)?,
            alighting: parse_count(&record[positions.alighting], row, ALIGHTING)?,
            total: parse_count(&record[positions.total], row, TOTAL)?,
        });
    }

    Ok(ingested)
}

/// Read, decode and normalize the ridership file at `path`.
#[tracing::instrument(skip(path, schema), fields(path = %path.display()))]
pub fn read_records(
    path: &Path,
    encoding_label: &str,
    schema: &ColumnSchema,
) -> PipelineResult<Ingested> {
    let encoding = resolve_encoding(encoding_label)?;
    let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let text = decode(&bytes, encoding, path)?;

    let ingested = parse_records(&text, schema)?;

    info!(columns = ?schema.names(), "applied column schema");
    for record in ingested.records.iter().take(PREVIEW_ROWS) {
        debug!(?record, "preview");
    }
    info!(
        rows_read = ingested.rows_read,
        rows_dropped = ingested.rows_dropped,
        records = ingested.records.len(),
        "ingested ridership records"
    );

    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE: &str = "\
날짜,호선명,승차,하차,합계
2024-01-01,2호선,100,90,190
2024-01-02,2호선,110,,110
not-a-date,2호선,120,100,220
20240103,1호선,130,120,250
";

    #[test]
    fn parses_dates_in_common_layouts() {
        assert_eq!(parse_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("20240305"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024/03/05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024.03.05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05 00:00:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date(" 2024-03-05 "), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn drops_missing_and_unparseable_rows() {
        let ingested = parse_records(SAMPLE, &ColumnSchema::default()).unwrap();

        assert_eq!(ingested.rows_read, 4);
        assert_eq!(ingested.rows_dropped, 2);
        assert_eq!(ingested.records.len(), 2);

        let first = &ingested.records[0];
        assert_eq!(first.date, date(2024, 1, 1));
        assert_eq!(first.line, "2호선");
        assert_eq!(first.station, None);
        assert_eq!((first.boarding, first.alighting, first.total), (100, 90, 190));

        assert_eq!(ingested.records[1].date, date(2024, 1, 3));
        assert_eq!(ingested.records[1].line, "1호선");
    }

    #[test]
    fn missing_value_markers_drop_the_row() {
        let text = "\
a,b,c,d,e
2024-01-01,L,1,2,3
2024-01-02,L,NA,2,3
2024-01-03,NULL,1,2,3
2024-01-04,L,1,nan,3
2024-01-05,L,1,2,#N/A
";
        let ingested = parse_records(text, &ColumnSchema::default()).unwrap();
        assert_eq!(ingested.rows_read, 5);
        assert_eq!(ingested.rows_dropped, 4);
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.records[0].date, date(2024, 1, 1));
    }

    #[test]
    fn missing_field_detection() {
        assert!(is_missing_field(""));
        assert!(is_missing_field("  "));
        assert!(is_missing_field(" N/A "));
        assert!(is_missing_field("None"));
        assert!(!is_missing_field("0"));
        assert!(!is_missing_field("Nan Station"));
    }

    #[test]
    fn short_rows_are_dropped() {
        let text = "a,b,c,d,e\n2024-01-01,L,1,2,3\n2024-01-02,L,1,2\n";
        let ingested = parse_records(text, &ColumnSchema::default()).unwrap();
        assert_eq!(ingested.rows_read, 2);
        assert_eq!(ingested.rows_dropped, 1);
        assert_eq!(ingested.records.len(), 1);
    }

    #[test]
    fn long_rows_are_rejected() {
        let text = "a,b,c,d,e\n2024-01-01,L,1,2,3\n2024-01-02,L,1,2,3,4\n";
        let err = parse_records(text, &ColumnSchema::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SchemaMismatch {
                expected: 5,
                got: 6
            }
        ));
    }

    #[test]
    fn header_names_are_ignored() {
        let text = "a,b,c,d,e\n2024-01-01,L,1,2,3\n";
        let ingested = parse_records(text, &ColumnSchema::default()).unwrap();
        assert_eq!(ingested.records[0].total, 3);
    }

    #[test]
    fn station_column_is_read_when_configured() {
        let schema = ColumnSchema::new([DATE, LINE, STATION, BOARDING, ALIGHTING, TOTAL]);
        let text = "d,l,s,b,a,t\n2024-01-01,2호선,강남,10,20,30\n";
        let ingested = parse_records(text, &schema).unwrap();
        assert_eq!(ingested.records[0].station.as_deref(), Some("강남"));
        assert_eq!(ingested.records[0].alighting, 20);
    }

    #[test]
    fn width_mismatch_is_schema_error() {
        let text = "a,b,c,d\n2024-01-01,L,1,2\n";
        let err = parse_records(text, &ColumnSchema::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SchemaMismatch {
                expected: 5,
                got: 4
            }
        ));
    }

    #[test]
    fn non_numeric_count_is_fatal() {
        let text = "a,b,c,d,e\n2024-01-01,L,1,2,3\n2024-01-02,L,1,x,3\n";
        let err = parse_records(text, &ColumnSchema::default()).unwrap_err();
        match err {
            PipelineError::InvalidCount { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, ALIGHTING);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn integral_float_counts_are_accepted() {
        assert_eq!(parse_count("1234.0", 1, TOTAL).unwrap(), 1234);
        assert!(parse_count("12.5", 1, TOTAL).is_err());
        assert!(parse_count("-3", 1, TOTAL).is_err());
    }

    #[test]
    fn cp949_alias_resolves_to_euc_kr() {
        assert_eq!(resolve_encoding("cp949").unwrap(), encoding_rs::EUC_KR);
        assert_eq!(resolve_encoding("CP949").unwrap(), encoding_rs::EUC_KR);
        assert_eq!(resolve_encoding("utf-8").unwrap(), encoding_rs::UTF_8);
        assert!(matches!(
            resolve_encoding("klingon"),
            Err(PipelineError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn decode_round_trips_korean_text() {
        let (bytes, _, _) = encoding_rs::EUC_KR.encode("2호선,강남");
        let text = decode(&bytes, encoding_rs::EUC_KR, Path::new("in.csv")).unwrap();
        assert_eq!(text, "2호선,강남");
    }

    #[test]
    fn decode_rejects_malformed_bytes() {
        let err = decode(&[0x41, 0xff, 0x42], encoding_rs::UTF_8, Path::new("in.csv"));
        assert!(matches!(err, Err(PipelineError::Encoding { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_records(
            Path::new("/nonexistent/ridership.csv"),
            "cp949",
            &ColumnSchema::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
