//! CSV bar files: load input bars, write bar and labeled tables.
//!
//! Input schema is fixed: `timestamp,open,high,low,close`. Timestamps are
//! `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`. An empty price
//! cell or `NaN` loads as NaN so the bar stays unclassifiable instead of
//! failing the load.

use crate::domain::analysis::StructureBreakAnalysis;
use crate::domain::bar::Bar;
use crate::domain::error::StructbreakError;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

const BAR_COLUMNS: [&str; 5] = ["timestamp", "open", "high", "low", "close"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, StructbreakError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| StructbreakError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let headers = rdr.headers().map_err(|e| StructbreakError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        check_headers(headers)?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| StructbreakError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| StructbreakError::Data {
                reason: format!("row {}: missing timestamp column", row + 1),
            })?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| StructbreakError::Data {
                reason: format!("row {}: invalid timestamp '{}'", row + 1, ts_str),
            })?;

            let bar = Bar {
                timestamp,
                open: parse_price(&record, 1, row)?,
                high: parse_price(&record, 2, row)?,
                low: parse_price(&record, 3, row)?,
                close: parse_price(&record, 4, row)?,
            };
            if !bar.is_finite() {
                warn!("row {}: bar at {} has missing prices", row + 1, bar.timestamp);
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!("loaded {} bars from {}", bars.len(), self.path.display());
        Ok(bars)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn check_headers(headers: &csv::StringRecord) -> Result<(), StructbreakError> {
    let matches = headers.len() >= BAR_COLUMNS.len()
        && BAR_COLUMNS
            .iter()
            .zip(headers.iter())
            .all(|(want, got)| got.trim().eq_ignore_ascii_case(want));
    if matches {
        Ok(())
    } else {
        Err(StructbreakError::Data {
            reason: format!(
                "expected header '{}', found '{}'",
                BAR_COLUMNS.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        })
    }
}

fn parse_price(record: &csv::StringRecord, col: usize, row: usize) -> Result<f64, StructbreakError> {
    let raw = record.get(col).unwrap_or("").trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    raw.parse().map_err(|e| StructbreakError::Data {
        reason: format!("row {}: invalid {} value '{}': {}", row + 1, BAR_COLUMNS[col], raw, e),
    })
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Midnight timestamps print as plain dates.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn fmt_price(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

pub fn write_bars<W: Write>(out: W, bars: &[Bar]) -> Result<(), StructbreakError> {
    let mut wtr = csv::Writer::from_writer(out);
    let to_err = |e: csv::Error| StructbreakError::Data {
        reason: format!("CSV write error: {}", e),
    };

    wtr.write_record(BAR_COLUMNS).map_err(to_err)?;
    for bar in bars {
        wtr.write_record([
            format_timestamp(bar.timestamp),
            fmt_price(bar.open),
            fmt_price(bar.high),
            fmt_price(bar.low),
            fmt_price(bar.close),
        ])
        .map_err(to_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_bars_file(path: &Path, bars: &[Bar]) -> Result<(), StructbreakError> {
    let file = std::fs::File::create(path)?;
    write_bars(file, bars)
}

/// The filtered break table with derived columns and order indices.
pub fn write_labeled<W: Write>(
    out: W,
    analysis: &StructureBreakAnalysis,
) -> Result<(), StructbreakError> {
    let mut wtr = csv::Writer::from_writer(out);
    let to_err = |e: csv::Error| StructbreakError::Data {
        reason: format!("CSV write error: {}", e),
    };

    wtr.write_record([
        "index",
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "structure_low",
        "structure_low_index",
        "break_state",
        "is_break_candle",
        "last_bull_break_low",
        "long_order",
        "short_order",
    ])
    .map_err(to_err)?;

    for (row, orders) in analysis.breaks.iter().zip(&analysis.order_indices) {
        let opt = |v: Option<usize>| v.map(|i| i.to_string()).unwrap_or_default();
        wtr.write_record([
            row.index.to_string(),
            format_timestamp(row.bar.timestamp),
            fmt_price(row.bar.open),
            fmt_price(row.bar.high),
            fmt_price(row.bar.low),
            fmt_price(row.bar.close),
            row.structure.map(|p| p.low.to_string()).unwrap_or_default(),
            opt(row.structure.map(|p| p.index)),
            row.break_state.code().to_string(),
            row.is_break_candle.to_string(),
            row.last_bull_break_low.to_string(),
            opt(orders.long_order),
            opt(orders.short_order),
        ])
        .map_err(to_err)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{analyze, AnalysisParams};
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn fetch_bars_reads_rows() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close\n\
             2023-01-01,100.0,110.0,90.0,105.0\n\
             2023-01-02 09:30:00,105.0,115.0,100.0,110.0\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(format_timestamp(bars[0].timestamp), "2023-01-01");
        assert_eq!(format_timestamp(bars[1].timestamp), "2023-01-02 09:30:00");
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
    }

    #[test]
    fn fetch_bars_sorts_by_timestamp() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close\n\
             2023-01-03,3,3,3,3\n\
             2023-01-01,1,1,1,1\n\
             2023-01-02,2,2,2,2\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_price_loads_as_nan() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close\n\
             2023-01-01,100,110,,105\n\
             2023-01-02,100,110,90,NaN\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        assert!(bars[0].low.is_nan());
        assert!(bars[1].close.is_nan());
        assert!(!bars[0].is_finite());
    }

    #[test]
    fn garbage_price_is_data_error() {
        let (_dir, path) = write_csv("timestamp,open,high,low,close\n2023-01-01,abc,1,1,1\n");
        let err = CsvAdapter::new(path).fetch_bars().unwrap_err();
        assert!(matches!(err, StructbreakError::Data { reason } if reason.contains("open")));
    }

    #[test]
    fn bad_timestamp_is_data_error() {
        let (_dir, path) = write_csv("timestamp,open,high,low,close\n01/02/2023,1,1,1,1\n");
        assert!(CsvAdapter::new(path).fetch_bars().is_err());
    }

    #[test]
    fn wrong_header_is_data_error() {
        let (_dir, path) = write_csv("date,o,h,l,c\n2023-01-01,1,1,1,1\n");
        let err = CsvAdapter::new(path).fetch_bars().unwrap_err();
        assert!(matches!(err, StructbreakError::Data { reason } if reason.contains("header")));
    }

    #[test]
    fn missing_file_is_data_error() {
        let err = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"))
            .fetch_bars()
            .unwrap_err();
        assert!(matches!(err, StructbreakError::Data { .. }));
    }

    #[test]
    fn written_bars_load_back() {
        let (dir, path) = write_csv(
            "timestamp,open,high,low,close\n\
             2023-01-01,100.5,110,90,105\n\
             2023-01-02,105,115,100,\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();

        let out = dir.path().join("copy.csv");
        write_bars_file(&out, &bars).unwrap();
        let reloaded = CsvAdapter::new(out).fetch_bars().unwrap();

        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0], bars[0]);
        assert!(reloaded[1].close.is_nan());
    }

    #[test]
    fn labeled_table_lists_break_rows() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close\n\
             2023-01-01,10,11,5,10\n\
             2023-01-02,9,10,4,9\n\
             2023-01-03,8,9,3,8\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        let analysis = analyze(
            &bars,
            &AnalysisParams {
                range: 1,
                ..AnalysisParams::default()
            },
        );

        let mut out = Vec::new();
        write_labeled(&mut out, &analysis).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("index,timestamp"));
        assert_eq!(lines[1], "2,2023-01-03,8,9,3,8,4,1,-1,true,0,,2");
    }
}
