#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::process::ExitCode;
pub use structbreak::domain::bar::Bar;
use structbreak::domain::analysis::StructureBreakAnalysis;
use structbreak::domain::error::StructbreakError;
use structbreak::ports::annotation_port::AnnotationPort;
use structbreak::ports::data_port::DataPort;

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, StructbreakError> {
        match &self.error {
            Some(reason) => Err(StructbreakError::Data {
                reason: reason.clone(),
            }),
            None => Ok(self.bars.clone()),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// Records every analysis it is asked to render.
#[derive(Default)]
pub struct RecordingSink {
    pub rendered: RefCell<Vec<StructureBreakAnalysis>>,
}

impl AnnotationPort for RecordingSink {
    fn render(
        &self,
        analysis: &StructureBreakAnalysis,
        _output_path: &std::path::Path,
    ) -> Result<(), StructbreakError> {
        self.rendered.borrow_mut().push(analysis.clone());
        Ok(())
    }
}

pub fn day(n: usize) -> NaiveDateTime {
    (NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(n as i64))
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Bars from (close, low) pairs; open = close, high = close + 1.
pub fn bars_from(rows: &[(f64, f64)]) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(close, low))| Bar {
            timestamp: day(i),
            open: close,
            high: close + 1.0,
            low,
            close,
        })
        .collect()
}

/// Up three bars, down three bars, repeated: alternating bullish and bearish breaks.
pub fn zigzag_bars(cycles: usize) -> Vec<Bar> {
    let mut rows = Vec::new();
    for _ in 0..cycles {
        rows.extend_from_slice(&[
            (10.0, 5.0),
            (11.0, 6.0),
            (12.0, 7.0),
            (11.0, 6.0),
            (10.0, 5.0),
            (9.0, 4.0),
        ]);
    }
    bars_from(&rows)
}

pub fn exit_report(code: ExitCode) -> String {
    format!("{code:?}")
}
