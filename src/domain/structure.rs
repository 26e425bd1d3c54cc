//! Rolling structure-low extractor.
//!
//! For bar i, the structure low is the minimum low over the `range` bars
//! immediately before it, `[i - range, i - 1]`, together with the index where
//! that minimum occurs (earliest index on ties). The current bar is excluded.
//! Warmup: the first `range` bars have no value.

use crate::domain::bar::{Bar, BarIndex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructurePoint {
    pub low: f64,
    pub index: BarIndex,
}

pub fn calculate_structure_lows(bars: &[Bar], range: usize) -> Vec<Option<StructurePoint>> {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let value = if range > 0 && i >= range {
            window_min(&bars[i - range..i], i - range)
        } else {
            None
        };
        values.push(value);
    }

    values
}

/// Minimum low of `window`, whose first bar sits at `offset`. A window holding
/// a non-finite low has no minimum.
fn window_min(window: &[Bar], offset: BarIndex) -> Option<StructurePoint> {
    let mut best: Option<StructurePoint> = None;
    for (j, bar) in window.iter().enumerate() {
        if !bar.low.is_finite() {
            return None;
        }
        match best {
            Some(p) if bar.low >= p.low => {}
            _ => {
                best = Some(StructurePoint {
                    low: bar.low,
                    index: offset + j,
                })
            }
        }
    }
    best
}
