//! OHLC bar representation and the labeled bar table.

use crate::domain::classifier::BreakState;
use crate::domain::structure::StructurePoint;
use chrono::NaiveDateTime;

/// Position of a bar in the input sequence (0-based, contiguous).
pub type BarIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// True when every price field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// A bar together with the columns derived by the analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBar {
    pub index: BarIndex,
    pub bar: Bar,
    pub structure: Option<StructurePoint>,
    pub break_state: BreakState,
    pub is_break_candle: bool,
    /// Low of this bar when it confirms a bullish break, otherwise 0.
    pub last_bull_break_low: f64,
}

impl LabeledBar {
    pub fn new(index: BarIndex, bar: Bar, structure: Option<StructurePoint>) -> Self {
        Self {
            index,
            bar,
            structure,
            break_state: BreakState::Neutral,
            is_break_candle: false,
            last_bull_break_low: 0.0,
        }
    }

    /// Record the classification result for this bar.
    pub fn mark(&mut self, state: BreakState) {
        self.break_state = state;
        self.is_break_candle = state != BreakState::Neutral;
        self.last_bull_break_low = if state == BreakState::Bullish {
            self.bar.low
        } else {
            0.0
        };
    }
}
