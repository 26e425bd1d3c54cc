//! Bar classifier: three-bar structure-break detection.
//!
//! A bar at index i (i >= 2) confirms a break when closes and lows move
//! strictly in one direction across bars i-2, i-1, i:
//!
//! - bearish: close[i] < close[i-1] < close[i-2] and low[i] < low[i-1] < low[i-2]
//! - bullish: close[i] > close[i-1] > close[i-2] and low[i] > low[i-1] > low[i-2]
//!
//! Both tests run on every bar, bearish first; a bullish result overwrites a
//! bearish one. Any comparison involving NaN is false, so bars with missing
//! prices stay neutral.

use crate::domain::bar::{Bar, BarIndex};
use std::fmt;

/// Bars of history needed before a bar can be classified.
pub const LOOKBACK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BreakState {
    Bearish,
    #[default]
    Neutral,
    Bullish,
}

impl BreakState {
    /// -1 bearish, 0 neutral, 1 bullish
    pub fn code(self) -> i8 {
        match self {
            BreakState::Bearish => -1,
            BreakState::Neutral => 0,
            BreakState::Bullish => 1,
        }
    }

    pub fn is_break(self) -> bool {
        self != BreakState::Neutral
    }
}

impl fmt::Display for BreakState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakState::Bearish => write!(f, "bearish"),
            BreakState::Neutral => write!(f, "neutral"),
            BreakState::Bullish => write!(f, "bullish"),
        }
    }
}

pub fn is_bearish_break(bars: &[Bar], i: BarIndex) -> bool {
    if i < LOOKBACK || i >= bars.len() {
        return false;
    }
    let (a, b, c) = (&bars[i - 2], &bars[i - 1], &bars[i]);
    c.close < b.close && b.close < a.close && c.low < b.low && b.low < a.low
}

pub fn is_bullish_break(bars: &[Bar], i: BarIndex) -> bool {
    if i < LOOKBACK || i >= bars.len() {
        return false;
    }
    let (a, b, c) = (&bars[i - 2], &bars[i - 1], &bars[i]);
    c.close > b.close && b.close > a.close && c.low > b.low && b.low > a.low
}

pub fn classify_bar(bars: &[Bar], i: BarIndex) -> BreakState {
    let mut state = BreakState::Neutral;
    if is_bearish_break(bars, i) {
        state = BreakState::Bearish;
    }
    if is_bullish_break(bars, i) {
        state = BreakState::Bullish;
    }
    state
}

/// Running record of the most recent confirmed break in each direction.
///
/// A bearish break anchors its order block on the latest bullish break and
/// vice versa, so the tracker hands back the opposite anchor as it was *before*
/// the current bar is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorTracker {
    last_bullish: Option<BarIndex>,
    last_bearish: Option<BarIndex>,
}

impl AnchorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` at `index`; returns the opposite-direction anchor for a
    /// break, `None` for a neutral bar or when no opposite break has happened yet.
    pub fn observe(&mut self, index: BarIndex, state: BreakState) -> Option<BarIndex> {
        match state {
            BreakState::Bearish => {
                let anchor = self.last_bullish;
                self.last_bearish = Some(index);
                anchor
            }
            BreakState::Bullish => {
                let anchor = self.last_bearish;
                self.last_bullish = Some(index);
                anchor
            }
            BreakState::Neutral => None,
        }
    }

    pub fn last_bullish(&self) -> Option<BarIndex> {
        self.last_bullish
    }

    pub fn last_bearish(&self) -> Option<BarIndex> {
        self.last_bearish
    }
}
