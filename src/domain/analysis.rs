//! Single-pass structure-break analysis.
//!
//! Pipeline: structure lows -> per-bar classification with anchor tracking ->
//! order-block emission and pruning -> filter to break bars.

use crate::domain::bar::{Bar, BarIndex, LabeledBar};
use crate::domain::classifier::{classify_bar, AnchorTracker, BreakState};
use crate::domain::order_block::{
    Color, ConnectorLine, MitigatedBlock, OrderBlock, OrderBlockBuilder, OrderBlocks,
};
use crate::domain::structure::calculate_structure_lows;
use log::info;

pub const DEFAULT_RANGE: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    /// Structure-low window length.
    pub range: usize,
    pub show_bearish_connectors: bool,
    pub show_bullish_connectors: bool,
    pub bearish_color: Color,
    pub bullish_color: Color,
    pub bearish_line_color: Color,
    pub bullish_line_color: Color,
    pub bearish_line_width: u32,
    pub bullish_line_width: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE,
            show_bearish_connectors: false,
            show_bullish_connectors: false,
            bearish_color: Color::new("red"),
            bullish_color: Color::new("blue"),
            bearish_line_color: Color::new("red"),
            bullish_line_color: Color::new("green"),
            bearish_line_width: 2,
            bullish_line_width: 1,
        }
    }
}

/// Break indices for one break bar: `long_order` is set on bullish bars,
/// `short_order` on bearish ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIndexRow {
    pub index: BarIndex,
    pub long_order: Option<BarIndex>,
    pub short_order: Option<BarIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureBreakAnalysis {
    pub bar_count: usize,
    /// Break bars only, in input order.
    pub breaks: Vec<LabeledBar>,
    pub order_indices: Vec<OrderIndexRow>,
    /// Active bullish blocks after pruning.
    pub bullish_blocks: Vec<OrderBlock>,
    pub bearish_blocks: Vec<OrderBlock>,
    pub mitigated_blocks: Vec<MitigatedBlock>,
    pub lines: Vec<ConnectorLine>,
}

impl StructureBreakAnalysis {
    /// No bar confirmed a break; nothing to render.
    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }

    pub fn bullish_breaks(&self) -> usize {
        self.count(BreakState::Bullish)
    }

    pub fn bearish_breaks(&self) -> usize {
        self.count(BreakState::Bearish)
    }

    fn count(&self, state: BreakState) -> usize {
        self.breaks.iter().filter(|b| b.break_state == state).count()
    }
}

pub fn analyze(bars: &[Bar], params: &AnalysisParams) -> StructureBreakAnalysis {
    let structure = calculate_structure_lows(bars, params.range);

    let mut table: Vec<LabeledBar> = bars
        .iter()
        .cloned()
        .zip(structure)
        .enumerate()
        .map(|(i, (bar, point))| LabeledBar::new(i, bar, point))
        .collect();

    let mut tracker = AnchorTracker::new();
    let mut builder = OrderBlockBuilder::new(params);
    let mut order_indices = Vec::new();

    for i in 0..table.len() {
        builder.prune(i, bars[i].close);

        let state = classify_bar(bars, i);
        table[i].mark(state);

        let anchor = tracker.observe(i, state);
        match state {
            BreakState::Bearish => {
                builder.on_bearish_break(bars, i, anchor, table[i].structure);
                order_indices.push(OrderIndexRow {
                    index: i,
                    long_order: None,
                    short_order: Some(i),
                });
            }
            BreakState::Bullish => {
                builder.on_bullish_break(bars, i, anchor);
                order_indices.push(OrderIndexRow {
                    index: i,
                    long_order: Some(i),
                    short_order: None,
                });
            }
            BreakState::Neutral => {}
        }
    }

    let OrderBlocks {
        bullish,
        bearish,
        mitigated,
        lines,
    } = builder.finish();

    let breaks: Vec<LabeledBar> = table
        .into_iter()
        .filter(|b| b.break_state.is_break())
        .collect();

    let analysis = StructureBreakAnalysis {
        bar_count: bars.len(),
        breaks,
        order_indices,
        bullish_blocks: bullish,
        bearish_blocks: bearish,
        mitigated_blocks: mitigated,
        lines,
    };

    info!(
        "analyzed {} bars (range {}): {} bullish / {} bearish breaks, {} active bullish blocks, {} bearish blocks, {} mitigated, {} lines",
        analysis.bar_count,
        params.range,
        analysis.bullish_breaks(),
        analysis.bearish_breaks(),
        analysis.bullish_blocks.len(),
        analysis.bearish_blocks.len(),
        analysis.mitigated_blocks.len(),
        analysis.lines.len(),
    );

    analysis
}
