//! Order-block builder.
//!
//! Every confirmed break emits a box over the most recent opposite-direction
//! break bar, plus an optional connector line:
//!
//! - bearish break at i, anchor = last bullish break: box spans the anchor's
//!   high..low; the line runs along the structure low from its index to i.
//! - bullish break at i, anchor = last bearish break: box spans the anchor's
//!   close..low; the line runs along the anchor close from the anchor to i.
//!
//! Active bullish boxes are pruned when a later close falls below their bottom.
//! Bearish boxes are never pruned.

use crate::domain::analysis::AnalysisParams;
use crate::domain::bar::{Bar, BarIndex};
use crate::domain::structure::StructurePoint;
use log::{debug, warn};
use std::fmt;

/// Opaque color token handed through to the annotation sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub String);

impl Color {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBlock {
    pub side: Side,
    pub left: BarIndex,
    pub right: BarIndex,
    pub top: f64,
    pub bottom: f64,
    pub color: Color,
    /// Bar whose break produced this block.
    pub created_at: BarIndex,
}

/// A bullish block removed from the active list, with the bar that closed below it.
#[derive(Debug, Clone, PartialEq)]
pub struct MitigatedBlock {
    pub block: OrderBlock,
    pub invalidated_at: BarIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorLine {
    pub x0: BarIndex,
    pub y0: f64,
    pub x1: BarIndex,
    pub y1: f64,
    pub color: Color,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderBlocks {
    pub bullish: Vec<OrderBlock>,
    pub bearish: Vec<OrderBlock>,
    pub mitigated: Vec<MitigatedBlock>,
    pub lines: Vec<ConnectorLine>,
}

/// Owns the box and line lists for the duration of one pass.
pub struct OrderBlockBuilder<'a> {
    params: &'a AnalysisParams,
    blocks: OrderBlocks,
}

impl<'a> OrderBlockBuilder<'a> {
    pub fn new(params: &'a AnalysisParams) -> Self {
        Self {
            params,
            blocks: OrderBlocks::default(),
        }
    }

    /// Drop every active bullish block whose bottom is above `close`,
    /// scanning the most recently added first.
    pub fn prune(&mut self, index: BarIndex, close: f64) {
        let active = &mut self.blocks.bullish;
        for j in (0..active.len()).rev() {
            if active[j].bottom > close {
                let block = active.remove(j);
                debug!(
                    "bar {}: close {} invalidated bullish block from bar {} (bottom {})",
                    index, close, block.left, block.bottom
                );
                self.blocks.mitigated.push(MitigatedBlock {
                    block,
                    invalidated_at: index,
                });
            }
        }
    }

    pub fn on_bearish_break(
        &mut self,
        bars: &[Bar],
        index: BarIndex,
        anchor: Option<BarIndex>,
        structure: Option<StructurePoint>,
    ) {
        let Some(anchor) = anchor else {
            debug!("bar {}: bearish break without a bullish anchor, no block", index);
            return;
        };
        let Some(anchor_bar) = bars.get(anchor) else {
            warn!("bar {}: bearish anchor {} is out of range", index, anchor);
            return;
        };
        let Some(block) = make_block(
            Side::Bearish,
            anchor,
            anchor_bar.high,
            anchor_bar.low,
            &self.params.bearish_color,
            index,
        ) else {
            return;
        };
        debug!(
            "bar {}: bearish block at {} [{} .. {}]",
            index, anchor, block.bottom, block.top
        );
        self.blocks.bearish.push(block);

        if self.params.show_bearish_connectors {
            match structure {
                Some(p) => self.blocks.lines.push(ConnectorLine {
                    x0: p.index,
                    y0: p.low,
                    x1: index,
                    y1: p.low,
                    color: self.params.bearish_line_color.clone(),
                    width: self.params.bearish_line_width,
                }),
                None => debug!("bar {}: no structure low yet, bearish connector skipped", index),
            }
        }
    }

    pub fn on_bullish_break(&mut self, bars: &[Bar], index: BarIndex, anchor: Option<BarIndex>) {
        let Some(anchor) = anchor else {
            debug!("bar {}: bullish break without a bearish anchor, no block", index);
            return;
        };
        let Some(anchor_bar) = bars.get(anchor) else {
            warn!("bar {}: bullish anchor {} is out of range", index, anchor);
            return;
        };
        let Some(block) = make_block(
            Side::Bullish,
            anchor,
            anchor_bar.close,
            anchor_bar.low,
            &self.params.bullish_color,
            index,
        ) else {
            return;
        };
        debug!(
            "bar {}: bullish block at {} [{} .. {}]",
            index, anchor, block.bottom, block.top
        );
        let top = block.top;
        self.blocks.bullish.push(block);

        if self.params.show_bullish_connectors {
            self.blocks.lines.push(ConnectorLine {
                x0: anchor,
                y0: top,
                x1: index,
                y1: top,
                color: self.params.bullish_line_color.clone(),
                width: self.params.bullish_line_width,
            });
        }
    }

    pub fn finish(self) -> OrderBlocks {
        self.blocks
    }
}

fn make_block(
    side: Side,
    anchor: BarIndex,
    top: f64,
    bottom: f64,
    color: &Color,
    created_at: BarIndex,
) -> Option<OrderBlock> {
    if !top.is_finite() || !bottom.is_finite() {
        warn!(
            "bar {}: anchor {} has missing prices, {:?} block skipped",
            created_at, anchor, side
        );
        return None;
    }
    if top < bottom {
        warn!(
            "bar {}: anchor {} top {} below bottom {}, {:?} block skipped",
            created_at, anchor, top, bottom, side
        );
        return None;
    }
    Some(OrderBlock {
        side,
        left: anchor,
        right: anchor,
        top,
        bottom,
        color: color.clone(),
        created_at,
    })
}
