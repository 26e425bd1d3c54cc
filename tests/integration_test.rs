//! Integration tests for the analysis pass.
//!
//! Tests cover:
//! - Known scenarios (short series, alternating breaks, anchor selection)
//! - Property checks over random bar series: structure lows, break
//!   conditions, block geometry, pruning, filtering and repeatability
//! - Sample data flowing through the whole pass

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use structbreak::domain::analysis::{analyze, AnalysisParams, StructureBreakAnalysis};
use structbreak::domain::classifier::{classify_bar, BreakState};
use structbreak::domain::order_block::Side;
use structbreak::domain::sample_data::{generate_sample_bars, SampleConfig};
use structbreak::domain::structure::calculate_structure_lows;

fn params(range: usize) -> AnalysisParams {
    AnalysisParams {
        range,
        show_bearish_connectors: true,
        show_bullish_connectors: true,
        ..AnalysisParams::default()
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn three_falling_bars() {
        let bars = bars_from(&[(10.0, 5.0), (9.0, 4.0), (8.0, 3.0)]);
        let result = analyze(&bars, &params(1));

        assert_eq!(result.bearish_breaks(), 1);
        assert_eq!(result.breaks[0].index, 2);
        // no earlier bullish break, so nothing to anchor on
        assert!(result.bearish_blocks.is_empty());
        assert!(result.lines.is_empty());
    }

    #[test]
    fn one_or_two_bars() {
        for n in [1, 2] {
            let bars = bars_from(&[(10.0, 5.0), (9.0, 4.0)][..n]);
            let result = analyze(&bars, &params(1));
            assert!(result.is_empty());
            assert!(result.bullish_blocks.is_empty());
            assert!(result.bearish_blocks.is_empty());
            assert!(result.lines.is_empty());
        }
    }

    #[test]
    fn zigzag_breaks_and_anchors() {
        let bars = zigzag_bars(2);
        let result = analyze(&bars, &params(3));

        let states: Vec<(usize, BreakState)> = result
            .breaks
            .iter()
            .map(|b| (b.index, b.break_state))
            .collect();
        assert_eq!(
            states,
            vec![
                (2, BreakState::Bullish),
                (4, BreakState::Bearish),
                (5, BreakState::Bearish),
                (7, BreakState::Bullish),
                (8, BreakState::Bullish),
                (10, BreakState::Bearish),
                (11, BreakState::Bearish),
            ]
        );

        let bearish_anchors: Vec<usize> = result.bearish_blocks.iter().map(|b| b.left).collect();
        assert_eq!(bearish_anchors, vec![2, 2, 8, 8]);

        let bullish_anchors: Vec<usize> = result.bullish_blocks.iter().map(|b| b.left).collect();
        assert_eq!(bullish_anchors, vec![5, 5]);
        for block in &result.bullish_blocks {
            assert_eq!(block.side, Side::Bullish);
            assert_relative_eq!(block.top, 9.0);
            assert_relative_eq!(block.bottom, 4.0);
        }
        assert!(result.mitigated_blocks.is_empty());

        // one line per emitted block
        assert_eq!(result.lines.len(), 6);
    }

    #[test]
    fn order_indices_follow_break_direction() {
        let result = analyze(&zigzag_bars(1), &params(2));
        let rows: Vec<(usize, Option<usize>, Option<usize>)> = result
            .order_indices
            .iter()
            .map(|r| (r.index, r.long_order, r.short_order))
            .collect();
        assert_eq!(
            rows,
            vec![(2, Some(2), None), (4, None, Some(4)), (5, None, Some(5))]
        );
    }

    #[test]
    fn last_bull_break_low_only_on_bullish_rows() {
        let result = analyze(&zigzag_bars(1), &params(2));
        for row in &result.breaks {
            match row.break_state {
                BreakState::Bullish => assert_relative_eq!(row.last_bull_break_low, row.bar.low),
                _ => assert_relative_eq!(row.last_bull_break_low, 0.0),
            }
        }
    }

    #[test]
    fn nan_bars_stay_neutral_without_aborting() {
        let mut bars = zigzag_bars(2);
        bars[7].close = f64::NAN;
        let result = analyze(&bars, &params(3));

        // bars 7, 8 and 9 all compare against the NaN close
        assert!(result.breaks.iter().all(|b| ![7, 8, 9].contains(&b.index)));
        assert!(result.breaks.iter().any(|b| b.index == 10));
    }

    #[test]
    fn sample_data_runs_end_to_end() {
        let bars = generate_sample_bars(&SampleConfig::default());
        let result = analyze(&bars, &AnalysisParams::default());

        assert_eq!(result.bar_count, bars.len());
        assert!(result.breaks.len() < bars.len());
        for block in result.bullish_blocks.iter().chain(&result.bearish_blocks) {
            assert!(block.top >= block.bottom);
        }
    }
}

fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(
        (1.0f64..100.0, 0.0f64..10.0, 0.0f64..10.0, 0.0f64..=1.0),
        0..max_len,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (open, up, down, frac))| {
                let high = open + up;
                let low = open - down;
                Bar {
                    timestamp: day(i),
                    open,
                    high,
                    low,
                    close: low + (high - low) * frac,
                }
            })
            .collect()
    })
}

/// Trending closes make breaks frequent enough to exercise the builder.
fn arb_trending_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-3i32..=3, 0.5f64..3.0), 0..max_len).prop_map(|steps| {
        let mut close = 100.0;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (step, wick))| {
                close += step as f64;
                Bar {
                    timestamp: day(i),
                    open: close,
                    high: close + wick,
                    low: close - wick,
                    close,
                }
            })
            .collect()
    })
}

fn check_pruning(bars: &[Bar], result: &StructureBreakAnalysis) -> Result<(), TestCaseError> {
    for m in &result.mitigated_blocks {
        prop_assert!(m.invalidated_at > m.block.created_at);
        prop_assert!(bars[m.invalidated_at].close < m.block.bottom);
        // first bar to close below wins
        for j in m.block.created_at + 1..m.invalidated_at {
            prop_assert!(!(bars[j].close < m.block.bottom));
        }
    }
    for block in &result.bullish_blocks {
        for bar in &bars[block.created_at + 1..] {
            prop_assert!(!(bar.close < block.bottom));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn structure_low_is_window_minimum(bars in arb_bars(60), range in 1usize..20) {
        let lows = calculate_structure_lows(&bars, range);
        prop_assert_eq!(lows.len(), bars.len());

        for (i, value) in lows.iter().enumerate() {
            if i < range {
                prop_assert!(value.is_none());
                continue;
            }
            let window = &bars[i - range..i];
            let min = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let first = window.iter().position(|b| b.low == min).unwrap() + i - range;

            let point = value.unwrap();
            prop_assert_eq!(point.low, min);
            prop_assert_eq!(point.index, first);
        }
    }

    #[test]
    fn break_states_satisfy_their_conditions(bars in arb_trending_bars(80)) {
        let result = analyze(&bars, &params(5));
        for row in &result.breaks {
            let i = row.index;
            prop_assert!(i >= 2);
            let (a, b, c) = (&bars[i - 2], &bars[i - 1], &bars[i]);
            match row.break_state {
                BreakState::Bullish => {
                    prop_assert!(c.close > b.close && b.close > a.close);
                    prop_assert!(c.low > b.low && b.low > a.low);
                }
                BreakState::Bearish => {
                    prop_assert!(c.close < b.close && b.close < a.close);
                    prop_assert!(c.low < b.low && b.low < a.low);
                }
                BreakState::Neutral => prop_assert!(false, "neutral row survived filtering"),
            }
        }
    }

    #[test]
    fn filtered_table_is_exactly_the_break_bars(bars in arb_trending_bars(80)) {
        let result = analyze(&bars, &params(4));
        let expected: Vec<usize> = (0..bars.len())
            .filter(|&i| classify_bar(&bars, i).is_break())
            .collect();
        let got: Vec<usize> = result.breaks.iter().map(|b| b.index).collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(result.order_indices.len(), result.breaks.len());
    }

    #[test]
    fn every_block_has_top_above_bottom(bars in arb_bars(80), range in 1usize..10) {
        let result = analyze(&bars, &params(range));
        let all = result
            .bullish_blocks
            .iter()
            .chain(&result.bearish_blocks)
            .chain(result.mitigated_blocks.iter().map(|m| &m.block));
        for block in all {
            prop_assert!(block.top >= block.bottom);
            prop_assert_eq!(block.left, block.right);
            prop_assert!(block.left < block.created_at);
        }
    }

    #[test]
    fn invalidated_blocks_stay_gone(bars in arb_trending_bars(120)) {
        let result = analyze(&bars, &params(3));
        check_pruning(&bars, &result)?;
    }

    #[test]
    fn repeated_runs_match(bars in arb_trending_bars(60), range in 1usize..10) {
        let p = params(range);
        prop_assert_eq!(analyze(&bars, &p), analyze(&bars, &p));
    }
}
