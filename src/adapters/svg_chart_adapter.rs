//! SVG rendering of break bars, order blocks and connector lines.

use crate::domain::analysis::StructureBreakAnalysis;
use crate::domain::bar::BarIndex;
use crate::domain::classifier::BreakState;
use crate::domain::error::StructbreakError;
use crate::domain::order_block::{Color, OrderBlock};
use crate::ports::annotation_port::AnnotationPort;
use log::debug;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const PADDING: f64 = 40.0;

#[derive(Debug)]
pub struct SvgChartAdapter {
    pub width: u32,
    pub height: u32,
    pub bearish_color: Color,
    pub bullish_color: Color,
}

impl Default for SvgChartAdapter {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            bearish_color: Color::new("red"),
            bullish_color: Color::new("blue"),
        }
    }
}

struct Scale {
    min_price: f64,
    scale_x: f64,
    scale_y: f64,
    height: f64,
}

impl Scale {
    fn x(&self, index: BarIndex) -> f64 {
        PADDING + index as f64 * self.scale_x
    }

    fn y(&self, price: f64) -> f64 {
        self.height - PADDING - (price - self.min_price) * self.scale_y
    }
}

impl SvgChartAdapter {
    pub fn format_chart(&self, analysis: &StructureBreakAnalysis) -> String {
        let width = self.width as f64;
        let height = self.height as f64;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
            width, height, width, height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        let Some((min_price, max_price)) = price_range(analysis) else {
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">No structure breaks detected.</text>"#,
                width / 2.0,
                height / 2.0
            );
            svg.push_str("</svg>\n");
            return svg;
        };

        let plot_width = width - 2.0 * PADDING;
        let plot_height = height - 2.0 * PADDING;
        let range = max_price - min_price;
        let scale = Scale {
            min_price,
            scale_x: if analysis.bar_count > 1 {
                plot_width / (analysis.bar_count - 1) as f64
            } else {
                0.0
            },
            scale_y: if range > 0.0 {
                plot_height / range
            } else {
                1.0
            },
            height,
        };

        // axes
        let _ = writeln!(
            svg,
            r#"<line x1="{p:.1}" y1="{p:.1}" x2="{p:.1}" y2="{b:.1}" stroke="black"/>"#,
            p = PADDING,
            b = height - PADDING
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{p:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="black"/>"#,
            p = PADDING,
            b = height - PADDING,
            r = width - PADDING
        );

        for m in &analysis.mitigated_blocks {
            self.push_block(&mut svg, &scale, &m.block, true);
        }
        for block in analysis.bearish_blocks.iter().chain(&analysis.bullish_blocks) {
            self.push_block(&mut svg, &scale, block, false);
        }

        // close path through break bars, each segment colored by the bar it reaches
        let points: Vec<(f64, f64, BreakState)> = analysis
            .breaks
            .iter()
            .filter(|b| b.bar.close.is_finite())
            .map(|b| (scale.x(b.index), scale.y(b.bar.close), b.break_state))
            .collect();
        for pair in points.windows(2) {
            let (x0, y0, _) = pair[0];
            let (x1, y1, state) = pair[1];
            let _ = writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="1"/>"#,
                x0,
                y0,
                x1,
                y1,
                escape(self.state_color(state).as_str())
            );
        }
        for (x, y, state) in &points {
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="2" fill="{}"/>"#,
                x,
                y,
                escape(self.state_color(*state).as_str())
            );
        }

        for line in &analysis.lines {
            let _ = writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{}"/>"#,
                scale.x(line.x0),
                scale.y(line.y0),
                scale.x(line.x1),
                scale.y(line.y1),
                escape(line.color.as_str()),
                line.width
            );
        }

        svg.push_str("</svg>\n");
        svg
    }

    fn state_color(&self, state: BreakState) -> &Color {
        match state {
            BreakState::Bullish => &self.bullish_color,
            _ => &self.bearish_color,
        }
    }

    fn push_block(&self, svg: &mut String, scale: &Scale, block: &OrderBlock, mitigated: bool) {
        let half = (scale.scale_x / 2.0).max(1.0);
        let x = scale.x(block.left) - half;
        let w = scale.x(block.right) + half - x;
        let y = scale.y(block.top);
        let h = (scale.y(block.bottom) - y).max(1.0);
        let color = escape(block.color.as_str());
        if mitigated {
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="{}" stroke-dasharray="3,2" opacity="0.5"/>"#,
                x, y, w, h, color
            );
        } else {
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.3"/>"#,
                x, y, w, h, color
            );
        }
    }
}

impl AnnotationPort for SvgChartAdapter {
    fn render(
        &self,
        analysis: &StructureBreakAnalysis,
        output_path: &Path,
    ) -> Result<(), StructbreakError> {
        let svg = self.format_chart(analysis);
        fs::write(output_path, svg).map_err(|e| StructbreakError::Render {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })?;
        debug!("chart written to {}", output_path.display());
        Ok(())
    }
}

/// Min and max over every plotted price; `None` when nothing is plottable.
fn price_range(analysis: &StructureBreakAnalysis) -> Option<(f64, f64)> {
    let closes = analysis.breaks.iter().map(|b| b.bar.close);
    let line_ys = analysis.lines.iter().flat_map(|l| [l.y0, l.y1]);
    let block_edges = analysis
        .bullish_blocks
        .iter()
        .chain(&analysis.bearish_blocks)
        .chain(analysis.mitigated_blocks.iter().map(|m| &m.block))
        .flat_map(|b| [b.top, b.bottom]);

    let (min, max) = closes
        .chain(line_ys)
        .chain(block_edges)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
