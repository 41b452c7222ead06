//! Headless box/text layout engine used in place of a browser DOM.
//!
//! The measurer hands the engine presentational blocks at the true print
//! column width; the engine word-wraps each block greedily with the family's
//! glyph tables and reports the block's height in px (lines × line-height +
//! bottom margin). The engine is a trait so a different backend (a real shaping
//! engine, a headless browser) can sit behind the same measurement contract.

use thiserror::Error;

use crate::pagination::font_metrics::{metrics_for, FontFamily, FontMetrics};
use crate::pagination::markup::{Block, ITEM_GAP_PX};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("measure surface has zero width ({width}px)")]
    ZeroWidthContainer { width: f32 },

    #[error("block indent {indent}px leaves no room in a {width}px column")]
    NoInlineSpace { indent: f32, width: f32 },
}

/// Synchronous layout backend. Runs inside the measurer's blocking layout pass.
pub trait LayoutEngine: Send + Sync {
    /// Height of a single block in px when laid out in a column `width` px wide.
    fn block_height(&self, block: &Block, width: f32) -> Result<f32, LayoutError>;

    /// Height of a block stack (title, entry, header) in px.
    fn stack_height(&self, blocks: &[Block], width: f32) -> Result<f32, LayoutError> {
        blocks.iter().map(|b| self.block_height(b, width)).sum()
    }

    /// Height of one list entry, including the gap below it.
    fn item_height(&self, blocks: &[Block], width: f32) -> Result<f32, LayoutError> {
        Ok(self.stack_height(blocks, width)? + ITEM_GAP_PX)
    }
}

/// Default engine: greedy word wrap over static glyph-advance tables.
pub struct MetricLayoutEngine {
    metrics: &'static FontMetrics,
}

impl MetricLayoutEngine {
    pub fn new(family: FontFamily) -> Self {
        Self {
            metrics: metrics_for(family),
        }
    }
}

impl LayoutEngine for MetricLayoutEngine {
    fn block_height(&self, block: &Block, width: f32) -> Result<f32, LayoutError> {
        if width <= 0.0 {
            return Err(LayoutError::ZeroWidthContainer { width });
        }
        let style = block.kind.style();
        let inline = width - style.indent;
        if inline <= 0.0 {
            return Err(LayoutError::NoInlineSpace {
                indent: style.indent,
                width,
            });
        }
        let lines = wrap_lines(&block.text, self.metrics, style.font_size, style.bold, inline);
        Ok(lines as f32 * style.line_height + style.border_bottom + style.margin_bottom)
    }
}

/// Greedy word wrap. Returns the number of lines `text` occupies at `max_width`.
///
/// A word wider than the whole line is placed on its own line and overflows it,
/// matching `overflow-wrap: normal`. Empty text occupies no lines.
pub fn wrap_lines(
    text: &str,
    metrics: &FontMetrics,
    font_size: f32,
    bold: bool,
    max_width: f32,
) -> usize {
    let space_w = metrics.space_width(font_size, bold);
    let mut lines = 0usize;
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_w = metrics.measure(word, font_size, bold);
        if lines == 0 {
            lines = 1;
            current_width = word_w;
        } else if current_width + space_w + word_w > max_width {
            lines += 1;
            current_width = word_w;
        } else {
            current_width += space_w + word_w;
        }
    }
    lines
}
