//! Rasterization of a sheet region into an RGBA canvas

use crate::config::RenderConfig;
use crate::error::{ExportError, Result};
use crate::range::CellRange;
use crate::reader::Sheet;
use image::{Rgba, RgbaImage};
use tracing::debug;

pub mod format;
pub mod layout;
pub mod text;

pub use format::{Align, CellText, display_value};
pub use layout::{Layout, Rect, Track};

/// One drawn cell, or the visible part of a merged block
#[derive(Debug, Clone, PartialEq)]
struct Block {
    rect: Rect,
    /// Cell whose value the block shows
    anchor: (u32, u32),
}

/// Render `range` of `sheet` into a new image
pub fn rasterize(sheet: &Sheet, range: &CellRange, config: &RenderConfig) -> Result<RgbaImage> {
    let layout = Layout::compute(sheet, range, config)?;
    if layout.is_empty() {
        return Err(ExportError::EmptyRange(range.to_string()));
    }

    debug!(
        "rasterizing {}x{} px for {} ({} columns, {} rows visible)",
        layout.width,
        layout.height,
        range,
        layout.columns.len(),
        layout.rows.len()
    );

    let background = config.background.to_rgba();
    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, background);
    for block in blocks(sheet, range, &layout) {
        if config.gridlines {
            draw_outline(&mut canvas, block.rect, config.gridline_color.to_rgba());
        }
        draw_cell_text(&mut canvas, sheet, &block, config);
    }

    Ok(canvas)
}

fn blocks(sheet: &Sheet, range: &CellRange, layout: &Layout) -> Vec<Block> {
    let mut blocks = Vec::new();

    for row in &layout.rows {
        for col in &layout.columns {
            let merged = sheet
                .merged_at(row.index, col.index)
                .and_then(|m| m.intersect(range).map(|visible| (m.start, visible)));

            match merged {
                Some((anchor, visible)) => {
                    let Some((rect, first)) = layout.area_rect(&visible) else {
                        continue;
                    };
                    // Emit the block once, from its top-left visible cell
                    if first == (row.index, col.index) {
                        blocks.push(Block { rect, anchor });
                    }
                }
                None => blocks.push(Block {
                    rect: Rect {
                        x: col.offset,
                        y: row.offset,
                        width: col.size,
                        height: row.size,
                    },
                    anchor: (row.index, col.index),
                }),
            }
        }
    }

    blocks
}

fn draw_outline(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let right = rect.x.saturating_add(rect.width).min(canvas.width().saturating_sub(1));
    let bottom = rect.y.saturating_add(rect.height).min(canvas.height().saturating_sub(1));

    for x in rect.x..=right {
        canvas.put_pixel(x, rect.y, color);
        canvas.put_pixel(x, bottom, color);
    }
    for y in rect.y..=bottom {
        canvas.put_pixel(rect.x, y, color);
        canvas.put_pixel(right, y, color);
    }
}

fn draw_cell_text(canvas: &mut RgbaImage, sheet: &Sheet, block: &Block, config: &RenderConfig) {
    let Some(cell) = sheet.get_cell(block.anchor.0, block.anchor.1) else {
        return;
    };
    let Some(cell_text) = display_value(&cell.value, cell.num_fmt.as_deref()) else {
        return;
    };

    let scale = config.scale;
    let rect = block.rect;
    // Interior excludes the gridline on the top/left edge
    let clip = Rect {
        x: rect.x + 1,
        y: rect.y + 1,
        width: rect.width.saturating_sub(1),
        height: rect.height.saturating_sub(1),
    };
    let padding = config.cell_padding.saturating_mul(scale);
    let available = clip.width.saturating_sub(padding.saturating_mul(2));

    let align = cell_text.align;
    let color = if cell_text.error {
        config.error_color.to_rgba()
    } else {
        config.text_color.to_rgba()
    };
    let content = fit_content(cell_text, available, scale);
    let width = i64::from(text::text_width(&content, scale));

    let left = i64::from(clip.x);
    let x = match align {
        Align::Left => left + i64::from(padding),
        Align::Right => left + i64::from(clip.width) - i64::from(padding) - width,
        Align::Center => left + (i64::from(clip.width) - width) / 2,
    };
    let glyph_height = i64::from(text::GLYPH_SIZE.saturating_mul(scale));
    let y = i64::from(clip.y) + (i64::from(clip.height) - glyph_height) / 2;

    text::draw_text(canvas, &content, x, y, clip, color, scale);
}

/// Numbers and dates that do not fit `available` pixels become `#` fill;
/// text is left to the clip.
fn fit_content(cell_text: CellText, available: u32, scale: u32) -> String {
    if !cell_text.numeric || text::text_width(&cell_text.text, scale) <= available {
        return cell_text.text;
    }
    let glyph_width = text::GLYPH_SIZE.saturating_mul(scale).max(1);
    let fill = (available / glyph_width).max(1) as usize;
    "#".repeat(fill)
}
