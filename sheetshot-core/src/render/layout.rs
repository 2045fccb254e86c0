//! Pixel geometry of a sheet region

use crate::config::RenderConfig;
use crate::error::{ExportError, Result};
use crate::range::CellRange;
use crate::reader::Sheet;

/// Widest column Excel allows, in character units
pub const MAX_COLUMN_WIDTH: f64 = 255.0;
/// Tallest row Excel allows, in points
pub const MAX_ROW_HEIGHT: f64 = 409.0;

/// A visible row or column and its pixel extent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    /// Sheet row/column index (0-based)
    pub index: u32,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Visible columns and rows of a range, laid out left-to-right and top-to-bottom
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub columns: Vec<Track>,
    pub rows: Vec<Track>,
    /// Canvas width, including the closing gridline
    pub width: u32,
    /// Canvas height, including the closing gridline
    pub height: u32,
}

impl Layout {
    /// Lay out `range`, failing with `ImageTooLarge` when the canvas would
    /// exceed `config.max_pixels` or a `u32` dimension.
    pub fn compute(sheet: &Sheet, range: &CellRange, config: &RenderConfig) -> Result<Self> {
        let default_width = match sheet.default_column_width {
            Some(stored) => stored_width_px(stored),
            None => column_width_px(config.default_column_width),
        };
        let default_height = sheet
            .default_row_height
            .unwrap_or(config.default_row_height);

        let columns = visible_sizes(range.start.1..=range.end.1, |col| {
            if sheet.is_column_hidden(col) {
                return 0;
            }
            let width = match sheet.column_widths.get(&col) {
                Some(stored) => stored_width_px(*stored),
                None => default_width,
            };
            width.saturating_mul(config.scale)
        });
        let rows = visible_sizes(range.start.0..=range.end.0, |row| {
            if sheet.is_row_hidden(row) {
                return 0;
            }
            let height = sheet.row_heights.get(&row).copied().unwrap_or(default_height);
            row_height_px(height).saturating_mul(config.scale)
        });

        let width = extent(&columns);
        let height = extent(&rows);
        let too_large = width > u64::from(u32::MAX)
            || height > u64::from(u32::MAX)
            || width.saturating_mul(height) > config.max_pixels;
        if too_large {
            return Err(ExportError::ImageTooLarge {
                width,
                height,
                limit: config.max_pixels,
            });
        }

        Ok(Self {
            columns: place(&columns),
            rows: place(&rows),
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Pixel rectangle covering the visible part of `area`, plus the
    /// top-left visible (row, col) it starts at
    pub fn area_rect(&self, area: &CellRange) -> Option<(Rect, (u32, u32))> {
        let (first_col, x, width) = span(&self.columns, area.start.1, area.end.1)?;
        let (first_row, y, height) = span(&self.rows, area.start.0, area.end.0)?;
        Some((
            Rect {
                x,
                y,
                width,
                height,
            },
            (first_row, first_col),
        ))
    }
}

/// Excel column width (character units) to pixels at 96 DPI
pub fn column_width_px(chars: f64) -> u32 {
    if chars.is_nan() || chars <= 0.0 {
        return 0;
    }
    (chars.min(MAX_COLUMN_WIDTH) * 7.0 + 5.0).round() as u32
}

/// Width stored in a worksheet part (padding included) to pixels
pub fn stored_width_px(width: f64) -> u32 {
    if width.is_nan() || width <= 0.0 {
        return 0;
    }
    (width.min(MAX_COLUMN_WIDTH) * 7.0).round() as u32
}

/// Row height (points) to pixels at 96 DPI
pub fn row_height_px(points: f64) -> u32 {
    if points.is_nan() || points <= 0.0 {
        return 0;
    }
    (points.min(MAX_ROW_HEIGHT) * 96.0 / 72.0).round() as u32
}

/// (index, size) of every track with a non-zero size
fn visible_sizes(
    indices: impl Iterator<Item = u32>,
    size_of: impl Fn(u32) -> u32,
) -> Vec<(u32, u32)> {
    indices
        .map(|index| (index, size_of(index)))
        .filter(|(_, size)| *size > 0)
        .collect()
}

/// Total pixel extent plus the closing gridline
fn extent(sizes: &[(u32, u32)]) -> u64 {
    sizes.iter().map(|(_, size)| u64::from(*size)).sum::<u64>() + 1
}

// Callers check `extent` first, so offsets fit in u32
fn place(sizes: &[(u32, u32)]) -> Vec<Track> {
    let mut offset = 0;
    let mut result = Vec::with_capacity(sizes.len());
    for &(index, size) in sizes {
        result.push(Track {
            index,
            offset,
            size,
        });
        offset += size;
    }
    result
}

/// (first index, offset, size) of the visible tracks within `first..=last`
fn span(tracks: &[Track], first: u32, last: u32) -> Option<(u32, u32, u32)> {
    let start = tracks.partition_point(|t| t.index < first);
    let end = tracks.partition_point(|t| t.index <= last);
    if start >= end {
        return None;
    }
    let head = tracks[start];
    let tail = tracks[end - 1];
    Some((head.index, head.offset, tail.offset + tail.size - head.offset))
}
