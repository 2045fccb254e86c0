//! Worksheet data structures

use crate::range::CellRange;
use std::collections::{HashMap, HashSet};

/// A worksheet with the values and geometry needed for rendering
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), Cell>,
    /// Hidden column indices (0-based)
    pub hidden_columns: HashSet<u32>,
    /// Hidden row indices (0-based)
    pub hidden_rows: HashSet<u32>,
    pub merged_cells: Vec<CellRange>,
    /// Column widths as stored in the file, in character units that
    /// already include cell padding
    pub column_widths: HashMap<u32, f64>,
    /// Explicit row heights in points
    pub row_heights: HashMap<u32, f64>,
    /// Stored sheet-level default column width, overriding the render default
    pub default_column_width: Option<f64>,
    /// Sheet-level default row height, overriding the render default
    pub default_row_height: Option<f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get a cell at the given position
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Insert or replace a cell value
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert(
            (row, col),
            Cell {
                row,
                col,
                value,
                num_fmt: None,
            },
        );
    }

    /// Bounding box of all non-empty cells, widened to cover any merged
    /// block that starts inside it
    pub fn data_bounds(&self) -> Option<CellRange> {
        let mut non_empty = self.cells.values().filter(|c| !c.value.is_empty());
        let first = non_empty.next()?;

        let (mut min_row, mut min_col) = (first.row, first.col);
        let (mut max_row, mut max_col) = (first.row, first.col);
        for cell in non_empty {
            min_row = min_row.min(cell.row);
            min_col = min_col.min(cell.col);
            max_row = max_row.max(cell.row);
            max_col = max_col.max(cell.col);
        }

        let mut bounds = CellRange::new((min_row, min_col), (max_row, max_col));
        for merged in &self.merged_cells {
            if bounds.contains(merged.start.0, merged.start.1) {
                bounds.end.0 = bounds.end.0.max(merged.end.0);
                bounds.end.1 = bounds.end.1.max(merged.end.1);
            }
        }
        Some(bounds)
    }

    /// Merged block covering the given cell, if any
    pub fn merged_at(&self, row: u32, col: u32) -> Option<&CellRange> {
        self.merged_cells.iter().find(|m| m.contains(row, col))
    }

    pub fn is_column_hidden(&self, col: u32) -> bool {
        self.hidden_columns.contains(&col)
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains(&row)
    }
}

/// Represents a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    pub num_fmt: Option<String>,
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    /// Date/time already rendered as ISO text
    DateTime(String),
    Text(String),
    Boolean(bool),
    /// Excel error code such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}
