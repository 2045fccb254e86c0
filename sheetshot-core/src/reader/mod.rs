//! Excel/ODS file reader using calamine

use crate::error::{ExportError, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

pub mod workbook;
pub mod xml_parser;

pub use workbook::{Cell, CellValue, Sheet};

/// An open workbook that loads worksheets on demand
pub struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
    /// Raw package for XLSX/XLSM, used for geometry that calamine does not expose
    archive: Option<ZipArchive<BufReader<File>>>,
    styles: Option<Vec<String>>,
}

impl Workbook {
    /// Open a workbook in any format calamine supports
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let sheets = open_workbook_auto(path).map_err(|source| ExportError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

        let archive = if is_open_xml(path) {
            let file = File::open(path)?;
            match ZipArchive::new(BufReader::new(file)) {
                Ok(archive) => Some(archive),
                Err(e) => {
                    warn!("cannot read package of {}: {}", path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        debug!(
            "opened {} ({} sheets)",
            path.display(),
            sheets.sheet_names().len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
            archive,
            styles: None,
        })
    }

    /// Get all sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Defined names as (name, reference) pairs
    pub fn defined_names(&self) -> Vec<(String, String)> {
        self.sheets.defined_names().to_vec()
    }

    /// Match a sheet name exactly, then case-insensitively as Excel does
    pub fn find_sheet(&self, name: &str) -> Option<String> {
        let names = self.sheet_names();
        if let Some(exact) = names.iter().find(|n| n.as_str() == name) {
            return Some(exact.clone());
        }
        names.into_iter().find(|n| n.to_lowercase() == name.to_lowercase())
    }

    /// Load values and geometry of one worksheet
    pub fn read_sheet(&mut self, name: &str) -> Result<Sheet> {
        let Some(sheet_name) = self.find_sheet(name) else {
            return Err(ExportError::SheetNotFound {
                sheet: name.to_string(),
                available: self.sheet_names(),
            });
        };

        let range = self
            .sheets
            .worksheet_range(&sheet_name)
            .map_err(|source| ExportError::Workbook {
                path: self.path.clone(),
                source,
            })?;

        let mut sheet = parse_sheet(&sheet_name, &range);
        self.apply_layout(&mut sheet);
        Ok(sheet)
    }

    /// Merge XLSX geometry and number formats into the sheet. Failures only
    /// cost fidelity, so they are logged and skipped.
    fn apply_layout(&mut self, sheet: &mut Sheet) {
        let Some(archive) = self.archive.as_mut() else {
            return;
        };

        let part = match xml_parser::resolve_sheet_part(archive, &sheet.name) {
            Ok(Some(part)) => part,
            Ok(None) => {
                warn!("no worksheet part found for '{}'", sheet.name);
                return;
            }
            Err(e) => {
                warn!("cannot resolve worksheet part for '{}': {}", sheet.name, e);
                return;
            }
        };

        let layout = match xml_parser::extract_sheet_layout(archive, &part) {
            Ok(layout) => layout,
            Err(e) => {
                warn!("cannot read layout of '{}': {}", sheet.name, e);
                return;
            }
        };

        if self.styles.is_none() {
            self.styles = Some(xml_parser::parse_styles(archive).unwrap_or_else(|e| {
                warn!("cannot read styles: {}", e);
                Vec::new()
            }));
        }
        let styles = self.styles.as_deref().unwrap_or_default();

        for ((row, col), style_idx) in &layout.cell_styles {
            let fmt = styles.get(*style_idx);
            let cell = sheet.cells.get_mut(&(*row, *col));
            if let (Some(fmt), Some(cell)) = (fmt, cell) {
                if fmt != "General" {
                    cell.num_fmt = Some(fmt.clone());
                }
            }
        }

        debug!(
            "layout for '{}': {} widths, {} heights, {} merged, {} hidden rows, {} hidden columns",
            sheet.name,
            layout.column_widths.len(),
            layout.row_heights.len(),
            layout.merged_cells.len(),
            layout.hidden_rows.len(),
            layout.hidden_columns.len()
        );

        sheet.column_widths = layout.column_widths;
        sheet.row_heights = layout.row_heights;
        sheet.hidden_columns = layout.hidden_columns;
        sheet.hidden_rows = layout.hidden_rows;
        sheet.merged_cells = layout.merged_cells;
        sheet.default_column_width = layout.default_column_width;
        sheet.default_row_height = layout.default_row_height;
    }
}

/// List the sheet names of a workbook file
pub fn list_sheets<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    Ok(Workbook::open(path)?.sheet_names())
}

fn is_open_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"))
        .unwrap_or(false)
}

fn parse_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);

    let Some(start) = range.start() else {
        return sheet;
    };

    for (rel_row, rel_col, data) in range.used_cells() {
        let value = parse_cell_value(data);
        if value.is_empty() {
            continue;
        }
        let row = start.0 + rel_row as u32;
        let col = start.1 + rel_col as u32;
        sheet.set_value(row, col, value);
    }

    sheet
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if dt.is_datetime() => {
                let pattern = if dt.as_f64().fract() == 0.0 {
                    "%Y-%m-%d"
                } else {
                    "%Y-%m-%d %H:%M:%S"
                };
                CellValue::DateTime(datetime.format(pattern).to_string())
            }
            _ => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::DateTime(s.replace('T', " ")),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
