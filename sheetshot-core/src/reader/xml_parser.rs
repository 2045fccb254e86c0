//! XML parsing utilities for extracting sheet geometry and styles from XLSX files

use crate::range::{CellRange, parse_cell_ref};
use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::io::BufReader;
use zip::ZipArchive;

/// Geometry and style references read from one worksheet part
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetLayout {
    pub column_widths: HashMap<u32, f64>,
    pub row_heights: HashMap<u32, f64>,
    pub hidden_columns: HashSet<u32>,
    pub hidden_rows: HashSet<u32>,
    pub merged_cells: Vec<CellRange>,
    /// Style (xf) index per cell
    pub cell_styles: HashMap<(u32, u32), usize>,
    pub default_column_width: Option<f64>,
    pub default_row_height: Option<f64>,
}

/// Find the archive path of a worksheet by its name.
///
/// Follows `xl/workbook.xml` (name -> r:id) and `xl/_rels/workbook.xml.rels`
/// (r:id -> target). Returns `None` when the sheet is not listed.
pub fn resolve_sheet_part(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
    sheet_name: &str,
) -> Result<Option<String>> {
    let mut sheet_rel_id = None;
    {
        let workbook_xml = match archive.by_name("xl/workbook.xml") {
            Ok(file) => file,
            Err(_) => return Ok(None),
        };
        let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr_string(&e, b"name");
                    if name.as_deref() == Some(sheet_name) {
                        sheet_rel_id = attr_string(&e, b"r:id");
                        break;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
                _ => {}
            }
            buf.clear();
        }
    }

    let Some(rel_id) = sheet_rel_id else {
        return Ok(None);
    };

    let rels_xml = match archive.by_name("xl/_rels/workbook.xml.rels") {
        Ok(file) => file,
        Err(_) => return Ok(None),
    };
    let mut reader = Reader::from_reader(BufReader::new(rels_xml));
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.name().as_ref() == b"Relationship" =>
            {
                if attr_string(&e, b"Id").as_deref() == Some(rel_id.as_str()) {
                    return Ok(attr_string(&e, b"Target").map(|target| normalize_target(&target)));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(None)
}

/// Read column widths, row heights, hidden rows/columns, merged ranges and
/// cell style indices from a worksheet part in a single pass
pub fn extract_sheet_layout(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
    sheet_path: &str,
) -> Result<SheetLayout> {
    let mut layout = SheetLayout::default();

    let sheet_xml = match archive.by_name(sheet_path) {
        Ok(file) => file,
        Err(_) => return Ok(layout),
    };

    let buf_reader = BufReader::new(sheet_xml);
    let mut reader = Reader::from_reader(buf_reader);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"sheetFormatPr" => {
                    layout.default_column_width = attr_f64(&e, b"defaultColWidth");
                    layout.default_row_height = attr_f64(&e, b"defaultRowHeight");
                }
                b"col" => {
                    // 1-based inclusive span
                    let min_col = attr_u32(&e, b"min").unwrap_or(1).saturating_sub(1);
                    let max_col = attr_u32(&e, b"max").unwrap_or(1).saturating_sub(1);
                    let width = attr_f64(&e, b"width");
                    let hidden = attr_bool(&e, b"hidden");

                    for col in min_col..=max_col.min(crate::range::MAX_COLUMN) {
                        if hidden {
                            layout.hidden_columns.insert(col);
                        }
                        if let Some(width) = width {
                            layout.column_widths.insert(col, width);
                        }
                    }
                }
                b"row" => {
                    if let Some(row_num) = attr_u32(&e, b"r") {
                        let row = row_num.saturating_sub(1);
                        if attr_bool(&e, b"hidden") {
                            layout.hidden_rows.insert(row);
                        }
                        if let Some(height) = attr_f64(&e, b"ht") {
                            layout.row_heights.insert(row, height);
                        }
                    }
                }
                b"c" => {
                    let cell = attr_string(&e, b"r").and_then(|r| parse_cell_ref(&r).ok());
                    let style = attr_string(&e, b"s").and_then(|s| s.parse::<usize>().ok());
                    if let (Some(cell), Some(style)) = (cell, style) {
                        layout.cell_styles.insert(cell, style);
                    }
                }
                b"mergeCell" => {
                    if let Some(range) =
                        attr_string(&e, b"ref").and_then(|r| CellRange::parse(&r).ok())
                    {
                        layout.merged_cells.push(range);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(layout)
}

/// Parse `xl/styles.xml` into number format codes indexed by xf index
pub fn parse_styles(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
) -> Result<Vec<String>> {
    let mut num_fmts = builtin_formats();

    let styles_xml = match archive.by_name("xl/styles.xml") {
        Ok(file) => file,
        Err(_) => return Ok(Vec::new()),
    };

    let buf_reader = BufReader::new(styles_xml);
    let mut reader = Reader::from_reader(buf_reader);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut xfs = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"numFmt" => {
                    let id = attr_u32(&e, b"numFmtId").unwrap_or(0);
                    if let Some(code) = attr_string(&e, b"formatCode").filter(|c| !c.is_empty()) {
                        num_fmts.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let num_fmt_id = attr_u32(&e, b"numFmtId").unwrap_or(0);
                    let format_code = num_fmts
                        .get(&num_fmt_id)
                        .cloned()
                        .unwrap_or_else(|| "General".to_string());
                    xfs.push(format_code);
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"cellXfs" {
                    in_cell_xfs = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(xfs)
}

fn builtin_formats() -> HashMap<u32, String> {
    [
        (0, "General"),
        (1, "0"),
        (2, "0.00"),
        (3, "#,##0"),
        (4, "#,##0.00"),
        (9, "0%"),
        (10, "0.00%"),
        (11, "0.00E+00"),
        (14, "mm-dd-yy"),
        (20, "h:mm"),
        (21, "h:mm:ss"),
        (22, "m/d/yy h:mm"),
        (37, "#,##0 ;(#,##0)"),
        (39, "#,##0.00;(#,##0.00)"),
        (48, "##0.0E+0"),
        (49, "@"),
    ]
    .into_iter()
    .map(|(id, code)| (id, code.to_string()))
    .collect()
}

/// Relationship targets are relative to `xl/` unless they start with `/`
fn normalize_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
        })
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|v| v.parse().ok())
}

fn attr_f64(e: &BytesStart<'_>, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|v| v.parse().ok())
}

fn attr_bool(e: &BytesStart<'_>, key: &[u8]) -> bool {
    attr_string(e, key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
