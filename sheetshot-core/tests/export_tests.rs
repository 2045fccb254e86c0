use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use sheetshot_core::reader::{self, CellValue};
use sheetshot_core::render::display_value;
use sheetshot_core::{
    ExportError, ExportRequest, Exporter, RenderConfig, WorkbookExporter, export_img, list_sheets,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// Summary: A1:B4 values, A6:B6 merged, column A widened, row 1 taller.
// Data: 15x3 grid of numbers, row 4 and column C hidden.
// Empty: no cells.
fn create_fixture(path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        sheet.write_string(0, 0, "Region")?;
        sheet.write_string(0, 1, "Sales")?;
        sheet.write_string(1, 0, "North")?;
        sheet.write_number(1, 1, 1250.5)?;
        sheet.write_string(2, 0, "South")?;
        sheet.write_number(2, 1, 980)?;
        sheet.write_boolean(3, 0, true)?;
        sheet.merge_range(5, 0, 5, 1, "Merged total", &Format::new())?;
        sheet.set_column_width(0, 20)?;
        sheet.set_row_height(0, 30)?;
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Data")?;
        for row in 0..15u32 {
            for col in 0..3u16 {
                sheet.write_number(row, col, f64::from(row * 10 + u32::from(col)))?;
            }
        }
        sheet.set_row_hidden(3)?;
        sheet.set_column_hidden(2)?;
    }

    workbook.add_worksheet().set_name("Empty")?;
    workbook.define_name("Totals", "=Summary!$A$1:$B$3")?;
    workbook.save(path)?;
    Ok(())
}

fn fixture() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    create_fixture(&path).unwrap();
    (dir, path)
}

fn has_dark_pixels(path: &Path) -> bool {
    let decoded = image::open(path).unwrap().to_rgba8();
    decoded.pixels().any(|p| p[0] < 64 && p[1] < 64 && p[2] < 64)
}

#[test]
fn test_export_used_area() {
    let (dir, input) = fixture();
    let output = dir.path().join("out.png");

    let summary = export_img(&input, &output, "Summary", None, &RenderConfig::default()).unwrap();

    assert_eq!(summary.sheet, "Summary");
    assert_eq!(summary.range.to_string(), "Summary!A1:B6");
    // A is 145px, B the default 64px; row 1 is 40px, rows 2-6 20px each
    assert_eq!((summary.width, summary.height), (145 + 64 + 1, 40 + 5 * 20 + 1));

    let decoded = image::open(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (summary.width, summary.height));
    assert!(has_dark_pixels(&output));
}

#[test]
fn test_range_qualifier_overrides_sheet_argument() {
    let (dir, input) = fixture();
    let output = dir.path().join("data.png");

    let summary = export_img(
        &input,
        &output,
        "Summary",
        Some("Data!B2:C15"),
        &RenderConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.sheet, "Data");
    assert_eq!(summary.range.to_a1(), "B2:C15");
    // column C and row 4 are hidden
    assert_eq!(summary.width, 64 + 1);
    assert_eq!(summary.height, 13 * 20 + 1);
}

#[test]
fn test_defined_name_range() {
    let (dir, input) = fixture();
    let output = dir.path().join("totals.bmp");

    let config = RenderConfig::default();
    let summary = export_img(&input, &output, "Data", Some("Totals"), &config).unwrap();

    assert_eq!(summary.sheet, "Summary");
    assert_eq!(summary.range.to_a1(), "A1:B3");
    assert_eq!(summary.height, 40 + 20 + 20 + 1);
    assert!(output.exists());
}

#[test]
fn test_sheet_name_is_case_insensitive() {
    let (dir, input) = fixture();
    let output = dir.path().join("out.jpg");

    let config = RenderConfig::default();
    let summary = export_img(&input, &output, "summary", Some("A1:A2"), &config).unwrap();
    assert_eq!(summary.sheet, "Summary");
    assert!(output.exists());
}

#[test]
fn test_unknown_sheet_lists_available() {
    let (dir, input) = fixture();
    let err = export_img(
        &input,
        dir.path().join("out.png"),
        "Missing",
        None,
        &RenderConfig::default(),
    )
    .unwrap_err();

    match &err {
        ExportError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "Missing");
            assert_eq!(available, &["Summary", "Data", "Empty"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("Summary, Data, Empty"));
    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn test_invalid_range() {
    let (dir, input) = fixture();
    let err = export_img(
        &input,
        dir.path().join("out.png"),
        "Summary",
        Some("B2:"),
        &RenderConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::InvalidRange { .. }));
    assert!(err.to_string().contains("B2:"));
}

#[test]
fn test_empty_sheet() {
    let (dir, input) = fixture();
    let err = export_img(
        &input,
        dir.path().join("out.png"),
        "Empty",
        None,
        &RenderConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::EmptyRange(ref name) if name == "Empty"));
}

#[test]
fn test_explicit_range_on_empty_sheet_renders_grid() {
    let (dir, input) = fixture();
    let output = dir.path().join("grid.png");

    let config = RenderConfig::default();
    let summary = export_img(&input, &output, "Empty", Some("A1:C2"), &config).unwrap();
    assert_eq!((summary.width, summary.height), (3 * 64 + 1, 2 * 20 + 1));
}

#[test]
fn test_missing_output_directory() {
    let (dir, input) = fixture();
    let output = dir.path().join("no-such-dir").join("out.png");

    let result = export_img(&input, &output, "Summary", None, &RenderConfig::default());
    assert!(matches!(
        result,
        Err(ExportError::Image(_)) | Err(ExportError::Io(_))
    ));
}

#[test]
fn test_exporter_uses_config_scale() {
    let (dir, input) = fixture();
    let plain = WorkbookExporter::default();
    let scaled = WorkbookExporter::new(RenderConfig {
        scale: 2,
        ..Default::default()
    });

    let request = ExportRequest {
        input_path: input.clone(),
        output_path: dir.path().join("plain.png"),
        sheet_name: "Summary".to_string(),
        cell_range: Some("A1:B3".to_string()),
    };
    let small = plain.export(&request).unwrap();

    let request = ExportRequest {
        output_path: dir.path().join("scaled.png"),
        ..request
    };
    let large = scaled.export(&request).unwrap();

    assert_eq!(large.width, (small.width - 1) * 2 + 1);
    assert_eq!(large.height, (small.height - 1) * 2 + 1);
}

#[test]
fn test_list_sheets() {
    let (_dir, input) = fixture();
    assert_eq!(list_sheets(&input).unwrap(), vec!["Summary", "Data", "Empty"]);
}

// Formats: a date, a built-in percentage and a custom number format.
fn create_formats_fixture(path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Formats")?;

    let date = ExcelDateTime::from_ymd(2024, 1, 31)?;
    sheet.write_datetime_with_format(0, 0, &date, &Format::new().set_num_format("yyyy-mm-dd"))?;
    sheet.write_number_with_format(1, 0, 0.256, &Format::new().set_num_format("0.00%"))?;
    sheet.write_number_with_format(2, 0, 1234.5, &Format::new().set_num_format("#,##0.000"))?;
    sheet.write_number(3, 0, 7)?;
    workbook.save(path)?;
    Ok(())
}

#[test]
fn test_number_formats_reach_cells() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("formats.xlsx");
    create_formats_fixture(&input).unwrap();

    let mut workbook = reader::Workbook::open(&input).unwrap();
    let sheet = workbook.read_sheet("Formats").unwrap();
    let shown = |row: u32| {
        let cell = sheet.get_cell(row, 0).unwrap();
        display_value(&cell.value, cell.num_fmt.as_deref()).unwrap().text
    };

    let date = sheet.get_cell(0, 0).unwrap();
    assert_eq!(date.value, CellValue::DateTime("2024-01-31".to_string()));
    assert_eq!(date.num_fmt.as_deref(), Some("yyyy-mm-dd"));
    assert_eq!(shown(0), "2024-01-31");

    let percent = sheet.get_cell(1, 0).unwrap();
    assert_eq!(percent.value, CellValue::Number(0.256));
    assert_eq!(percent.num_fmt.as_deref(), Some("0.00%"));
    assert_eq!(shown(1), "25.60%");

    assert_eq!(sheet.get_cell(2, 0).unwrap().num_fmt.as_deref(), Some("#,##0.000"));
    assert_eq!(shown(2), "1,234.500");

    assert_eq!(sheet.get_cell(3, 0).unwrap().num_fmt, None);
    assert_eq!(shown(3), "7");
}

const REPORT_ROWS: &str = r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1"><v>2</v></c></row>
<row r="2" ht="45" customHeight="1"><c r="A2"><v>3</v></c><c r="B2"><v>4</v></c></row>"#;

// Minimal package whose worksheet part is not named sheetN.xml, so geometry
// is only found by following the workbook relationships.
fn create_mock_xlsx(path: &Path, rows: &str) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/report.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
            .as_bytes(),
    )?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
            .as_bytes(),
    )?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Report" sheetId="1" r:id="rId7"/></sheets>
</workbook>"#
            .as_bytes(),
    )?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/report.xml"/>
</Relationships>"#
            .as_bytes(),
    )?;

    zip.start_file("xl/worksheets/report.xml", options)?;
    let worksheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cols><col min="2" max="2" width="30" customWidth="1"/></cols>
<sheetData>
{}
</sheetData>
</worksheet>"#,
        rows
    );
    zip.write_all(worksheet.as_bytes())?;

    zip.finish()?;
    Ok(())
}

#[test]
fn test_geometry_follows_workbook_relationships() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mock.xlsx");
    create_mock_xlsx(&input, REPORT_ROWS).unwrap();
    let output = dir.path().join("mock.png");

    let summary = export_img(&input, &output, "Report", None, &RenderConfig::default()).unwrap();

    assert_eq!(summary.range.to_a1(), "A1:B2");
    assert_eq!(summary.width, 64 + 210 + 1);
    assert_eq!(summary.height, 20 + 60 + 1);
}

#[test]
fn test_absurd_row_height_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tall.xlsx");
    let rows = r#"<row r="1" ht="1e12" customHeight="1"><c r="A1"><v>1</v></c></row>"#;
    create_mock_xlsx(&input, rows).unwrap();
    let output = dir.path().join("tall.png");

    let summary = export_img(&input, &output, "Report", None, &RenderConfig::default()).unwrap();

    assert_eq!(summary.range.to_a1(), "A1:A1");
    assert_eq!((summary.width, summary.height), (64 + 1, 545 + 1));
    assert_eq!(image::image_dimensions(&output).unwrap(), (65, 546));
}
