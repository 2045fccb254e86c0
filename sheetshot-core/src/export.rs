//! The export operation: workbook region in, image file out

use crate::config::RenderConfig;
use crate::error::{ExportError, Result};
use crate::range::{CellRange, resolve_range};
use crate::reader::Workbook;
use crate::render;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Arguments of one export invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub sheet_name: String,
    /// Range text as given by the user, e.g. `Sheet2!B2:C15` or a defined name
    pub cell_range: Option<String>,
}

/// What was written by a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub sheet: String,
    pub range: CellRange,
    pub width: u32,
    pub height: u32,
}

/// Renders a sheet region of a workbook to an image file
pub trait Exporter {
    fn export(&self, request: &ExportRequest) -> Result<ExportSummary>;
}

/// Exporter backed by calamine and the built-in rasterizer
#[derive(Debug, Clone, Default)]
pub struct WorkbookExporter {
    config: RenderConfig,
}

impl WorkbookExporter {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

impl Exporter for WorkbookExporter {
    fn export(&self, request: &ExportRequest) -> Result<ExportSummary> {
        export_img(
            &request.input_path,
            &request.output_path,
            &request.sheet_name,
            request.cell_range.as_deref(),
            &self.config,
        )
    }
}

/// Render `cell_range` (or the used area) of `sheet_name` in `input` to `output`.
///
/// A sheet qualifier inside the range takes precedence over `sheet_name`.
pub fn export_img(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    sheet_name: &str,
    cell_range: Option<&str>,
    config: &RenderConfig,
) -> Result<ExportSummary> {
    let input = input.as_ref();
    let output = output.as_ref();
    let format = output_format(output)?;

    let mut workbook = Workbook::open(input)?;

    let requested = match cell_range {
        Some(text) => Some(
            resolve_range(text, &workbook.defined_names())
                .map_err(|e| ExportError::invalid_range(text, e))?,
        ),
        None => None,
    };

    let target_sheet = match requested.as_ref().and_then(|r| r.sheet.as_deref()) {
        Some(qualifier) => {
            if !qualifier.eq_ignore_ascii_case(sheet_name) {
                debug!(
                    "range names sheet '{}', overriding '{}'",
                    qualifier, sheet_name
                );
            }
            qualifier.to_string()
        }
        None => sheet_name.to_string(),
    };

    let sheet = workbook.read_sheet(&target_sheet)?;

    let range = match requested {
        Some(range) => range.with_sheet(sheet.name.clone()),
        None => sheet
            .data_bounds()
            .ok_or_else(|| ExportError::EmptyRange(sheet.name.clone()))?
            .with_sheet(sheet.name.clone()),
    };
    debug!("exporting {} from {}", range, input.display());

    let canvas = render::rasterize(&sheet, &range, config)?;
    let (width, height) = canvas.dimensions();
    save_image(canvas, output, format)?;

    info!(
        "wrote {}x{} {:?} image to {}",
        width,
        height,
        format,
        output.display()
    );

    Ok(ExportSummary {
        output: output.to_path_buf(),
        sheet: sheet.name,
        range,
        width,
        height,
    })
}

/// Image format implied by the output file extension
pub fn output_format(path: &Path) -> Result<ImageFormat> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => Ok(ImageFormat::Png),
        Some("jpg") | Some("jpeg") => Ok(ImageFormat::Jpeg),
        Some("bmp") => Ok(ImageFormat::Bmp),
        Some("gif") => Ok(ImageFormat::Gif),
        Some("tif") | Some("tiff") => Ok(ImageFormat::Tiff),
        _ => Err(ExportError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn save_image(image: RgbaImage, path: &Path, format: ImageFormat) -> Result<()> {
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .save_with_format(path, format)?,
        _ => image.save_with_format(path, format)?,
    }
    Ok(())
}
