//! sheetshot-core: render spreadsheet regions to images
//!
//! Reads Excel/ODS workbooks with calamine, resolves an A1 range or defined
//! name, lays out the visible rows and columns and rasterizes them into a
//! PNG, JPEG, BMP, GIF or TIFF file.

pub mod config;
pub mod error;
pub mod export;
pub mod range;
pub mod reader;
pub mod render;

pub use config::{Color, RenderConfig};
pub use error::{ExportError, Result};
pub use export::{ExportRequest, ExportSummary, Exporter, WorkbookExporter, export_img};
pub use range::{CellRange, RangeError};
pub use reader::list_sheets;
