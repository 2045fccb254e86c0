//! Error types returned by the export pipeline

use crate::range::RangeError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to open workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("worksheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound { sheet: String, available: Vec<String> },

    #[error("invalid range '{range}': {source}")]
    InvalidRange {
        range: String,
        #[source]
        source: RangeError,
    },

    /// The sheet has no data, or every row or column of the range is hidden
    #[error("nothing to export in '{0}'")]
    EmptyRange(String),

    #[error(
        "unsupported image format for '{}' (expected png, jpg, bmp, gif or tiff)",
        path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("image of {width}x{height} pixels exceeds the limit of {limit} pixels")]
    ImageTooLarge { width: u64, height: u64, limit: u64 },

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn invalid_range(range: &str, source: RangeError) -> Self {
        ExportError::InvalidRange {
            range: range.to_string(),
            source,
        }
    }
}
