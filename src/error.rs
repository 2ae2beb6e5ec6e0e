//! Error types for design editing, rendering and export.

use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the renderer.
///
/// Nothing here is fatal to an editing session: field and query errors are
/// recovered by falling back to defaults, and export errors are logged and
/// reported as a failed [`ExportStatus`](crate::ExportStatus).
#[derive(Error, Debug)]
pub enum Error {
    /// A field name that is not part of the design model.
    #[error("unknown design field: {0}")]
    UnknownField(String),

    /// A value that cannot be interpreted for the given field.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// The preview could not be turned into a bitmap.
    #[error("rasterization failed: {0}")]
    Rasterize(String),

    /// Encoding the bitmap to PNG/JPEG failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing an exported file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Design JSON could not be read or written.
    #[error("design json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background export task panicked or was cancelled.
    #[error("export task failed: {0}")]
    Task(String),
}
