//! Error types for the pdfgrid conversion library.
//!
//! Only document-level failures are fatal. Everything below the page level
//! is turned into a fallback or a page diagnostic by the driver, so most of
//! these variants are produced by collaborators and consumed in `convert`.

use thiserror::Error;

/// Primary error type for conversion operations.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("cannot open document: {0}")]
    DocumentUnavailable(String),

    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("page {index} could not be read: {msg}")]
    MalformedPage { index: usize, msg: String },

    #[error("rasterization not available for this page source")]
    RenderUnavailable,

    #[error("rasterization failed: {0}")]
    RenderFailed(String),

    #[error("native table extraction failed: {0}")]
    NativeTables(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("invalid page dump: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for TableError.
pub type Result<T> = std::result::Result<T, TableError>;
