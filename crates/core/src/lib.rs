//! pdfgrid - table region detection and grid reconstruction for PDF to
//! Office conversion.
//!
//! Pages come from a [`PageSource`]; the [`Converter`] turns each one into an
//! ordered stream of content, table and image blocks.

pub mod convert;
pub mod document;
pub mod error;
pub mod page;
pub mod table;
pub mod utils;

pub use convert::{Converter, PageOutput};
pub use document::{JsonDocument, JsonPage};
pub use error::{Result, TableError};
pub use page::{DocumentSource, NativeTable, PageSource, TextBlock, TextLine, TextSpan};

// Re-export the types most callers need
pub use table::{
    BBox, DetectorKind, Grid, ImageBlock, MergeSpan, PageBlock, TableBlock, TableRegion,
    TableSettings, validate,
};
