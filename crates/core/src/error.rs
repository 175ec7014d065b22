//! Error types for presentation building and PPTX generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or writing a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// A size or offset was negative or not a finite number.
    #[error("Invalid dimension: {0} mm (must be a finite, non-negative number)")]
    InvalidDimension(f64),

    /// An image source could not be read at serialization time.
    #[error("Image asset not found or unreadable: {}", path.display())]
    AssetNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A shape links to a slide that was never pushed into the presentation.
    #[error(
        "Shape {shape_id} on slide {slide} links to a slide that is not part of this presentation"
    )]
    DanglingHyperlink { slide: usize, shape_id: u32 },

    /// The template archive is unreadable or lacks a part we depend on.
    #[error("Template is corrupt: {0}")]
    TemplateCorrupt(String),

    /// The destination exists and overwriting was not requested.
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The destination could not be written (permissions, disk space).
    #[error("Failed to write {}: {source}", path.display())]
    WriteDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O failure outside the destination write.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML reading or writing error.
    #[error("XML error: {0}")]
    XmlError(String),
}
