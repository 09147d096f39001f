//! Error types for firescar

use crate::raster::DescriptorField;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for firescar operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Cannot open raster {}: {reason}", path.display())]
    RasterOpen { path: PathBuf, reason: String },

    #[error("Incompatible rasters ({context}): {field} differs")]
    IncompatibleRaster {
        context: String,
        field: DescriptorField,
    },

    #[error("Cannot write raster {}: {reason}", path.display())]
    RasterWrite { path: PathBuf, reason: String },

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Descriptor field named by an [`Error::IncompatibleRaster`], if any
    pub fn mismatched_field(&self) -> Option<DescriptorField> {
        match self {
            Error::IncompatibleRaster { field, .. } => Some(*field),
            _ => None,
        }
    }
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for firescar operations
pub type Result<T> = std::result::Result<T, Error>;
