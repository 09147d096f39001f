//! A raster read from disk together with its on-disk sample type

use crate::raster::{GeoDescriptor, PixelType, Raster, RasterElement};

/// Single raster band plus the pixel type it was stored with.
///
/// The in-memory element type `T` is chosen by the reader's caller; the
/// stored `pixel_type` is what the file declared.
#[derive(Debug, Clone)]
pub struct RasterBand<T: RasterElement> {
    pub raster: Raster<T>,
    pub pixel_type: PixelType,
}

impl<T: RasterElement> RasterBand<T> {
    pub fn new(raster: Raster<T>, pixel_type: PixelType) -> Self {
        Self { raster, pixel_type }
    }

    /// Geometry, CRS and pixel type of this band
    pub fn descriptor(&self) -> GeoDescriptor {
        GeoDescriptor {
            width: self.raster.cols(),
            height: self.raster.rows(),
            crs: self.raster.crs().cloned(),
            transform: *self.raster.transform(),
            pixel_type: Some(self.pixel_type),
        }
    }

    pub fn into_raster(self) -> Raster<T> {
        self.raster
    }
}
