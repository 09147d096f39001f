//! I/O operations for reading and writing geospatial data
//!
//! The native `tiff` backend is always available. With the `gdal` feature,
//! [`read_raster`] and [`write_raster`] go through GDAL instead, which also
//! opens the JPEG2000 bands Sentinel-2 products ship.

#[cfg(feature = "gdal")]
mod gdal_io;
mod geokeys;
mod geotiff;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_gdal, write_gdal};
pub use geotiff::{read_geotiff, write_geotiff};

use crate::error::Result;
use crate::raster::{Raster, RasterBand, RasterElement};
use std::path::Path;

/// Read a single-band raster with the configured backend
pub fn read_raster<T, P>(path: P) -> Result<RasterBand<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    #[cfg(feature = "gdal")]
    {
        read_gdal(path)
    }
    #[cfg(not(feature = "gdal"))]
    {
        read_geotiff(path)
    }
}

/// Write a single-band GeoTIFF with the configured backend
pub fn write_raster<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    #[cfg(feature = "gdal")]
    {
        write_gdal(raster, path)
    }
    #[cfg(not(feature = "gdal"))]
    {
        write_geotiff(raster, path)
    }
}
