//! Raster reading and writing using GDAL
//!
//! Opens anything GDAL has a driver for, including the JPEG2000 bands of
//! Sentinel-2 products. Output is always GeoTIFF.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, PixelType, Raster, RasterBand, RasterElement};
use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use num_traits::NumCast;
use std::path::Path;

/// Read the single band of a GDAL-readable raster.
///
/// Samples are converted to `T` like [`super::read_geotiff`] does, and the
/// band's stored data type is kept as its [`PixelType`]. Every failure is
/// reported as [`Error::RasterOpen`].
///
/// # Example
/// ```ignore
/// let nir: RasterBand<f64> = read_gdal("T32TMK_20230801T103031_B8A_20m.jp2")?;
/// ```
pub fn read_gdal<T, P>(path: P) -> Result<RasterBand<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    open_band(path).map_err(|e| Error::RasterOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn open_band<T: RasterElement>(path: &Path) -> Result<RasterBand<T>> {
    let dataset = Dataset::open(path)?;
    if dataset.raster_count() != 1 {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single-band raster, found {} bands",
            dataset.raster_count()
        )));
    }

    let band = dataset.rasterband(1)?;
    let type_name = band.band_type().name();
    let pixel_type = pixel_type_from_gdal(&type_name)
        .ok_or_else(|| Error::UnsupportedDataType(format!("GDAL data type {}", type_name)))?;

    let (cols, rows) = dataset.raster_size();
    let buffer = band.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
    let data: Vec<T> = buffer
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect();

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }
    if let Ok(srs) = dataset.spatial_ref() {
        raster.set_crs(crs_from_srs(&srs));
    }

    Ok(RasterBand::new(raster, pixel_type))
}

fn pixel_type_from_gdal(name: &str) -> Option<PixelType> {
    let pixel_type = match name {
        "Byte" => PixelType::U8,
        "Int8" => PixelType::I8,
        "UInt16" => PixelType::U16,
        "Int16" => PixelType::I16,
        "UInt32" => PixelType::U32,
        "Int32" => PixelType::I32,
        "UInt64" => PixelType::U64,
        "Int64" => PixelType::I64,
        "Float32" => PixelType::F32,
        "Float64" => PixelType::F64,
        _ => return None,
    };
    Some(pixel_type)
}

/// EPSG-coded when GDAL knows the authority code, WKT otherwise
fn crs_from_srs(srs: &SpatialRef) -> Option<CRS> {
    let is_epsg = srs.auth_name().map_or(false, |name| name == "EPSG");
    if let (true, Ok(code)) = (is_epsg, srs.auth_code()) {
        if let Ok(code) = u32::try_from(code) {
            return Some(CRS::from_epsg(code));
        }
    }
    srs.to_wkt().ok().map(CRS::from_wkt)
}

/// Write a Raster as a single-band GeoTIFF through GDAL's GTiff driver.
///
/// The band type follows `T`, as with [`super::write_geotiff`]. Failures
/// are reported as [`Error::RasterWrite`].
pub fn write_gdal<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let result = match T::pixel_type() {
        PixelType::U8 => write_as::<u8, T>(raster, path),
        PixelType::U16 => write_as::<u16, T>(raster, path),
        PixelType::U32 => write_as::<u32, T>(raster, path),
        PixelType::U64 => write_as::<u64, T>(raster, path),
        PixelType::I8 => write_as::<i8, T>(raster, path),
        PixelType::I16 => write_as::<i16, T>(raster, path),
        PixelType::I32 => write_as::<i32, T>(raster, path),
        PixelType::I64 => write_as::<i64, T>(raster, path),
        PixelType::F32 => write_as::<f32, T>(raster, path),
        PixelType::F64 => write_as::<f64, T>(raster, path),
    };
    result.map_err(|e| Error::RasterWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_as<G, T>(raster: &Raster<T>, path: &Path) -> Result<()>
where
    G: GdalType + NumCast + Copy,
    T: RasterElement,
{
    let (rows, cols) = raster.shape();

    let data: Vec<G> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            Error::UnsupportedDataType(format!("cannot store samples as {}", T::pixel_type()))
        })?;

    // Resolve the CRS before anything is created on disk
    let srs = match raster.crs() {
        Some(crs) => Some(srs_from_crs(crs)?),
        None => None,
    };

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type::<G, _>(path, cols, rows, 1)?;
    dataset.set_geo_transform(&raster.transform().to_gdal())?;
    if let Some(srs) = &srs {
        dataset.set_spatial_ref(srs)?;
    }

    let mut band = dataset.rasterband(1)?;
    let mut buffer = Buffer::new((cols, rows), data);
    band.write((0, 0), (cols, rows), &mut buffer)?;

    Ok(())
}

fn srs_from_crs(crs: &CRS) -> Result<SpatialRef> {
    match (crs.epsg(), crs.wkt()) {
        (Some(code), _) => Ok(SpatialRef::from_epsg(code)?),
        (None, Some(wkt)) => Ok(SpatialRef::from_wkt(wkt)?),
        (None, None) => Err(Error::Other(format!("CRS {} has no definition", crs))),
    }
}
