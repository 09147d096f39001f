//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for TIFF I/O and handles the GeoTIFF tags for
//! georeferencing (pixel scale, tiepoint, transformation matrix) and CRS
//! (GeoKeyDirectory). Only single-band rasters are supported.

use crate::error::{Error, Result};
use crate::io::geokeys::{build_geokeys, parse_crs};
use crate::raster::{GeoTransform, PixelType, Raster, RasterBand, RasterElement};
use crate::CRS;
use num_traits::NumCast;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32, Gray32Float, Gray64, Gray64Float, Gray8, GrayI16, GrayI32, GrayI64,
    GrayI8,
};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;
use tiff::ColorType as TiffColorType;

/// Read a single-band GeoTIFF file.
///
/// Samples are converted to `T`; values that cannot be represented become
/// `T::default_nodata()`. The pixel type the file was stored with is kept
/// on the returned band.
///
/// Every failure (missing file, not a TIFF, more than one sample per
/// pixel, unsupported sample format) is reported as [`Error::RasterOpen`].
/// The file is closed before this function returns.
pub fn read_geotiff<T, P>(path: P) -> Result<RasterBand<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let open_error = |reason: String| Error::RasterOpen {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| open_error(e.to_string()))?;
    decode_geotiff(BufReader::new(file)).map_err(|e| open_error(e.to_string()))
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<RasterBand<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?
        .with_limits(Limits::unlimited());

    match decoder.colortype() {
        Ok(TiffColorType::Gray(_)) => {}
        Ok(other) => {
            return Err(Error::UnsupportedDataType(format!(
                "expected a single-band raster, found {:?}",
                other
            )))
        }
        Err(e) => return Err(Error::Other(format!("Cannot read color type: {}", e))),
    }

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let (pixel_type, data): (PixelType, Vec<T>) = match result {
        DecodingResult::U8(buf) => (PixelType::U8, cast_samples(&buf)),
        DecodingResult::U16(buf) => (PixelType::U16, cast_samples(&buf)),
        DecodingResult::U32(buf) => (PixelType::U32, cast_samples(&buf)),
        DecodingResult::U64(buf) => (PixelType::U64, cast_samples(&buf)),
        DecodingResult::I8(buf) => (PixelType::I8, cast_samples(&buf)),
        DecodingResult::I16(buf) => (PixelType::I16, cast_samples(&buf)),
        DecodingResult::I32(buf) => (PixelType::I32, cast_samples(&buf)),
        DecodingResult::I64(buf) => (PixelType::I64, cast_samples(&buf)),
        DecodingResult::F32(buf) => (PixelType::F32, cast_samples(&buf)),
        DecodingResult::F64(buf) => (PixelType::F64, cast_samples(&buf)),
        #[allow(unreachable_patterns)]
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));

    Ok(RasterBand::new(raster, pixel_type))
}

fn cast_samples<S, T>(buf: &[S]) -> Vec<T>
where
    S: NumCast + Copy,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

/// Read the geotransform from ModelPixelScale + ModelTiepoint, falling back
/// to the ModelTransformation matrix.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();

    if let (Some(scale), Some(tiepoint)) = (&scale, &tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z]
            // scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    // 4x4 row-major matrix; only the first two rows matter for a 2D grid
    let t = decoder.get_tag_f64_vec(Tag::ModelTransformationTag).ok()?;
    if t.len() < 16 {
        return None;
    }
    Some(GeoTransform {
        origin_x: t[3],
        origin_y: t[7],
        pixel_width: t[0],
        pixel_height: t[5],
        row_rotation: t[1],
        col_rotation: t[4],
    })
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    let doubles = decoder
        .get_tag_f64_vec(Tag::GeoDoubleParamsTag)
        .unwrap_or_default();
    let ascii = decoder.get_tag_ascii_string(Tag::GeoAsciiParamsTag).ok();
    parse_crs(&keys, &doubles, ascii.as_deref())
}

/// Write a Raster to a single-band GeoTIFF file.
///
/// The sample type follows `T` (e.g. `u8` rasters are written as 8-bit
/// unsigned, `f64` as 64-bit float). The raster's transform and CRS are
/// written as GeoTIFF tags. Failures are reported as [`Error::RasterWrite`];
/// a CRS that cannot be expressed as GeoKeys fails before the file is created.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let write_error = |reason: String| Error::RasterWrite {
        path: path.to_path_buf(),
        reason,
    };

    let geokeys = GeoKeys::new(raster.crs()).map_err(|e| write_error(e.to_string()))?;
    let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &geokeys, &mut writer).map_err(|e| write_error(e.to_string()))?;
    writer.flush().map_err(|e| write_error(e.to_string()))
}

/// GeoKeyDirectory entries plus their GeoAsciiParams text
struct GeoKeys {
    directory: Vec<u16>,
    ascii: Option<String>,
}

impl GeoKeys {
    fn new(crs: Option<&CRS>) -> Result<Self> {
        let (directory, ascii) = build_geokeys(crs)?;
        Ok(Self { directory, ascii })
    }
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, geokeys: &GeoKeys, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    match T::pixel_type() {
        PixelType::U8 => encode_as::<Gray8, T, W>(raster, geokeys, writer),
        PixelType::U16 => encode_as::<Gray16, T, W>(raster, geokeys, writer),
        PixelType::U32 => encode_as::<Gray32, T, W>(raster, geokeys, writer),
        PixelType::U64 => encode_as::<Gray64, T, W>(raster, geokeys, writer),
        PixelType::I8 => encode_as::<GrayI8, T, W>(raster, geokeys, writer),
        PixelType::I16 => encode_as::<GrayI16, T, W>(raster, geokeys, writer),
        PixelType::I32 => encode_as::<GrayI32, T, W>(raster, geokeys, writer),
        PixelType::I64 => encode_as::<GrayI64, T, W>(raster, geokeys, writer),
        PixelType::F32 => encode_as::<Gray32Float, T, W>(raster, geokeys, writer),
        PixelType::F64 => encode_as::<Gray64Float, T, W>(raster, geokeys, writer),
    }
}

fn encode_as<C, T, W>(raster: &Raster<T>, geokeys: &GeoKeys, writer: W) -> Result<()>
where
    C: ColorType,
    C::Inner: NumCast,
    [C::Inner]: TiffValue,
    T: RasterElement,
    W: Write + Seek,
{
    let (rows, cols) = raster.shape();
    let (width, height) = match (u32::try_from(cols), u32::try_from(rows)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(Error::InvalidDimensions { width: cols, height: rows }),
    };

    let data: Vec<C::Inner> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            Error::UnsupportedDataType(format!("cannot store samples as {}", T::pixel_type()))
        })?;

    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let mut image = encoder
        .new_image::<C>(width, height)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    write_geo_tags(image.encoder(), raster.transform(), geokeys)?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    gt: &GeoTransform,
    geokeys: &GeoKeys,
) -> Result<()> {
    let tag_error = |name: &str, e: tiff::TiffError| {
        Error::Other(format!("Cannot write {} tag: {}", name, e))
    };

    if gt.is_north_up() {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])
            .map_err(|e| tag_error("scale", e))?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..])
            .map_err(|e| tag_error("tiepoint", e))?;
    } else {
        // 4x4 row-major; rows 3 and 4 are the identity for a 2D grid
        let mut matrix = [0.0; 16];
        matrix[0] = gt.pixel_width;
        matrix[1] = gt.row_rotation;
        matrix[3] = gt.origin_x;
        matrix[4] = gt.col_rotation;
        matrix[5] = gt.pixel_height;
        matrix[7] = gt.origin_y;
        matrix[15] = 1.0;
        dir.write_tag(Tag::ModelTransformationTag, &matrix[..])
            .map_err(|e| tag_error("transformation", e))?;
    }

    dir.write_tag(Tag::GeoKeyDirectoryTag, &geokeys.directory[..])
        .map_err(|e| tag_error("geokey", e))?;
    if let Some(ascii) = &geokeys.ascii {
        dir.write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())
            .map_err(|e| tag_error("geo ascii", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn classified_raster() -> Raster<u8> {
        let data: Vec<u8> = (0..48).map(|i| (i % 7) as u8).collect();
        let mut raster = Raster::from_vec(data, 6, 8).unwrap();
        raster.set_transform(GeoTransform::new(399_960.0, 4_200_000.0, 20.0, -20.0));
        raster.set_crs(Some(CRS::from_epsg(32633)));
        raster
    }

    #[test]
    fn test_classified_roundtrip_is_lossless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classes.tif");
        let raster = classified_raster();

        write_geotiff(&raster, &path).unwrap();
        let band: RasterBand<u8> = read_geotiff(&path).unwrap();

        assert_eq!(band.pixel_type, PixelType::U8);
        assert_eq!(band.raster.shape(), (6, 8));
        assert_eq!(band.raster.transform(), raster.transform());
        assert_eq!(band.raster.crs(), raster.crs());
        assert_eq!(band.raster.data(), raster.data());
    }

    #[test]
    fn test_float_roundtrip_keeps_nan_and_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dnbr.tif");
        let mut raster: Raster<f64> =
            Raster::from_vec(vec![0.125, -0.5, f64::NAN, 0.7], 2, 2).unwrap();
        raster.set_crs(Some(CRS::from_epsg(4326)));

        write_geotiff(&raster, &path).unwrap();
        let band: RasterBand<f64> = read_geotiff(&path).unwrap();

        assert_eq!(band.pixel_type, PixelType::F64);
        assert_eq!(band.raster.get(0, 0).unwrap(), 0.125);
        assert_eq!(band.raster.get(0, 1).unwrap(), -0.5);
        assert!(band.raster.get(1, 0).unwrap().is_nan());
        assert_eq!(band.raster.crs(), Some(&CRS::from_epsg(4326)));
    }

    #[test]
    fn test_rotated_transform_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rotated.tif");
        let mut raster: Raster<u16> = Raster::filled(3, 3, 1200);
        raster.set_transform(GeoTransform::from_gdal([1000.0, 10.0, 0.5, 2000.0, 0.25, -10.0]));

        write_geotiff(&raster, &path).unwrap();
        let band: RasterBand<u16> = read_geotiff(&path).unwrap();

        assert_eq!(band.raster.transform(), raster.transform());
        assert_eq!(band.raster.crs(), None);
    }

    #[test]
    fn test_read_widens_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nir.tif");
        let raster: Raster<u16> = Raster::filled(2, 2, 4000);

        write_geotiff(&raster, &path).unwrap();
        let band: RasterBand<f64> = read_geotiff(&path).unwrap();

        assert_eq!(band.pixel_type, PixelType::U16);
        assert_eq!(band.raster.get(1, 1).unwrap(), 4000.0);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempdir().unwrap();
        let result = read_geotiff::<f64, _>(dir.path().join("absent.tif"));
        assert!(matches!(result, Err(Error::RasterOpen { .. })));
    }

    #[test]
    fn test_garbage_file_is_open_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_a.tif");
        std::fs::write(&path, b"definitely not a tiff").unwrap();

        let result = read_geotiff::<f64, _>(&path);
        assert!(matches!(result, Err(Error::RasterOpen { .. })));
    }

    #[test]
    fn test_unencodable_crs_fails_before_creating_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mercator.tif");
        let mut raster = classified_raster();
        raster.set_crs(Some(CRS::from_epsg(102100)));

        let result = write_geotiff(&raster, &path);
        assert!(matches!(result, Err(Error::RasterWrite { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_distinct_crs_read_back_distinct() {
        let dir = tempdir().unwrap();
        let mut raster = classified_raster();
        let zone_33 = dir.path().join("utm33.tif");
        let zone_34 = dir.path().join("utm34.tif");

        write_geotiff(&raster, &zone_33).unwrap();
        raster.set_crs(Some(CRS::from_epsg(32634)));
        write_geotiff(&raster, &zone_34).unwrap();

        let a: RasterBand<u8> = read_geotiff(&zone_33).unwrap();
        let b: RasterBand<u8> = read_geotiff(&zone_34).unwrap();
        assert_eq!(a.raster.crs(), Some(&CRS::from_epsg(32633)));
        assert_eq!(b.raster.crs(), Some(&CRS::from_epsg(32634)));
        assert_ne!(a.descriptor().crs, b.descriptor().crs);
    }

    #[test]
    fn test_unwritable_path_is_write_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.tif");
        let result = write_geotiff(&classified_raster(), &path);
        assert!(matches!(result, Err(Error::RasterWrite { .. })));
    }
}
