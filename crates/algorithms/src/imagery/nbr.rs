//! Normalized Burn Ratio
//!
//! `NBR = (NIR - SWIR) / (NIR + SWIR)`, computed after promoting both
//! reflectance samples to signed integers so unsigned band values never
//! wrap on subtraction.

use firescar_core::raster::Raster;
use firescar_core::{Error, Result};
use ndarray::Zip;

/// Normalized Burn Ratio
///
/// `NBR = (NIR - SWIR) / (NIR + SWIR)`
///
/// Each sample is truncated to an `i64` before the arithmetic, so fractional
/// reflectances behave like an integer cast. The division is plain IEEE:
/// where `NIR + SWIR == 0` the result is NaN (0/0) or ±infinity, never an
/// error. Samples that cannot be promoted (NaN, out of range) give NaN.
///
/// The output keeps the NIR band's transform and CRS.
///
/// # Arguments
/// * `nir` - Near-infrared band
/// * `swir` - Shortwave infrared band
pub fn nbr(nir: &Raster<f64>, swir: &Raster<f64>) -> Result<Raster<f64>> {
    if nir.shape() != swir.shape() {
        return Err(Error::SizeMismatch {
            er: nir.rows(),
            ec: nir.cols(),
            ar: swir.rows(),
            ac: swir.cols(),
        });
    }

    let data = Zip::from(nir.data())
        .and(swir.data())
        .map_collect(|&n, &s| burn_ratio(n, s));

    nir.with_data(data)
}

/// NBR for a single pixel pair.
fn burn_ratio(nir: f64, swir: f64) -> f64 {
    let (Some(n), Some(s)) = (promote(nir), promote(swir)) else {
        return f64::NAN;
    };
    match (n.checked_sub(s), n.checked_add(s)) {
        (Some(diff), Some(sum)) => diff as f64 / sum as f64,
        _ => f64::NAN,
    }
}

// Truncating float-to-int promotion; `None` for NaN and out-of-range values.
fn promote(v: f64) -> Option<i64> {
    if v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use firescar_core::{GeoTransform, CRS};

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(5, 5, value);
        r.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        r.set_crs(Some(CRS::from_epsg(32633)));
        r
    }

    #[test]
    fn test_nbr_formula() {
        let result = nbr(&make_band(200.0), &make_band(100.0)).unwrap();
        assert_relative_eq!(result.get(2, 2).unwrap(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nbr_no_unsigned_wraparound() {
        // SWIR brighter than NIR must give a negative ratio
        let result = nbr(&make_band(100.0), &make_band(300.0)).unwrap();
        assert_relative_eq!(result.get(0, 0).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_nbr_zero_sum_is_undefined() {
        let result = nbr(&make_band(0.0), &make_band(0.0)).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_nbr_zero_sum_nonzero_diff_is_infinite() {
        let result = nbr(&make_band(5.0), &make_band(-5.0)).unwrap();
        assert_eq!(result.get(1, 1).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_nbr_truncates_fractional_samples() {
        // 0.9 and 0.4 both promote to 0 => 0/0
        let result = nbr(&make_band(0.9), &make_band(0.4)).unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());

        // 3.7 -> 3, 1.2 -> 1 => 2/4
        let result = nbr(&make_band(3.7), &make_band(1.2)).unwrap();
        assert_relative_eq!(result.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_nbr_nan_sample() {
        let mut nir = make_band(200.0);
        nir.set(3, 3, f64::NAN).unwrap();
        let result = nbr(&nir, &make_band(100.0)).unwrap();
        assert!(result.get(3, 3).unwrap().is_nan());
        assert!(!result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_nbr_keeps_georeferencing() {
        let nir = make_band(200.0);
        let result = nbr(&nir, &make_band(100.0)).unwrap();
        assert_eq!(result.transform(), nir.transform());
        assert_eq!(result.crs(), nir.crs());
    }

    #[test]
    fn test_nbr_shape_mismatch() {
        let nir = make_band(200.0);
        let swir = Raster::filled(4, 5, 100.0);
        assert!(matches!(nbr(&nir, &swir), Err(Error::SizeMismatch { .. })));
    }
}
