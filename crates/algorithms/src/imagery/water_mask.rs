//! Water masking from a scene classification (SCL) band
//!
//! A mask holds `1` for pixels to keep and `0` for water. Masks from the
//! pre- and post-fire acquisitions are optional and are combined so a pixel
//! is dropped only when every supplied mask marks it as water.

use firescar_core::raster::Raster;
use firescar_core::{Error, Result};
use ndarray::{Array2, Zip};

/// Scene classification code for water
pub const SCL_WATER: u8 = 6;

/// Build a land/water mask from a scene classification band.
///
/// Output is `1` where the class code differs from [`SCL_WATER`], `0` otherwise.
/// The comparison is on the raw sample value, so non-integral codes never
/// count as water.
pub fn water_mask(scl: &Raster<f64>) -> Result<Raster<u8>> {
    let water = f64::from(SCL_WATER);
    let data = scl.data().mapv(|code| u8::from(code != water));
    scl.with_data(data)
}

/// Combine the optional pre- and post-fire masks into one include mask.
///
/// Missing masks contribute zeros to the per-pixel sum. If the sum is
/// nonzero anywhere the result is `sum != 0`; if it is zero everywhere the
/// result is all ones, i.e. nothing is masked. The fallback is decided from
/// the sum alone, so a scene that is water in every supplied mask is also
/// left unmasked.
pub fn combine_water_masks(
    shape: (usize, usize),
    pre: Option<&Raster<u8>>,
    post: Option<&Raster<u8>>,
) -> Result<Raster<u8>> {
    let mut sum = Array2::<u8>::zeros(shape);

    for mask in [post, pre].into_iter().flatten() {
        if mask.shape() != shape {
            return Err(Error::SizeMismatch {
                er: shape.0,
                ec: shape.1,
                ar: mask.rows(),
                ac: mask.cols(),
            });
        }
        Zip::from(&mut sum)
            .and(mask.data())
            .for_each(|s, &m| *s = s.saturating_add(m));
    }

    let combined = if sum.iter().any(|&s| s != 0) {
        sum.mapv(|s| u8::from(s != 0))
    } else {
        Array2::ones(shape)
    };

    Ok(Raster::from_array(combined))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scl(values: Vec<f64>) -> Raster<f64> {
        Raster::from_vec(values, 2, 2).unwrap()
    }

    fn mask(values: Vec<u8>) -> Raster<u8> {
        Raster::from_vec(values, 2, 2).unwrap()
    }

    #[test]
    fn test_water_mask_codes() {
        let m = water_mask(&scl(vec![6.0, 4.0, 5.0, 6.5])).unwrap();
        assert_eq!(m.data().as_slice().unwrap(), &[0, 1, 1, 1]);
    }

    #[test]
    fn test_combine_no_masks_is_all_ones() {
        let m = combine_water_masks((2, 2), None, None).unwrap();
        assert!(m.data().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_combine_is_union_of_land() {
        // pixel 0: water in both; pixel 1: water pre, land post
        let pre = mask(vec![0, 0, 1, 1]);
        let post = mask(vec![0, 1, 0, 1]);
        let m = combine_water_masks((2, 2), Some(&pre), Some(&post)).unwrap();
        assert_eq!(m.data().as_slice().unwrap(), &[0, 1, 1, 1]);
    }

    #[test]
    fn test_combine_single_mask() {
        let post = mask(vec![1, 0, 1, 1]);
        let m = combine_water_masks((2, 2), None, Some(&post)).unwrap();
        assert_eq!(m.data().as_slice().unwrap(), &[1, 0, 1, 1]);
    }

    #[test]
    fn test_combine_all_water_falls_back_to_ones() {
        let pre = mask(vec![0; 4]);
        let post = mask(vec![0; 4]);
        let m = combine_water_masks((2, 2), Some(&pre), Some(&post)).unwrap();
        assert!(m.data().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_combine_shape_mismatch() {
        let pre = Raster::<u8>::new(3, 2);
        let result = combine_water_masks((2, 2), Some(&pre), None);
        assert!(matches!(result, Err(Error::SizeMismatch { .. })));
    }
}
