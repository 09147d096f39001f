//! dNBR differencing and burn severity classification
//!
//! `dNBR = (NBR_pre - NBR_post) * mask`, then an optional discretization
//! into seven ordinal classes using half-open threshold intervals.

use firescar_core::raster::Raster;
use firescar_core::{Error, Result};
use ndarray::Zip;
use std::fmt;

/// Burn severity classes, ordered from strongest regrowth to highest severity.
///
/// The discriminant is the class code written to classified rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BurnSeverity {
    HighRegrowth = 0,
    LowRegrowth = 1,
    Unburned = 2,
    Low = 3,
    ModerateLow = 4,
    ModerateHigh = 5,
    High = 6,
}

impl BurnSeverity {
    /// All classes in code order
    pub const ALL: [BurnSeverity; 7] = [
        BurnSeverity::HighRegrowth,
        BurnSeverity::LowRegrowth,
        BurnSeverity::Unburned,
        BurnSeverity::Low,
        BurnSeverity::ModerateLow,
        BurnSeverity::ModerateHigh,
        BurnSeverity::High,
    ];

    /// Classify a single dNBR value.
    ///
    /// | dNBR            | class          |
    /// |-----------------|----------------|
    /// | NaN             | unburned       |
    /// | < -0.25         | high regrowth  |
    /// | [-0.25, -0.10)  | low regrowth   |
    /// | [-0.10, 0.10)   | unburned       |
    /// | [0.10, 0.27)    | low            |
    /// | [0.27, 0.44)    | moderate-low   |
    /// | [0.44, 0.66)    | moderate-high  |
    /// | >= 0.66         | high           |
    pub fn from_dnbr(value: f64) -> Self {
        if value.is_nan() {
            BurnSeverity::Unburned
        } else if value < -0.25 {
            BurnSeverity::HighRegrowth
        } else if value < -0.1 {
            BurnSeverity::LowRegrowth
        } else if value < 0.1 {
            BurnSeverity::Unburned
        } else if value < 0.27 {
            BurnSeverity::Low
        } else if value < 0.44 {
            BurnSeverity::ModerateLow
        } else if value < 0.66 {
            BurnSeverity::ModerateHigh
        } else {
            BurnSeverity::High
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            BurnSeverity::HighRegrowth => "high regrowth",
            BurnSeverity::LowRegrowth => "low regrowth",
            BurnSeverity::Unburned => "unburned",
            BurnSeverity::Low => "low severity",
            BurnSeverity::ModerateLow => "moderate-low severity",
            BurnSeverity::ModerateHigh => "moderate-high severity",
            BurnSeverity::High => "high severity",
        }
    }
}

impl fmt::Display for BurnSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difference two NBR rasters and apply an include mask.
///
/// `dNBR = (pre - post) * mask` with IEEE semantics: an undefined NBR stays
/// undefined even under a zero mask. The output keeps `pre`'s transform and CRS.
pub fn dnbr_difference(
    pre: &Raster<f64>,
    post: &Raster<f64>,
    mask: &Raster<u8>,
) -> Result<Raster<f64>> {
    let shape = pre.shape();
    for other in [post.shape(), mask.shape()] {
        if other != shape {
            return Err(Error::SizeMismatch {
                er: shape.0,
                ec: shape.1,
                ar: other.0,
                ac: other.1,
            });
        }
    }

    let data = Zip::from(pre.data())
        .and(post.data())
        .and(mask.data())
        .map_collect(|&a, &b, &m| (a - b) * f64::from(m));

    pre.with_data(data)
}

/// Replace undefined (NaN) dNBR values with 0, meaning "no signal".
///
/// Infinite values are left as they are.
pub fn clear_undefined(dnbr: &mut Raster<f64>) {
    dnbr.data_mut().mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });
}

/// Discretize a dNBR raster into [`BurnSeverity`] class codes.
pub fn classify_severity(dnbr: &Raster<f64>) -> Result<Raster<u8>> {
    let data = dnbr.data().mapv(|v| BurnSeverity::from_dnbr(v).code());
    dnbr.with_data(data)
}

/// Pixel counts per burn severity class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityHistogram {
    counts: [usize; 7],
    /// Pixels whose code is not a valid class
    pub invalid: usize,
}

impl SeverityHistogram {
    /// Count the classes of a classified raster
    pub fn from_raster(classes: &Raster<u8>) -> Self {
        let mut histogram = Self::default();
        for &code in classes.data().iter() {
            match histogram.counts.get_mut(code as usize) {
                Some(count) => *count += 1,
                None => histogram.invalid += 1,
            }
        }
        histogram
    }

    pub fn count(&self, class: BurnSeverity) -> usize {
        self.counts[class.code() as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.invalid
    }

    /// Pixels in any burned class (low through high severity)
    pub fn burned(&self) -> usize {
        self.counts[BurnSeverity::Low.code() as usize..].iter().sum()
    }
}

impl fmt::Display for SeverityHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = BurnSeverity::ALL
            .iter()
            .map(|class| format!("{}={}", class, self.count(*class)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use firescar_core::GeoTransform;

    fn grid(values: Vec<f64>) -> Raster<f64> {
        let cols = values.len();
        let mut r = Raster::from_vec(values, 1, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, 1.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_class_boundaries_are_half_open() {
        assert_eq!(BurnSeverity::from_dnbr(-0.25), BurnSeverity::LowRegrowth);
        assert_eq!(BurnSeverity::from_dnbr(-0.2500001), BurnSeverity::HighRegrowth);
        assert_eq!(BurnSeverity::from_dnbr(-0.1), BurnSeverity::Unburned);
        assert_eq!(BurnSeverity::from_dnbr(0.1), BurnSeverity::Low);
        assert_eq!(BurnSeverity::from_dnbr(0.27), BurnSeverity::ModerateLow);
        assert_eq!(BurnSeverity::from_dnbr(0.44), BurnSeverity::ModerateHigh);
        assert_eq!(BurnSeverity::from_dnbr(0.66), BurnSeverity::High);
        assert_eq!(BurnSeverity::from_dnbr(0.0999), BurnSeverity::Unburned);
    }

    #[test]
    fn test_undefined_and_infinite_values() {
        assert_eq!(BurnSeverity::from_dnbr(f64::NAN), BurnSeverity::Unburned);
        assert_eq!(BurnSeverity::from_dnbr(f64::INFINITY), BurnSeverity::High);
        assert_eq!(BurnSeverity::from_dnbr(f64::NEG_INFINITY), BurnSeverity::HighRegrowth);
    }

    #[test]
    fn test_codes() {
        for (i, class) in BurnSeverity::ALL.iter().enumerate() {
            assert_eq!(class.code() as usize, i);
            assert_eq!(BurnSeverity::from_code(i as u8), Some(*class));
        }
        assert_eq!(BurnSeverity::from_code(7), None);
    }

    #[test]
    fn test_difference_applies_mask() {
        let pre = grid(vec![0.6, 0.6, f64::NAN]);
        let post = grid(vec![0.1, 0.1, 0.2]);
        let mask = Raster::from_vec(vec![1u8, 0, 0], 1, 3).unwrap();

        let d = dnbr_difference(&pre, &post, &mask).unwrap();
        assert_relative_eq!(d.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(d.get(0, 1).unwrap(), 0.0);
        // undefined stays undefined under a zero mask
        assert!(d.get(0, 2).unwrap().is_nan());
        assert_eq!(d.transform(), pre.transform());
    }

    #[test]
    fn test_difference_shape_mismatch() {
        let pre = grid(vec![0.1, 0.2]);
        let post = grid(vec![0.1, 0.2, 0.3]);
        let mask = Raster::<u8>::filled(1, 2, 1);
        assert!(matches!(
            dnbr_difference(&pre, &post, &mask),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_clear_undefined() {
        let mut d = grid(vec![f64::NAN, 0.3, f64::INFINITY]);
        clear_undefined(&mut d);
        assert_eq!(d.get(0, 0).unwrap(), 0.0);
        assert_eq!(d.get(0, 1).unwrap(), 0.3);
        assert_eq!(d.get(0, 2).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_classify_grid() {
        let d = grid(vec![-0.5, -0.2, 0.0, 0.2, 0.3, 0.5, 0.9, f64::NAN]);
        let classes = classify_severity(&d).unwrap();
        assert_eq!(
            classes.data().as_slice().unwrap(),
            &[0, 1, 2, 3, 4, 5, 6, 2]
        );
        assert_eq!(classes.transform(), d.transform());
    }

    #[test]
    fn test_histogram() {
        let classes = Raster::from_vec(vec![2u8, 2, 3, 6, 9], 1, 5).unwrap();
        let h = SeverityHistogram::from_raster(&classes);
        assert_eq!(h.count(BurnSeverity::Unburned), 2);
        assert_eq!(h.count(BurnSeverity::High), 1);
        assert_eq!(h.burned(), 2);
        assert_eq!(h.invalid, 1);
        assert_eq!(h.total(), 5);
        assert!(h.to_string().contains("unburned=2"));
    }
}
