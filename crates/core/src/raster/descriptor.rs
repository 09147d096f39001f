//! Geospatial descriptors and compatibility checks
//!
//! Two rasters can only be combined pixel-for-pixel when they share the same
//! grid: size, coordinate reference system and geotransform (and, where it
//! matters, sample type). Nothing here resamples; mismatches are errors.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, PixelType};
use std::fmt;

/// Field of a [`GeoDescriptor`], in the order they are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorField {
    Width,
    Height,
    Crs,
    Transform,
    PixelType,
}

impl DescriptorField {
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorField::Width => "width",
            DescriptorField::Height => "height",
            DescriptorField::Crs => "crs",
            DescriptorField::Transform => "transform",
            DescriptorField::PixelType => "pixel type",
        }
    }
}

impl fmt::Display for DescriptorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which fields take part in a compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Width, height, CRS and transform
    Geometry,
    /// Geometry plus pixel type
    GeometryAndType,
}

/// Geometry and sample type shared by the bands of a raster stack.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDescriptor {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Coordinate reference system, if the file declares one
    pub crs: Option<CRS>,
    /// Affine geotransform
    pub transform: GeoTransform,
    /// Sample type; `None` when the described bands disagree on it
    pub pixel_type: Option<PixelType>,
}

impl GeoDescriptor {
    /// First field (in [`DescriptorField`] order) on which `self` and `other` differ
    pub fn first_mismatch(&self, other: &GeoDescriptor, check: Check) -> Option<DescriptorField> {
        if self.width != other.width {
            Some(DescriptorField::Width)
        } else if self.height != other.height {
            Some(DescriptorField::Height)
        } else if self.crs != other.crs {
            Some(DescriptorField::Crs)
        } else if self.transform != other.transform {
            Some(DescriptorField::Transform)
        } else if check == Check::GeometryAndType && self.pixel_type != other.pixel_type {
            Some(DescriptorField::PixelType)
        } else {
            None
        }
    }

    /// Whether `other` passes `check` against `self`
    pub fn is_compatible(&self, other: &GeoDescriptor, check: Check) -> bool {
        self.first_mismatch(other, check).is_none()
    }

    /// Fail with [`Error::IncompatibleRaster`] if `other` does not pass `check`
    pub fn ensure_compatible(
        &self,
        other: &GeoDescriptor,
        check: Check,
        context: &str,
    ) -> Result<()> {
        match self.first_mismatch(other, check) {
            Some(field) => Err(Error::IncompatibleRaster {
                context: context.to_string(),
                field,
            }),
            None => Ok(()),
        }
    }

    /// (rows, cols), matching [`crate::Raster::shape`]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// Validate a set of descriptors against the first one and return the shared descriptor.
///
/// The returned pixel type is `Some` only when every descriptor agrees on it,
/// whether or not `check` compares pixel types.
pub fn shared_descriptor(
    context: &str,
    descriptors: &[&GeoDescriptor],
    check: Check,
) -> Result<GeoDescriptor> {
    let (first, rest) = descriptors
        .split_first()
        .ok_or_else(|| Error::Other(format!("{}: no rasters to compare", context)))?;

    let mut shared = (*first).clone();
    for other in rest {
        first.ensure_compatible(other, check, context)?;
        if shared.pixel_type != other.pixel_type {
            shared.pixel_type = None;
        }
    }

    Ok(shared)
}
