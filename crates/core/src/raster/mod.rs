//! Raster data structures and operations

mod band;
mod descriptor;
mod element;
mod geotransform;
mod grid;

pub use band::RasterBand;
pub use descriptor::{shared_descriptor, Check, DescriptorField, GeoDescriptor};
pub use element::{PixelType, RasterElement};
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
