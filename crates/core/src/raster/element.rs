//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::{self, Debug};

/// On-disk sample type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl PixelType {
    /// Conventional lowercase name ("uint8", "float64", ...)
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::U8 => "uint8",
            PixelType::U16 => "uint16",
            PixelType::U32 => "uint32",
            PixelType::U64 => "uint64",
            PixelType::I8 => "int8",
            PixelType::I16 => "int16",
            PixelType::I32 => "int32",
            PixelType::I64 => "int64",
            PixelType::F32 => "float32",
            PixelType::F64 => "float64",
        }
    }

    /// Whether samples are floating point
    pub fn is_float(&self) -> bool {
        matches!(self, PixelType::F32 | PixelType::F64)
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for types that can be stored in a raster cell.
///
/// This trait bounds the types that can be used as raster values,
/// ensuring they support necessary numeric operations.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Pixel type used when this element is written to disk
    fn pixel_type() -> PixelType;

    /// Value substituted for samples that cannot be represented
    fn default_nodata() -> Self;
}

macro_rules! impl_raster_element_int {
    ($t:ty, $pt:ident) => {
        impl RasterElement for $t {
            fn pixel_type() -> PixelType {
                PixelType::$pt
            }

            fn default_nodata() -> Self {
                <$t>::MIN
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty, $pt:ident) => {
        impl RasterElement for $t {
            fn pixel_type() -> PixelType {
                PixelType::$pt
            }

            fn default_nodata() -> Self {
                <$t>::NAN
            }
        }
    };
}

impl_raster_element_int!(i8, I8);
impl_raster_element_int!(i16, I16);
impl_raster_element_int!(i32, I32);
impl_raster_element_int!(i64, I64);
impl_raster_element_int!(u8, U8);
impl_raster_element_int!(u16, U16);
impl_raster_element_int!(u32, U32);
impl_raster_element_int!(u64, U64);
impl_raster_element_float!(f32, F32);
impl_raster_element_float!(f64, F64);
