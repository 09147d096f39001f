//! Imagery analysis algorithms
//!
//! Burn severity mapping from multispectral imagery:
//! - NBR: Normalized Burn Ratio from NIR and SWIR
//! - Water mask: land/water mask from a scene classification band
//! - Severity: dNBR differencing and seven-class burn severity
//! - dNBR: the full pre/post-fire pipeline

mod dnbr;
mod nbr;
mod severity;
mod water_mask;

pub use dnbr::{
    calculate, AcquisitionPaths, Dnbr, DnbrInputs, DnbrOutput, DnbrParams, OutputMode,
};
pub use nbr::nbr;
pub use severity::{
    classify_severity, clear_undefined, dnbr_difference, BurnSeverity, SeverityHistogram,
};
pub use water_mask::{combine_water_masks, water_mask, SCL_WATER};
