//! # firescar algorithms
//!
//! Burn severity algorithms for firescar.
//!
//! ## Modules
//!
//! - **imagery**: NBR, water masking, dNBR differencing and severity classes
//! - **acquisition**: interface to the external scene acquisition service

pub mod acquisition;
pub mod imagery;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::acquisition::{calculate_from_service, AcquisitionService};
    pub use crate::imagery::{
        calculate, classify_severity, combine_water_masks, dnbr_difference, nbr, water_mask,
        BurnSeverity, Dnbr, DnbrInputs, DnbrOutput, DnbrParams, OutputMode,
    };
    pub use firescar_core::prelude::*;
}
