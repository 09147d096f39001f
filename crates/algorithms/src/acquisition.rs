//! Boundary to the scene acquisition service.
//!
//! Finding scenes in a remote catalog, ordering them by date and downloading
//! their bands is someone else's job. This module only defines what that
//! service must hand back (six local band paths) and how its failures are
//! reported by the dNBR pipeline.

use firescar_core::{Error, Result};
use tracing::info;

use crate::imagery::{calculate, DnbrInputs, DnbrOutput, DnbrParams};

/// Processing-level marker required in scene identifiers (Sentinel-2 Level-2A)
pub const LEVEL_2A_TAG: &str = "MSIL2A";

/// Resolves two scene identifiers to local band paths.
///
/// Implementations must resolve each identifier to exactly one scene, put
/// the earlier one in `pre` and the later one in `post`, and fail if either
/// scene is missing or both share the same acquisition date.
pub trait AcquisitionService {
    type Error: std::error::Error;

    fn acquire(
        &self,
        first_scene: &str,
        second_scene: &str,
    ) -> std::result::Result<DnbrInputs, Self::Error>;
}

/// Check that a scene identifier refers to a Level-2A product
pub fn require_level_2a(scene: &str) -> Result<()> {
    if scene.contains(LEVEL_2A_TAG) {
        Ok(())
    } else {
        Err(Error::MissingInput(format!(
            "scene {} is not a Level-2A ({}) product",
            scene, LEVEL_2A_TAG
        )))
    }
}

/// Acquire two scenes through `service` and compute their dNBR.
///
/// Anything that keeps the service from delivering usable band paths
/// (wrong processing level, scene not found, incomplete paths) is reported
/// as [`Error::MissingInput`].
pub fn calculate_from_service<S: AcquisitionService>(
    service: &S,
    first_scene: &str,
    second_scene: &str,
    params: &DnbrParams,
) -> Result<DnbrOutput> {
    require_level_2a(first_scene)?;
    require_level_2a(second_scene)?;

    let inputs = service.acquire(first_scene, second_scene).map_err(|e| {
        Error::MissingInput(format!(
            "acquisition of {} and {} failed: {}",
            first_scene, second_scene, e
        ))
    })?;
    info!("acquired scenes {} and {}", first_scene, second_scene);

    calculate(&inputs, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Unavailable;

    impl AcquisitionService for Unavailable {
        type Error = io::Error;

        fn acquire(&self, first: &str, _second: &str) -> io::Result<DnbrInputs> {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} could not be found", first),
            ))
        }
    }

    struct Incomplete;

    impl AcquisitionService for Incomplete {
        type Error = io::Error;

        fn acquire(&self, _first: &str, _second: &str) -> io::Result<DnbrInputs> {
            Ok(DnbrInputs::new().with_pre_swir("T32TMK_B12_20m.jp2"))
        }
    }

    const FIRST: &str = "S2A_MSIL2A_20230801T103031_N0509_R108_T32TMK";
    const SECOND: &str = "S2A_MSIL2A_20230821T103031_N0509_R108_T32TMK";

    #[test]
    fn test_level_2a_required() {
        assert!(require_level_2a(FIRST).is_ok());
        let err = require_level_2a("S2A_MSIL1C_20230801T103031").unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_service_failure_is_missing_input() {
        let err = calculate_from_service(&Unavailable, FIRST, SECOND, &DnbrParams::default())
            .unwrap_err();
        match err {
            Error::MissingInput(msg) => assert!(msg.contains("could not be found")),
            other => panic!("expected MissingInput, got {other}"),
        }
    }

    #[test]
    fn test_incomplete_paths_are_missing_input() {
        let err = calculate_from_service(&Incomplete, FIRST, SECOND, &DnbrParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_wrong_level_never_reaches_service() {
        let params = DnbrParams::default();
        let err = calculate_from_service(&Incomplete, "S2B_MSIL1C_X", SECOND, &params).unwrap_err();
        match err {
            Error::MissingInput(msg) => assert!(msg.contains("Level-2A")),
            other => panic!("expected MissingInput, got {other}"),
        }
    }
}
