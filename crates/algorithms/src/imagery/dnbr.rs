//! Differenced Normalized Burn Ratio pipeline
//!
//! Reads the pre- and post-fire SWIR/NIR (and optional SCL) bands, checks
//! that every band sits on the same grid, and produces either a continuous
//! dNBR raster or a burn severity classification.
//!
//! Input paths are a plain value passed into each call; nothing is cached
//! between calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use firescar_core::io::{read_raster, write_raster};
use firescar_core::raster::{shared_descriptor, Check, GeoDescriptor, Raster, RasterBand};
use firescar_core::{Algorithm, Error, Result};

use super::nbr::nbr;
use super::severity::{clear_undefined, classify_severity, dnbr_difference, SeverityHistogram};
use super::water_mask::{combine_water_masks, water_mask};

/// Band paths for one acquisition (time point)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcquisitionPaths {
    /// Shortwave infrared band (required)
    pub swir: Option<PathBuf>,
    /// Near-infrared band (required)
    pub nir: Option<PathBuf>,
    /// Scene classification band (optional, used for water masking)
    pub scl: Option<PathBuf>,
}

impl AcquisitionPaths {
    fn required(&self) -> Option<(&Path, &Path)> {
        Some((self.swir.as_deref()?, self.nir.as_deref()?))
    }
}

/// Input bands for a dNBR computation.
///
/// # Example
/// ```ignore
/// let inputs = DnbrInputs::new()
///     .with_pre_swir("pre_B12.tif")
///     .with_pre_nir("pre_B8A.tif")
///     .with_post_swir("post_B12.tif")
///     .with_post_nir("post_B8A.tif");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DnbrInputs {
    pub pre: AcquisitionPaths,
    pub post: AcquisitionPaths,
}

impl DnbrInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pre_swir(mut self, path: impl Into<PathBuf>) -> Self {
        self.pre.swir = Some(path.into());
        self
    }

    pub fn with_pre_nir(mut self, path: impl Into<PathBuf>) -> Self {
        self.pre.nir = Some(path.into());
        self
    }

    pub fn with_pre_scl(mut self, path: impl Into<PathBuf>) -> Self {
        self.pre.scl = Some(path.into());
        self
    }

    pub fn with_post_swir(mut self, path: impl Into<PathBuf>) -> Self {
        self.post.swir = Some(path.into());
        self
    }

    pub fn with_post_nir(mut self, path: impl Into<PathBuf>) -> Self {
        self.post.nir = Some(path.into());
        self
    }

    pub fn with_post_scl(mut self, path: impl Into<PathBuf>) -> Self {
        self.post.scl = Some(path.into());
        self
    }

    /// Parse inputs from a JSON document such as
    /// `{"pre": {"swir": "a.tif", "nir": "b.tif"}, "post": {...}}`.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(format!("invalid dNBR inputs: {}", e)))
    }

    /// Names of required bands that have no path
    pub fn missing_bands(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pre.swir.is_none() {
            missing.push("pre-fire SWIR");
        }
        if self.pre.nir.is_none() {
            missing.push("pre-fire NIR");
        }
        if self.post.swir.is_none() {
            missing.push("post-fire SWIR");
        }
        if self.post.nir.is_none() {
            missing.push("post-fire NIR");
        }
        missing
    }
}

/// Output representation of a dNBR computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// 8-bit burn severity class codes (0-6)
    #[default]
    Classified,
    /// Floating-point dNBR with undefined values cleared to 0
    Continuous,
}

/// Parameters for a dNBR computation
#[derive(Debug, Clone, Default)]
pub struct DnbrParams {
    /// Where to write the result; the grid is returned either way
    pub output: Option<PathBuf>,
    pub mode: OutputMode,
}

impl DnbrParams {
    pub fn classified() -> Self {
        Self::default()
    }

    pub fn continuous() -> Self {
        Self {
            output: None,
            mode: OutputMode::Continuous,
        }
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }
}

/// Result grid of a dNBR computation, georeferenced like the inputs
#[derive(Debug, Clone)]
pub enum DnbrOutput {
    Continuous(Raster<f64>),
    Classified(Raster<u8>),
}

impl DnbrOutput {
    pub fn mode(&self) -> OutputMode {
        match self {
            DnbrOutput::Continuous(_) => OutputMode::Continuous,
            DnbrOutput::Classified(_) => OutputMode::Classified,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        match self {
            DnbrOutput::Continuous(r) => r.shape(),
            DnbrOutput::Classified(r) => r.shape(),
        }
    }

    pub fn as_continuous(&self) -> Option<&Raster<f64>> {
        match self {
            DnbrOutput::Continuous(r) => Some(r),
            DnbrOutput::Classified(_) => None,
        }
    }

    pub fn as_classified(&self) -> Option<&Raster<u8>> {
        match self {
            DnbrOutput::Classified(r) => Some(r),
            DnbrOutput::Continuous(_) => None,
        }
    }

    /// Write as a single-band GeoTIFF (float64 or uint8)
    pub fn write(&self, path: &Path) -> Result<()> {
        match self {
            DnbrOutput::Continuous(r) => write_raster(r, path),
            DnbrOutput::Classified(r) => write_raster(r, path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Epoch {
    Pre,
    Post,
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Epoch::Pre => f.write_str("pre-fire"),
            Epoch::Post => f.write_str("post-fire"),
        }
    }
}

/// Validated bands of one acquisition
struct Acquisition {
    descriptor: GeoDescriptor,
    swir: Raster<f64>,
    nir: Raster<f64>,
    water_mask: Option<Raster<u8>>,
}

impl Acquisition {
    fn load(
        epoch: Epoch,
        swir_path: &Path,
        nir_path: &Path,
        scl_path: Option<&Path>,
    ) -> Result<Self> {
        let swir: RasterBand<f64> = read_raster(swir_path)?;
        let nir: RasterBand<f64> = read_raster(nir_path)?;

        let descriptor = shared_descriptor(
            &format!("{} SWIR/NIR", epoch),
            &[&swir.descriptor(), &nir.descriptor()],
            Check::Geometry,
        )?;
        info!(
            "{} acquisition: {} x {}, crs {}",
            epoch,
            descriptor.width,
            descriptor.height,
            descriptor.crs.as_ref().map_or_else(|| "none".to_string(), |c| c.to_string())
        );

        let water_mask = match scl_path {
            Some(path) => load_water_mask(epoch, path, &descriptor)?,
            None => {
                debug!("{}: no SCL band, no water mask", epoch);
                None
            }
        };

        Ok(Self {
            descriptor,
            swir: swir.into_raster(),
            nir: nir.into_raster(),
            water_mask,
        })
    }

    /// Consume the bands, keeping only the NBR grid and the water mask
    fn into_nbr(self) -> Result<(Raster<f64>, Option<Raster<u8>>)> {
        let ratio = nbr(&self.nir, &self.swir)?;
        Ok((ratio, self.water_mask))
    }
}

/// Read an SCL band and turn it into a water mask.
///
/// An SCL band on a different grid than SWIR/NIR is ignored with a warning.
fn load_water_mask(
    epoch: Epoch,
    path: &Path,
    descriptor: &GeoDescriptor,
) -> Result<Option<Raster<u8>>> {
    let scl: RasterBand<f64> = read_raster(path)?;

    if let Some(field) = descriptor.first_mismatch(&scl.descriptor(), Check::Geometry) {
        warn!(
            "{}: ignoring SCL band {} ({} differs from SWIR/NIR)",
            epoch,
            path.display(),
            field
        );
        return Ok(None);
    }

    water_mask(&scl.raster).map(Some)
}

/// Compute dNBR from pre- and post-fire bands.
///
/// Steps, each failing fast:
/// 1. all four SWIR/NIR paths must be set ([`Error::MissingInput`]);
/// 2. each acquisition's SWIR and NIR must share width, height, CRS and transform;
/// 3. the two acquisitions must share those and the pixel type;
/// 4. NBR per acquisition, water mask, difference, then the requested output mode.
///
/// When `params.output` is set the result is also written there; nothing
/// is written if any validation fails.
pub fn calculate(inputs: &DnbrInputs, params: &DnbrParams) -> Result<DnbrOutput> {
    let (Some((pre_swir, pre_nir)), Some((post_swir, post_nir))) =
        (inputs.pre.required(), inputs.post.required())
    else {
        return Err(Error::MissingInput(format!(
            "required band(s) not set: {}",
            inputs.missing_bands().join(", ")
        )));
    };

    let pre = Acquisition::load(Epoch::Pre, pre_swir, pre_nir, inputs.pre.scl.as_deref())?;
    let post = Acquisition::load(Epoch::Post, post_swir, post_nir, inputs.post.scl.as_deref())?;

    pre.descriptor
        .ensure_compatible(&post.descriptor, Check::GeometryAndType, "pre-fire/post-fire")?;
    let descriptor = pre.descriptor.clone();

    let (pre_nbr, pre_mask) = pre.into_nbr()?;
    let (post_nbr, post_mask) = post.into_nbr()?;

    let mask = combine_water_masks(descriptor.shape(), pre_mask.as_ref(), post_mask.as_ref())?;
    debug!(
        "water mask excludes {} of {} pixels",
        mask.data().iter().filter(|&&m| m == 0).count(),
        mask.len()
    );

    let mut dnbr = dnbr_difference(&pre_nbr, &post_nbr, &mask)?;
    dnbr.set_transform(descriptor.transform);
    dnbr.set_crs(descriptor.crs.clone());

    let output = match params.mode {
        OutputMode::Continuous => {
            clear_undefined(&mut dnbr);
            let stats = dnbr.statistics();
            debug!(
                "dNBR range {:?}..{:?}, mean {:?}",
                stats.min, stats.max, stats.mean
            );
            DnbrOutput::Continuous(dnbr)
        }
        OutputMode::Classified => {
            let classes = classify_severity(&dnbr)?;
            info!("burn severity: {}", SeverityHistogram::from_raster(&classes));
            DnbrOutput::Classified(classes)
        }
    };

    if let Some(path) = &params.output {
        output.write(path)?;
        info!("dNBR saved to: {}", path.display());
    }

    Ok(output)
}

/// dNBR burn severity algorithm
#[derive(Debug, Clone, Default)]
pub struct Dnbr;

impl Algorithm for Dnbr {
    type Input = DnbrInputs;
    type Output = DnbrOutput;
    type Params = DnbrParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "dNBR"
    }

    fn description(&self) -> &'static str {
        "Differenced Normalized Burn Ratio with optional burn severity classification"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        calculate(&input, &params)
    }
}
