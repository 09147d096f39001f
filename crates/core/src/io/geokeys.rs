//! GeoKey directory handling.
//!
//! A CRS is written either as an EPSG code in `ProjectedCSTypeGeoKey` /
//! `GeographicTypeGeoKey`, or as `GTCitationGeoKey` text for anything else.
//! On read, the projected key decides: a user-defined projection is kept as
//! an opaque description of its keys, never collapsed to its datum code.

use crate::crs::CRS;
use crate::error::{Error, Result};

// Key value locations (tag IDs holding out-of-line values)
pub(crate) const GEO_DOUBLE_PARAMS: u16 = 34736;
pub(crate) const GEO_ASCII_PARAMS: u16 = 34737;

// GeoKey IDs
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Build the GeoKeyDirectory and, when needed, the GeoAsciiParams text.
///
/// Keys are emitted in ascending ID order as the GeoTIFF format requires.
/// An EPSG code outside the GeoKey value range is only accepted when the
/// CRS also carries WKT to cite instead.
pub(crate) fn build_geokeys(crs: Option<&CRS>) -> Result<(Vec<u16>, Option<String>)> {
    let mut entries: Vec<[u16; 4]> = Vec::new();
    let mut ascii = None;

    match crs {
        Some(crs) => {
            let code = crs.epsg().and_then(|c| u16::try_from(c).ok());
            match (code, crs.wkt()) {
                (Some(code), _) if crs.is_geographic() => {
                    entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
                    entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
                    entries.push([GEOGRAPHIC_TYPE, 0, 1, code]);
                }
                (Some(code), _) => {
                    entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
                    entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
                    entries.push([PROJECTED_CS_TYPE, 0, 1, code]);
                }
                (None, Some(wkt)) => {
                    let text = format!("{}|", wkt);
                    let count = u16::try_from(text.len()).map_err(|_| {
                        Error::Other(format!("CRS text too long ({} bytes)", text.len()))
                    })?;
                    entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
                    entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
                    entries.push([GT_CITATION, GEO_ASCII_PARAMS, count, 0]);
                    entries.push([PROJECTED_CS_TYPE, 0, 1, USER_DEFINED]);
                    ascii = Some(text);
                }
                (None, None) => {
                    return Err(Error::Other(format!(
                        "CRS {} cannot be stored as a GeoTIFF key",
                        crs
                    )));
                }
            }
        }
        None => {
            entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
        }
    }

    // Version 1.1.0, then the key count
    let mut keys = vec![1, 1, 0, entries.len() as u16];
    for entry in entries {
        keys.extend_from_slice(&entry);
    }
    Ok((keys, ascii))
}

/// One entry of a GeoKeyDirectory
#[derive(Debug, Clone, Copy)]
struct GeoKey {
    id: u16,
    location: u16,
    count: u16,
    value: u16,
}

impl GeoKey {
    /// Inline value, if the key stores one
    fn short(&self) -> Option<u16> {
        (self.location == 0).then_some(self.value)
    }

    /// Render the key's value, resolving out-of-line doubles and text
    fn describe(&self, doubles: &[f64], ascii: Option<&str>) -> Option<String> {
        match self.location {
            0 => Some(self.value.to_string()),
            GEO_DOUBLE_PARAMS => {
                let params = param_range(doubles, self.value, self.count)?;
                let params: Vec<String> = params.iter().map(|v| v.to_string()).collect();
                Some(params.join(" "))
            }
            GEO_ASCII_PARAMS => ascii_param(ascii, self.value, self.count),
            _ => None,
        }
    }
}

fn param_range<T>(values: &[T], offset: u16, count: u16) -> Option<&[T]> {
    let start = offset as usize;
    values.get(start..start + count as usize)
}

fn ascii_param(ascii: Option<&str>, offset: u16, count: u16) -> Option<String> {
    let bytes = param_range(ascii?.as_bytes(), offset, count)?;
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches(['|', '\0']);
    (!text.is_empty()).then(|| text.to_string())
}

fn is_epsg_code(code: u16) -> bool {
    (1..USER_DEFINED).contains(&code)
}

/// Extract a CRS from a GeoKeyDirectory.
///
/// `ProjectedCSTypeGeoKey` takes precedence over `GeographicTypeGeoKey`, so
/// a user-defined projection on an EPSG datum is not read as that datum.
/// User-defined systems become an opaque CRS built from the citation and
/// every remaining key value; with nothing to describe there is no CRS.
pub(crate) fn parse_crs(keys: &[u16], doubles: &[f64], ascii: Option<&str>) -> Option<CRS> {
    if keys.len() < 4 {
        return None;
    }
    let num_keys = keys[3] as usize;
    let entries: Vec<GeoKey> = keys[4..]
        .chunks_exact(4)
        .take(num_keys)
        .map(|e| GeoKey {
            id: e[0],
            location: e[1],
            count: e[2],
            value: e[3],
        })
        .collect();

    let short = |id: u16| entries.iter().find(|k| k.id == id).and_then(GeoKey::short);

    let epsg = match (short(PROJECTED_CS_TYPE), short(GEOGRAPHIC_TYPE)) {
        (Some(code), _) => Some(code),
        (None, geographic) => geographic,
    };
    if let Some(code) = epsg.filter(|&c| is_epsg_code(c)) {
        return Some(CRS::from_epsg(u32::from(code)));
    }

    let citation = entries
        .iter()
        .find(|k| k.id == GT_CITATION && k.location == GEO_ASCII_PARAMS)
        .and_then(|k| ascii_param(ascii, k.value, k.count));

    let definition: Vec<String> = entries
        .iter()
        .filter(|k| !matches!(k.id, GT_MODEL_TYPE | GT_RASTER_TYPE | GT_CITATION))
        .filter(|k| !(k.id == PROJECTED_CS_TYPE && k.short() == Some(USER_DEFINED)))
        .filter_map(|k| k.describe(doubles, ascii).map(|v| format!("{}={}", k.id, v)))
        .collect();

    match (citation, definition.is_empty()) {
        (Some(citation), true) => Some(CRS::from_wkt(citation)),
        (Some(citation), false) => Some(CRS::from_wkt(format!(
            "{} GEOKEYS[{}]",
            citation,
            definition.join(", ")
        ))),
        (None, false) => Some(CRS::from_wkt(format!("GEOKEYS[{}]", definition.join(", ")))),
        (None, true) => None,
    }
}
