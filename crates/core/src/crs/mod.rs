//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
///
/// Equality is structural: an EPSG-coded CRS never equals a WKT-only one,
/// even if they describe the same system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT or citation text, when no EPSG code is known
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether this is a geographic (lat/lon) CRS.
    ///
    /// Only EPSG codes are inspected; geographic 2D systems live in 4000..5000.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(code) if (4000..5000).contains(&code))
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(32633);
        assert_eq!(crs.epsg(), Some(32633));
        assert_eq!(crs.identifier(), "EPSG:32633");
        assert!(!crs.is_geographic());
        assert!(CRS::from_epsg(4326).is_geographic());
    }

    #[test]
    fn test_epsg_and_wkt_are_not_equal() {
        let a = CRS::from_epsg(4326);
        let b = CRS::from_wkt("WGS 84");
        assert_ne!(a, b);
        assert_eq!(b, CRS::from_wkt("WGS 84"));
        assert_eq!(b.identifier(), "WKT:WGS 84");
    }
}
