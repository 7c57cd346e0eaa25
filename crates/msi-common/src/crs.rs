//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG coordinate reference system code.
///
/// The catalog search always happens in geographic coordinates
/// ([`EpsgCode::WGS84`]); point surfaces and the correction tool's output
/// projection carry their own projected code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpsgCode(pub u32);

impl EpsgCode {
    /// WGS84 geographic (lon/lat in degrees).
    pub const WGS84: EpsgCode = EpsgCode(4326);

    /// Parse from strings like "EPSG:2960", "epsg:2960" or plain "2960".
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s
            .rsplit(':')
            .next()
            .unwrap_or(s)
            .trim();
        let code: u32 = digits.parse().ok()?;
        if code == 0 {
            return None;
        }
        Some(EpsgCode(code))
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self.0, 4326 | 4269)
    }
}

impl fmt::Display for EpsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}
