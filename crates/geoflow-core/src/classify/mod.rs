//! Classification engine: continuous rasters → small ordinal class sets.
//!
//! Three rule kinds: fixed thresholds (NDVI land cover), percentile-derived
//! thresholds (flow accumulation → flood risk), and composite scoring
//! (elevation + slope → site suitability). Every rule is deterministic and
//! monotonic in its driving variable, so the renderer can use a static
//! categorical palette.

pub mod percentile;
pub mod suitability;
pub mod threshold;

use crate::raster::Raster;
use crate::render::Palette;

/// A raster whose sample domain is a small ordinal class set, together with
/// the label list and palette the visualization layer uses.
/// `labels[class - 1]` names class `class`; class 0 (or the dedicated
/// sentinel) is excluded/no-data.
#[derive(Debug, Clone)]
pub struct Classified {
    pub raster: Raster,
    pub labels: &'static [&'static str],
    pub palette: &'static Palette,
}
