//! Fixed-threshold classification.
//!
//! A rule is an ordered list of `[lower, upper)` buckets that must partition
//! the declared value range with no gaps or overlaps — validated at
//! construction. Samples below the lowest or above the highest bound are
//! clamped to the nearest class rather than dropped, so out-of-range values
//! are never silently lost.

use crate::classify::Classified;
use crate::error::{ExecError, Result};
use crate::raster::{DType, Raster};
use crate::render::LULC_PALETTE;

/// One `[lower, upper)` bucket mapping to an ordinal class id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub lower: f32,
    pub upper: f32,
    pub class: u8,
}

#[derive(Debug, Clone)]
pub struct ThresholdRule {
    buckets: Vec<Bucket>,
}

impl ThresholdRule {
    /// Build a rule, validating the partition precondition: buckets must be
    /// non-empty, strictly ordered, and contiguous (no gaps, no overlaps).
    pub fn new(buckets: Vec<Bucket>) -> Result<Self> {
        if buckets.is_empty() {
            return Err(ExecError::InvalidRule("empty threshold rule".into()));
        }
        for b in &buckets {
            if !(b.lower < b.upper) {
                return Err(ExecError::InvalidRule(format!(
                    "bucket [{}, {}) is empty or inverted",
                    b.lower, b.upper
                )));
            }
        }
        for pair in buckets.windows(2) {
            if pair[0].upper != pair[1].lower {
                return Err(ExecError::InvalidRule(format!(
                    "buckets [{}, {}) and [{}, {}) leave a gap or overlap",
                    pair[0].lower, pair[0].upper, pair[1].lower, pair[1].upper
                )));
            }
        }
        Ok(Self { buckets })
    }

    /// Class of a single sample; out-of-range values clamp to the nearest
    /// declared class.
    pub fn class_of(&self, value: f32) -> u8 {
        let first = &self.buckets[0];
        let last = &self.buckets[self.buckets.len() - 1];
        if value < first.lower {
            return first.class;
        }
        if value >= last.upper {
            return last.class;
        }
        for b in &self.buckets {
            if value >= b.lower && value < b.upper {
                return b.class;
            }
        }
        // Unreachable for finite values given the partition precondition;
        // NaN falls through to the lowest class.
        first.class
    }

    /// Classify a single-band raster. No-data samples keep class 0.
    pub fn classify(&self, raster: &Raster) -> Raster {
        let mut out = raster.like_single_band(DType::U8, Some(0.0), 0.0);
        let src = raster.band(0);
        for (dst, &v) in out.data.iter_mut().zip(src) {
            *dst = if raster.is_nodata(v) {
                0.0
            } else {
                self.class_of(v) as f32
            };
        }
        out
    }
}

/// NDVI → land-use/land-cover classes 1..=5.
pub fn landcover_rule() -> ThresholdRule {
    // The partition is validated in tests; constructing it cannot fail.
    ThresholdRule {
        buckets: vec![
            Bucket { lower: -1.0, upper: 0.0, class: 1 }, // Water
            Bucket { lower: 0.0, upper: 0.2, class: 2 },  // Barren
            Bucket { lower: 0.2, upper: 0.4, class: 3 },  // Built-up
            Bucket { lower: 0.4, upper: 0.6, class: 4 },  // Sparse Vegetation
            Bucket { lower: 0.6, upper: 1.0, class: 5 },  // Dense Vegetation
        ],
    }
}

pub const LANDCOVER_LABELS: [&str; 5] =
    ["Water", "Barren", "Built-up", "Sparse Vegetation", "Dense Vegetation"];

/// Classify an NDVI raster into land-cover classes.
pub fn classify_landcover(ndvi: &Raster) -> Classified {
    Classified {
        raster: landcover_rule().classify(ndvi),
        labels: &LANDCOVER_LABELS,
        palette: &LULC_PALETTE,
    }
}
