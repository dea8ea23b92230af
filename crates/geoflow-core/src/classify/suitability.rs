//! Composite site-suitability scoring from elevation and slope.
//!
//! Each input is scored independently on a small ordinal scale, the scores
//! are summed and halved (integer division), and the result is clamped to
//! [1, 5]. Cells at or below sea level are excluded with class 0.

use crate::classify::Classified;
use crate::error::{ExecError, Result};
use crate::raster::{DType, Raster};
use crate::render::SUITABILITY_PALETTE;

pub const SUITABILITY_LABELS: [&str; 5] =
    ["Very Low", "Low", "Moderate", "High", "Very High"];

/// Elevation preference: low-lying land scores best, 1..=5 by band.
fn elevation_score(elev: f32) -> u8 {
    if elev < 5.0 {
        5
    } else if elev < 20.0 {
        4
    } else if elev < 50.0 {
        3
    } else if elev < 100.0 {
        2
    } else {
        1
    }
}

/// Slope preference: flat terrain scores 5, moderate 3, steep 1.
fn slope_score(slope_deg: f32) -> u8 {
    if slope_deg < 5.0 {
        5
    } else if slope_deg < 15.0 {
        3
    } else {
        1
    }
}

/// Combine per-cell elevation and slope scores into suitability classes
/// 1..=5; elevation ≤ 0 (sea or invalid) and no-data cells get class 0.
pub fn classify_suitability(elevation: &Raster, slope_deg: &Raster) -> Result<Classified> {
    if elevation.width() != slope_deg.width() || elevation.height() != slope_deg.height() {
        return Err(ExecError::ShapeMismatch {
            actual: slope_deg.data.len(),
            expected: elevation.meta.width * elevation.meta.height,
            width: elevation.meta.width,
            height: elevation.meta.height,
            bands: 1,
        });
    }

    let mut out = elevation.like_single_band(DType::U8, Some(0.0), 0.0);
    let elev = elevation.band(0);
    let slope = slope_deg.band(0);
    for ((dst, &e), &s) in out.data.iter_mut().zip(elev).zip(slope) {
        *dst = if elevation.is_nodata(e) || slope_deg.is_nodata(s) || e <= 0.0 {
            0.0
        } else {
            let sum = elevation_score(e) + slope_score(s);
            (sum / 2).clamp(1, 5) as f32
        };
    }
    Ok(Classified {
        raster: out,
        labels: &SUITABILITY_LABELS,
        palette: &SUITABILITY_PALETTE,
    })
}
