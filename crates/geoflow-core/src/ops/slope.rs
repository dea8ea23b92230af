//! Per-cell terrain slope (Horn method).
//!
//! Horn's (1981) 3×3 weighted finite-difference gradient:
//!   dz/dx = ((NE + 2·E + SE) − (NW + 2·W + SW)) / (8 · cellsize)
//!   dz/dy = ((NW + 2·N + NE) − (SW + 2·S + SE)) / (8 · cellsize)
//!   slope = atan(√(dz_dx² + dz_dy²))
//!
//! Border cells use an index-clamped neighbourhood; no-data cells propagate
//! the sentinel.

use crate::raster::{DType, Raster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeUnits {
    Degrees,
    Percent,
}

/// Compute a slope raster from a single-band DEM.
pub fn compute_slope(dem: &Raster, units: SlopeUnits) -> Raster {
    let w = dem.width();
    let h = dem.height();
    let cellsize = dem.meta.cellsize_m();
    let nodata = dem.meta.nodata.unwrap_or(-9999.0);
    let mut out = dem.like_single_band(DType::F32, Some(nodata), 0.0);

    // Clamped fetch: borders replicate their nearest cell, no-data
    // neighbours fall back to the centre elevation.
    let at = |r: i64, c: i64, center: f32| -> f64 {
        let r = r.clamp(0, h as i64 - 1) as usize;
        let c = c.clamp(0, w as i64 - 1) as usize;
        let v = dem.get(r, c);
        if dem.is_nodata(v) {
            center as f64
        } else {
            v as f64
        }
    };

    for r in 0..h {
        for c in 0..w {
            let z = dem.get(r, c);
            if dem.is_nodata(z) {
                out.set(r, c, nodata);
                continue;
            }
            let (ri, ci) = (r as i64, c as i64);
            let nw = at(ri - 1, ci - 1, z);
            let n = at(ri - 1, ci, z);
            let ne = at(ri - 1, ci + 1, z);
            let wv = at(ri, ci - 1, z);
            let e = at(ri, ci + 1, z);
            let sw = at(ri + 1, ci - 1, z);
            let s = at(ri + 1, ci, z);
            let se = at(ri + 1, ci + 1, z);

            let dz_dx = ((ne + 2.0 * e + se) - (nw + 2.0 * wv + sw)) / (8.0 * cellsize);
            let dz_dy = ((nw + 2.0 * n + ne) - (sw + 2.0 * s + se)) / (8.0 * cellsize);
            let rise = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();

            let value = match units {
                SlopeUnits::Degrees => rise.atan().to_degrees(),
                SlopeUnits::Percent => rise * 100.0,
            };
            out.set(r, c, value.max(0.0) as f32);
        }
    }
    out
}
