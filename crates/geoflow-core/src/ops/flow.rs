//! D8 flow accumulation.
//!
//! Single-flow-direction routing: each cell drains to the neighbour with the
//! steepest distance-weighted descent. Accumulation is the count of upstream
//! contributing cells, including the cell itself, so every valid cell is ≥ 1.

use crate::raster::{DType, Raster};

const SQRT2: f32 = std::f32::consts::SQRT_2;

const NEIGHBORS: [(i64, i64, f32); 8] = [
    (-1, -1, SQRT2), (-1, 0, 1.0), (-1, 1, SQRT2),
    (0, -1, 1.0),                  (0, 1, 1.0),
    (1, -1, SQRT2),  (1, 0, 1.0),  (1, 1, SQRT2),
];

/// Steepest-descent receiver of each cell, or `None` for sinks/flats,
/// no-data cells, and cells draining off the grid edge.
fn d8_receivers(dem: &Raster) -> Vec<Option<usize>> {
    let w = dem.width();
    let h = dem.height();
    let mut receivers = vec![None; w * h];

    for r in 0..h {
        for c in 0..w {
            let z = dem.get(r, c);
            if dem.is_nodata(z) {
                continue;
            }
            let mut best: Option<(usize, f32)> = None;
            for &(dr, dc, dist) in &NEIGHBORS {
                let nr = r as i64 + dr;
                let nc = c as i64 + dc;
                if nr < 0 || nc < 0 || nr >= h as i64 || nc >= w as i64 {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                let nz = dem.get(nr, nc);
                if dem.is_nodata(nz) {
                    continue;
                }
                let drop = (z - nz) / dist;
                if drop > 0.0 && best.map_or(true, |(_, d)| drop > d) {
                    best = Some((nr * w + nc, drop));
                }
            }
            receivers[r * w + c] = best.map(|(idx, _)| idx);
        }
    }
    receivers
}

/// Compute the D8 flow accumulation grid of a (depression-filled) DEM.
///
/// Output dtype is `U32`; 0 is the no-data sentinel (valid cells count
/// themselves and are therefore always ≥ 1).
pub fn flow_accumulation(dem: &Raster) -> Raster {
    let w = dem.width();
    let h = dem.height();
    let receivers = d8_receivers(dem);

    let mut acc = vec![0u32; w * h];
    let mut order: Vec<usize> = Vec::with_capacity(w * h);
    for idx in 0..w * h {
        if !dem.is_nodata(dem.data[idx]) {
            acc[idx] = 1;
            order.push(idx);
        }
    }
    // Process highest cells first so every donor is finalised before its
    // receiver is read.
    order.sort_by(|&a, &b| {
        dem.data[b]
            .partial_cmp(&dem.data[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for &idx in &order {
        if let Some(rcv) = receivers[idx] {
            acc[rcv] += acc[idx];
        }
    }

    let mut out = dem.like_single_band(DType::U32, Some(0.0), 0.0);
    for (dst, &a) in out.data.iter_mut().zip(&acc) {
        *dst = a as f32;
    }
    out
}
