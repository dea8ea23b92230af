//! Depression filling (Planchon–Darboux).
//!
//! Raises local minima so that every valid cell has a non-ascending path to
//! the grid edge. Contract: output spatial metadata is identical to the
//! input's, and every cell's elevation is ≥ its pre-fill elevation.

use crate::raster::Raster;

/// Minimal elevation step between a cell and its downslope neighbour,
/// so filled flats still drain under steepest-descent routing.
const EPSILON: f32 = 1e-3;

const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Fill depressions in a single-band DEM.
///
/// Planchon–Darboux: initialise the water surface to the DEM on the edges
/// (and at no-data cells, which act as outlets) and +∞ in the interior, then
/// sweep in alternating scan orders, lowering each cell towards
/// `max(dem, min_neighbour + ε)` until a fixed point is reached.
pub fn fill_depressions(dem: &Raster) -> Raster {
    let w = dem.width();
    let h = dem.height();
    let mut out = dem.clone();

    if w < 3 || h < 3 {
        return out;
    }

    let interior = |r: usize, c: usize| -> bool {
        r > 0 && c > 0 && r < h - 1 && c < w - 1 && !dem.is_nodata(dem.get(r, c))
    };

    for r in 1..h - 1 {
        for c in 1..w - 1 {
            if interior(r, c) {
                out.set(r, c, f32::INFINITY);
            }
        }
    }

    // Alternating forward/backward sweeps converge quickly on real DEMs; the
    // iteration cap guards against pathological inputs.
    let max_sweeps = 4 * (w + h);
    for sweep in 0..max_sweeps {
        let mut changed = false;
        let rows: Vec<usize> = if sweep % 2 == 0 {
            (1..h - 1).collect()
        } else {
            (1..h - 1).rev().collect()
        };
        for &r in &rows {
            let cols: Vec<usize> = if sweep % 2 == 0 {
                (1..w - 1).collect()
            } else {
                (1..w - 1).rev().collect()
            };
            for &c in &cols {
                if !interior(r, c) {
                    continue;
                }
                let z = dem.get(r, c);
                let mut surface = out.get(r, c);
                if surface <= z {
                    continue;
                }
                for &(dr, dc) in &NEIGHBORS {
                    let nr = (r as i64 + dr) as usize;
                    let nc = (c as i64 + dc) as usize;
                    let nv = dem.get(nr, nc);
                    // No-data neighbours drain freely.
                    let neighbour = if dem.is_nodata(nv) {
                        f32::NEG_INFINITY
                    } else {
                        out.get(nr, nc)
                    };
                    if z >= neighbour + EPSILON {
                        out.set(r, c, z);
                        surface = z;
                        changed = true;
                        break;
                    }
                    if surface > neighbour + EPSILON {
                        surface = neighbour + EPSILON;
                        out.set(r, c, surface);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5×5 plateau at 10 m with a single-cell pit at the centre.
    fn pit_dem() -> Raster {
        let mut dem = Raster::flat(5, 5, 10.0);
        dem.set(2, 2, 2.0);
        dem
    }

    #[test]
    fn single_pit_is_raised_to_the_rim() {
        let dem = pit_dem();
        let filled = fill_depressions(&dem);
        let v = filled.get(2, 2);
        assert!(
            v >= 10.0 - 0.01 && v <= 10.0 + 0.01,
            "pit should fill to rim level, got {v}"
        );
    }

    #[test]
    fn output_never_lowers_a_cell() {
        let dem = pit_dem();
        let filled = fill_depressions(&dem);
        for (before, after) in dem.data.iter().zip(&filled.data) {
            assert!(after >= before, "fill lowered a cell: {before} -> {after}");
        }
    }

    #[test]
    fn spatial_metadata_is_unchanged() {
        let dem = pit_dem();
        let filled = fill_depressions(&dem);
        assert_eq!(filled.meta, dem.meta);
    }

    #[test]
    fn draining_ramp_is_left_alone() {
        let mut dem = Raster::flat(6, 6, 0.0);
        for r in 0..6 {
            for c in 0..6 {
                dem.set(r, c, c as f32 * 5.0);
            }
        }
        let filled = fill_depressions(&dem);
        assert_eq!(filled.data, dem.data);
    }
}
