//! Normalized Difference Vegetation Index.
//!
//! NDVI = (NIR − RED) / (NIR + RED + ε), ε = 1e-6 against zero division.
//! Output is single-band F32 in [−1, 1].

use crate::error::{ExecError, Result};
use crate::ops::stack::{NIR_BAND, RED_BAND};
use crate::raster::{DType, Raster};

pub const EPSILON: f32 = 1e-6;

/// Compute NDVI from a Sentinel-2 band stack (B02/B03/B04/B08 order).
pub fn compute_ndvi(stack: &Raster) -> Result<Raster> {
    if stack.meta.bands <= NIR_BAND {
        return Err(ExecError::InvalidRule(format!(
            "NDVI needs a 4-band stack, raster has {} band(s)",
            stack.meta.bands
        )));
    }
    ndvi_from_slices(stack, stack.band(NIR_BAND), stack.band(RED_BAND))
}

/// Compute NDVI from separate NIR and red rasters sharing one grid.
pub fn ndvi_from_bands(nir: &Raster, red: &Raster) -> Result<Raster> {
    if nir.width() != red.width() || nir.height() != red.height() {
        return Err(ExecError::ShapeMismatch {
            actual: red.data.len(),
            expected: nir.meta.width * nir.meta.height,
            width: nir.meta.width,
            height: nir.meta.height,
            bands: 1,
        });
    }
    ndvi_from_slices(nir, nir.band(0), red.band(0))
}

fn ndvi_from_slices(meta_src: &Raster, nir: &[f32], red: &[f32]) -> Result<Raster> {
    let mut out = meta_src.like_single_band(DType::F32, meta_src.meta.nodata, 0.0);
    for ((dst, &n), &r) in out.data.iter_mut().zip(nir).zip(red) {
        *dst = (n - r) / (n + r + EPSILON);
    }
    out.validate_shape()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ndvi_matches_hand_computed_value() {
        let mut nir = Raster::flat(1, 1, 0.0);
        nir.data = vec![0.5];
        let mut red = Raster::flat(1, 1, 0.0);
        red.data = vec![0.1];
        let ndvi = ndvi_from_bands(&nir, &red).unwrap();
        assert_relative_eq!(ndvi.data[0], 0.4 / 0.600001, epsilon = 1e-6);
        assert!(ndvi.data[0] > 0.6, "0.6667 must land in the top class range");
    }

    #[test]
    fn zero_bands_do_not_divide_by_zero() {
        let nir = Raster::flat(2, 2, 0.0);
        let red = Raster::flat(2, 2, 0.0);
        let ndvi = ndvi_from_bands(&nir, &red).unwrap();
        assert!(ndvi.data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn stack_ndvi_uses_b04_and_b08() {
        let mut meta = Raster::flat(1, 1, 0.0).meta;
        meta.bands = 4;
        let stack = Raster {
            meta,
            // B02, B03, B04 (red), B08 (nir)
            data: vec![9.0, 9.0, 0.1, 0.5],
        };
        let ndvi = compute_ndvi(&stack).unwrap();
        assert_relative_eq!(ndvi.data[0], 0.4 / 0.600001, epsilon = 1e-6);
    }

    #[test]
    fn single_band_raster_is_rejected() {
        let r = Raster::flat(2, 2, 1.0);
        assert!(matches!(
            compute_ndvi(&r),
            Err(ExecError::InvalidRule(_))
        ));
    }
}
