//! Raster geoprocessing operations dispatched by the tool registry.
//!
//! Operations are grid→grid functions that set output dtype, band count,
//! and no-data explicitly before returning. The only filesystem access in
//! this tree is band-file discovery in [`stack`].

pub mod clip;
pub mod fill;
pub mod flow;
pub mod ndvi;
pub mod slope;
pub mod stack;

use crate::raster::{DType, Raster};

/// Binary exceedance mask: `value > threshold → 1`, else 0.
/// No-data samples are carried through as 0.
pub fn threshold_binary(raster: &Raster, threshold: f32) -> Raster {
    let mut out = raster.like_single_band(DType::U8, None, 0.0);
    let src = raster.band(0);
    for (dst, &v) in out.data.iter_mut().zip(src) {
        *dst = if !raster.is_nodata(v) && v > threshold {
            1.0
        } else {
            0.0
        };
    }
    out
}
