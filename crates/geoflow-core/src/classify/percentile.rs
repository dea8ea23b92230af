//! Percentile-derived flood-risk classification.
//!
//! Thresholds are not fixed constants: they are the 70th, 85th and 95th
//! percentiles of the strictly positive flow-accumulation samples, so the
//! class boundaries adapt to each scene. Percentiles use linear
//! interpolation between order statistics.

use crate::classify::Classified;
use crate::error::{ExecError, Result};
use crate::raster::{DType, Raster};
use crate::render::FLOOD_PALETTE;

/// No-data sentinel in the class raster (the U8 range's last value, well
/// clear of classes 0..=3).
pub const FLOOD_NODATA: f32 = 255.0;

pub const FLOOD_LABELS: [&str; 4] = ["Safe", "Low", "Medium", "High"];

/// Linear-interpolation percentile of a sorted, non-empty slice.
/// `p` is in [0, 100]; rank = p/100 * (n-1), value interpolated between the
/// two neighbouring order statistics.
pub fn percentile_sorted(sorted: &[f32], p: f64) -> f32 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// The three flood thresholds (P70, P85, P95) of the positive samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodThresholds {
    pub p70: f32,
    pub p85: f32,
    pub p95: f32,
}

/// Derive flood thresholds from a flow-accumulation raster. Only strictly
/// positive, non-nodata samples contribute; a raster with none is rejected.
pub fn flood_thresholds(flow: &Raster) -> Result<FloodThresholds> {
    let mut samples: Vec<f32> = flow
        .band(0)
        .iter()
        .copied()
        .filter(|&v| v > 0.0 && !flow.is_nodata(v) && v.is_finite())
        .collect();
    if samples.is_empty() {
        return Err(ExecError::InvalidRule(
            "flow accumulation has no positive samples to rank".into(),
        ));
    }
    samples.sort_by(|a, b| a.total_cmp(b));
    Ok(FloodThresholds {
        p70: percentile_sorted(&samples, 70.0),
        p85: percentile_sorted(&samples, 85.0),
        p95: percentile_sorted(&samples, 95.0),
    })
}

impl FloodThresholds {
    /// Class of a single positive accumulation value: 0 safe (≤ P70),
    /// 1 low, 2 medium, 3 high (> P95). Thresholds belong to the lower
    /// class.
    pub fn class_of(&self, value: f32) -> u8 {
        if value > self.p95 {
            3
        } else if value > self.p85 {
            2
        } else if value > self.p70 {
            1
        } else {
            0
        }
    }
}

/// Classify flow accumulation into flood-risk classes. Non-positive and
/// no-data cells get the 255 sentinel.
pub fn classify_flood_risk(flow: &Raster) -> Result<Classified> {
    let thresholds = flood_thresholds(flow)?;
    let mut out = flow.like_single_band(DType::U8, Some(FLOOD_NODATA), FLOOD_NODATA);
    let src = flow.band(0);
    for (dst, &v) in out.data.iter_mut().zip(src) {
        *dst = if flow.is_nodata(v) || !(v > 0.0) {
            FLOOD_NODATA
        } else {
            thresholds.class_of(v) as f32
        };
    }
    Ok(Classified {
        raster: out,
        labels: &FLOOD_LABELS,
        palette: &FLOOD_PALETTE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flow_of(values: Vec<f32>) -> Raster {
        let n = values.len();
        let mut r = Raster::flat(n, 1, 0.0);
        r.data = values;
        r
    }

    #[test]
    fn thresholds_interpolate_between_order_statistics() {
        let flow = flow_of(vec![1.0, 1.0, 2.0, 2.0, 5.0, 5.0, 5.0, 9.0, 9.0, 20.0]);
        let t = flood_thresholds(&flow).unwrap();
        assert_relative_eq!(t.p70, 6.2, epsilon = 1e-5);
        assert_relative_eq!(t.p85, 9.0, epsilon = 1e-5);
        assert_relative_eq!(t.p95, 15.05, epsilon = 1e-4);
    }

    #[test]
    fn maximum_cell_is_always_high_risk() {
        let flow = flow_of(vec![1.0, 1.0, 2.0, 2.0, 5.0, 5.0, 5.0, 9.0, 9.0, 20.0]);
        let classified = classify_flood_risk(&flow).unwrap();
        assert_eq!(classified.raster.data[9], 3.0);
        assert_eq!(classified.labels[3], "High");
    }

    #[test]
    fn threshold_values_belong_to_the_lower_class() {
        let t = FloodThresholds {
            p70: 5.0,
            p85: 9.0,
            p95: 17.0,
        };
        assert_eq!(t.class_of(5.0), 0, "exactly P70 is still safe");
        assert_eq!(t.class_of(5.1), 1);
        assert_eq!(t.class_of(9.0), 1, "exactly P85 is still low");
        assert_eq!(t.class_of(17.0), 2, "exactly P95 is still medium");
        assert_eq!(t.class_of(17.1), 3, "only above P95 is high");
    }

    #[test]
    fn classes_are_monotonic_in_accumulation() {
        let flow = flow_of((1..=100).map(|v| v as f32).collect());
        let t = flood_thresholds(&flow).unwrap();
        let mut last = 0;
        for v in 1..=100 {
            let class = t.class_of(v as f32);
            assert!(class >= last, "class dropped from {last} to {class} at {v}");
            last = class;
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn nonpositive_and_nodata_cells_get_the_sentinel() {
        let mut flow = flow_of(vec![0.0, -3.0, 4.0, 8.0]);
        flow.meta.nodata = Some(-3.0);
        let classified = classify_flood_risk(&flow).unwrap();
        assert_eq!(classified.raster.data[0], FLOOD_NODATA);
        assert_eq!(classified.raster.data[1], FLOOD_NODATA);
        assert!(classified.raster.data[2] < 4.0);
        assert!(classified.raster.data[3] < 4.0);
    }

    #[test]
    fn all_zero_flow_is_rejected() {
        let flow = flow_of(vec![0.0; 9]);
        assert!(matches!(
            classify_flood_risk(&flow),
            Err(ExecError::InvalidRule(_))
        ));
    }

    #[test]
    fn classification_is_deterministic() {
        let flow = flow_of((0..50).map(|v| (v * 7 % 23) as f32 + 1.0).collect());
        let a = classify_flood_risk(&flow).unwrap();
        let b = classify_flood_risk(&flow).unwrap();
        assert_eq!(a.raster.data, b.raster.data);
    }

    #[test]
    fn single_sample_percentile_is_that_sample() {
        assert_eq!(percentile_sorted(&[4.5], 70.0), 4.5);
    }
}
