//! Clip a raster to a boundary polygon.
//!
//! The output grid is the raster extent cropped to the polygon's bounding
//! box; cells whose centre falls outside the polygon are set to the no-data
//! sentinel. Width, height and transform are updated together.

use crate::boundary::Boundary;
use crate::error::{ExecError, Result};
use crate::raster::{Raster, RasterMeta};

/// Default sentinel for clipped-away cells when the source declares none.
const CLIP_NODATA: f32 = -9999.0;

pub fn clip_to_boundary(raster: &Raster, boundary: &Boundary) -> Result<Raster> {
    if boundary.crs != raster.meta.crs {
        return Err(ExecError::CrsMismatch {
            boundary: boundary.crs.clone(),
            raster: raster.meta.crs.clone(),
        });
    }

    let (bx0, by0, bx1, by1) = boundary.bbox();
    let (rx0, ry0, rx1, ry1) = raster.meta.bounds();
    let ix0 = bx0.max(rx0);
    let iy0 = by0.max(ry0);
    let ix1 = bx1.min(rx1);
    let iy1 = by1.min(ry1);
    if ix0 >= ix1 || iy0 >= iy1 {
        return Err(ExecError::NoOverlap);
    }

    let t = raster.meta.transform;
    // North-up: row index grows southward (pixel_height < 0).
    let c0 = (((ix0 - t.origin_x) / t.pixel_width).floor() as i64).clamp(0, raster.width() as i64 - 1) as usize;
    let c1 = (((ix1 - t.origin_x) / t.pixel_width).ceil() as i64).clamp(1, raster.width() as i64) as usize;
    let r0 = (((iy1 - t.origin_y) / t.pixel_height).floor() as i64).clamp(0, raster.height() as i64 - 1) as usize;
    let r1 = (((iy0 - t.origin_y) / t.pixel_height).ceil() as i64).clamp(1, raster.height() as i64) as usize;
    if c1 <= c0 || r1 <= r0 {
        return Err(ExecError::NoOverlap);
    }

    let width = c1 - c0;
    let height = r1 - r0;
    let nodata = raster.meta.nodata.unwrap_or(CLIP_NODATA);
    let meta = RasterMeta {
        width,
        height,
        transform: t.window(r0, c0),
        nodata: Some(nodata),
        ..raster.meta.clone()
    };
    let mut out = Raster::filled(meta, nodata);

    let transform = out.meta.transform;
    for b in 0..raster.meta.bands {
        let src = raster.band(b);
        let dst = out.band_mut(b);
        for r in 0..height {
            for c in 0..width {
                let (x, y) = transform.cell_center(r, c);
                if boundary.contains(x, y) {
                    dst[r * width + c] = src[(r + r0) * raster.meta.width + (c + c0)];
                }
            }
        }
    }

    out.validate_shape()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Boundary {
        Boundary {
            key: "square".into(),
            crs: "EPSG:4326".into(),
            rings: vec![vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]],
        }
    }

    /// 10×10 raster over [0,10]×[0,10] with one-unit cells.
    fn unit_raster() -> Raster {
        let mut r = Raster::flat(10, 10, 7.0);
        r.meta.transform = GeoTransform {
            origin_x: 0.0,
            origin_y: 10.0,
            pixel_width: 1.0,
            pixel_height: -1.0,
        };
        r
    }

    #[test]
    fn disjoint_boundary_raises_no_overlap() {
        let raster = unit_raster();
        let boundary = square(100.0, 100.0, 110.0, 110.0);
        match clip_to_boundary(&raster, &boundary) {
            Err(ExecError::NoOverlap) => {}
            other => panic!("expected NoOverlap, got {other:?}"),
        }
    }

    #[test]
    fn crop_updates_shape_and_transform_together() {
        let raster = unit_raster();
        let boundary = square(2.0, 3.0, 6.0, 8.0);
        let clipped = clip_to_boundary(&raster, &boundary).unwrap();
        assert_eq!(clipped.width(), 4);
        assert_eq!(clipped.height(), 5);
        assert!((clipped.meta.transform.origin_x - 2.0).abs() < 1e-12);
        assert!((clipped.meta.transform.origin_y - 8.0).abs() < 1e-12);
        clipped.validate_shape().unwrap();
    }

    #[test]
    fn cells_outside_polygon_become_nodata() {
        let raster = unit_raster();
        // Triangle covering the lower-left half of [0,10]².
        let boundary = Boundary {
            key: "tri".into(),
            crs: "EPSG:4326".into(),
            rings: vec![vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)]],
        };
        let clipped = clip_to_boundary(&raster, &boundary).unwrap();
        let nd = clipped.meta.nodata.unwrap();
        // Cell centre (9.5, 9.5) is outside the triangle; (0.5, 0.5) inside.
        assert_eq!(clipped.get(0, 9), nd);
        assert_eq!(clipped.get(9, 0), 7.0);
    }

    #[test]
    fn every_band_is_cropped_and_masked() {
        let mut raster = unit_raster();
        raster.meta.bands = 2;
        let n = raster.meta.width * raster.meta.height;
        raster.data = vec![7.0; n].into_iter().chain(vec![3.0; n]).collect();
        let boundary = square(2.0, 3.0, 6.0, 8.0);
        let clipped = clip_to_boundary(&raster, &boundary).unwrap();
        assert_eq!(clipped.meta.bands, 2);
        // Interior cell centres land inside the square in both bands.
        assert_eq!(clipped.band(0)[clipped.meta.width + 1], 7.0);
        assert_eq!(clipped.band(1)[clipped.meta.width + 1], 3.0);
    }

    #[test]
    fn crs_mismatch_is_rejected() {
        let raster = unit_raster();
        let mut boundary = square(2.0, 2.0, 4.0, 4.0);
        boundary.crs = "EPSG:32643".into();
        match clip_to_boundary(&raster, &boundary) {
            Err(ExecError::CrsMismatch { .. }) => {}
            other => panic!("expected CrsMismatch, got {other:?}"),
        }
    }
}
