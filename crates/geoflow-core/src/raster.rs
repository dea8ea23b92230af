//! Geo-referenced raster grid: band-major f32 samples plus spatial metadata.
//!
//! Sample values are stored as f32 regardless of the declared `DType`; the
//! dtype records how the grid must be interpreted and persisted (class ids,
//! counts, continuous values). Metadata is never inferred at write time —
//! every transform explicitly sets dtype, band count, and no-data before
//! handing the raster to the I/O adapter.

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, Result};

/// Interpretation of the sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    /// Small ordinal class ids / binary masks.
    U8,
    /// Unsigned counts (flow accumulation).
    U32,
    /// Continuous measurements (elevation, slope, NDVI).
    F32,
}

/// North-up affine transform: pixel (col, row) → CRS coordinates.
/// `pixel_height` is negative for the usual row-0-at-the-top layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Coordinates of the centre of cell `(row, col)`.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Transform of a window whose upper-left cell is `(row0, col0)`.
    pub fn window(&self, row0: usize, col0: usize) -> GeoTransform {
        GeoTransform {
            origin_x: self.origin_x + col0 as f64 * self.pixel_width,
            origin_y: self.origin_y + row0 as f64 * self.pixel_height,
            ..*self
        }
    }
}

/// Spatial metadata carried across every read→transform→write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMeta {
    /// Coordinate reference system, e.g. "EPSG:4326".
    pub crs: String,
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub dtype: DType,
    /// Reserved "no valid measurement" sample value.
    pub nodata: Option<f32>,
}

impl RasterMeta {
    pub fn expected_len(&self) -> usize {
        self.width * self.height * self.bands
    }

    /// (min_x, min_y, max_x, max_y) extent in CRS coordinates.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let t = &self.transform;
        let x0 = t.origin_x;
        let x1 = t.origin_x + self.width as f64 * t.pixel_width;
        let y0 = t.origin_y;
        let y1 = t.origin_y + self.height as f64 * t.pixel_height;
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Isotropic cellsize in metres. Geographic CRSes are converted with the
    /// 111,320 m/° approximation at the raster's mid latitude; anything else
    /// is assumed to already be metric. Degenerate extents fall back to 90 m.
    pub fn cellsize_m(&self) -> f64 {
        let cw = self.transform.pixel_width.abs();
        let ch = self.transform.pixel_height.abs();
        let avg = if self.crs == "EPSG:4326" {
            let (_, min_y, _, max_y) = self.bounds();
            let mid_lat = (min_y + max_y) / 2.0;
            (ch * 111_320.0 + cw * 111_320.0 * mid_lat.to_radians().cos()) / 2.0
        } else {
            (cw + ch) / 2.0
        };
        if avg < 1e-3 {
            90.0
        } else {
            avg
        }
    }
}

/// A 2-D (or multi-band) grid of numeric samples plus spatial metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    pub meta: RasterMeta,
    /// Band-major, row-major within each band.
    pub data: Vec<f32>,
}

impl Raster {
    /// Create a raster filled with the given value.
    pub fn filled(meta: RasterMeta, fill: f32) -> Self {
        let len = meta.expected_len();
        Self {
            meta,
            data: vec![fill; len],
        }
    }

    /// Single-band raster over a unit-degree grid; test and demo helper.
    pub fn flat(width: usize, height: usize, fill: f32) -> Self {
        let meta = RasterMeta {
            crs: "EPSG:4326".to_string(),
            transform: GeoTransform {
                origin_x: 0.0,
                origin_y: height as f64 * 0.0009,
                pixel_width: 0.0009,
                pixel_height: -0.0009,
            },
            width,
            height,
            bands: 1,
            dtype: DType::F32,
            nodata: None,
        };
        Self::filled(meta, fill)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.meta.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.meta.height
    }

    /// Samples of one band, row-major.
    pub fn band(&self, b: usize) -> &[f32] {
        let n = self.meta.width * self.meta.height;
        &self.data[b * n..(b + 1) * n]
    }

    pub fn band_mut(&mut self, b: usize) -> &mut [f32] {
        let n = self.meta.width * self.meta.height;
        &mut self.data[b * n..(b + 1) * n]
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.meta.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.meta.width + col] = val;
    }

    /// True if `val` is the no-data sentinel or NaN.
    pub fn is_nodata(&self, val: f32) -> bool {
        val.is_nan() || self.meta.nodata.is_some_and(|nd| val == nd)
    }

    /// Precondition check run before every write: the grid length must agree
    /// with the declared width/height/band metadata.
    pub fn validate_shape(&self) -> Result<()> {
        let expected = self.meta.expected_len();
        if self.data.len() != expected {
            return Err(ExecError::ShapeMismatch {
                actual: self.data.len(),
                expected,
                width: self.meta.width,
                height: self.meta.height,
                bands: self.meta.bands,
            });
        }
        Ok(())
    }

    /// New single-band raster sharing this raster's spatial metadata.
    pub fn like_single_band(&self, dtype: DType, nodata: Option<f32>, fill: f32) -> Raster {
        let meta = RasterMeta {
            bands: 1,
            dtype,
            nodata,
            ..self.meta.clone()
        };
        Raster::filled(meta, fill)
    }
}
