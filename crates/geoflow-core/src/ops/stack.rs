//! Sentinel-2 band stacking.
//!
//! Band source files are located in the uploads directory by the band id in
//! their file name (B02 blue, B03 green, B04 red, B08 NIR). Each single-band
//! grid is copied into a 4-band raster sharing the first band's spatial
//! metadata.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::raster::{DType, Raster, RasterMeta};

/// Required Sentinel-2 band identifiers, in stack order.
pub const BAND_IDS: [&str; 4] = ["B02", "B03", "B04", "B08"];

/// Zero-based stack index of the red band (B04).
pub const RED_BAND: usize = 2;
/// Zero-based stack index of the near-infrared band (B08).
pub const NIR_BAND: usize = 3;

const BAND_EXTENSIONS: [&str; 3] = ["tif", "tiff", "json"];

/// Locate one source file per band id in the uploads directory.
/// Returns the located paths in stack order, or the list of missing ids.
pub fn locate_band_files(
    uploads_dir: &Path,
) -> std::result::Result<[PathBuf; 4], Vec<&'static str>> {
    let mut found: [Option<PathBuf>; 4] = [None, None, None, None];
    if let Ok(entries) = fs::read_dir(uploads_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| BAND_EXTENSIONS.contains(&e));
            if !ext_ok {
                continue;
            }
            for (i, id) in BAND_IDS.iter().enumerate() {
                if name.contains(id) && found[i].is_none() {
                    found[i] = Some(path.clone());
                }
            }
        }
    }

    match found {
        [Some(b02), Some(b03), Some(b04), Some(b08)] => Ok([b02, b03, b04, b08]),
        _ => Err(BAND_IDS
            .iter()
            .zip(&found)
            .filter(|(_, f)| f.is_none())
            .map(|(id, _)| *id)
            .collect()),
    }
}

/// Stack single-band rasters into one multi-band raster. Spatial metadata is
/// taken from the first band; all bands must share the same grid shape.
pub fn stack_bands(bands: &[Raster]) -> Result<Raster> {
    let Some(first) = bands.first() else {
        return Err(crate::error::ExecError::InvalidRule(
            "cannot stack an empty band list".into(),
        ));
    };
    for band in bands {
        band.validate_shape()?;
        if band.width() != first.width() || band.height() != first.height() {
            return Err(crate::error::ExecError::ShapeMismatch {
                actual: band.data.len(),
                expected: first.meta.width * first.meta.height,
                width: first.meta.width,
                height: first.meta.height,
                bands: 1,
            });
        }
    }

    let meta = RasterMeta {
        bands: bands.len(),
        dtype: DType::F32,
        ..first.meta.clone()
    };
    let mut data = Vec::with_capacity(meta.expected_len());
    for band in bands {
        data.extend_from_slice(band.band(0));
    }
    let out = Raster { meta, data };
    out.validate_shape()?;
    Ok(out)
}
