//! Whole-file raster I/O.
//!
//! Native persistence format is a serde_json raster document (grid +
//! metadata), so a write→read round trip preserves the CRS and transform
//! exactly. Uploaded GeoTIFF scenes (`.tif`/`.tiff`) are decoded with the
//! pure-Rust `tiff` crate; F32 and U8 sample types are accepted, matching
//! the DEM and band scenes the pipeline consumes. Scenes are bounded by a
//! single city-scale DEM or Sentinel-2 tile, so no windowed/streaming I/O.

use std::fs;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::Result;
use crate::raster::{DType, GeoTransform, Raster, RasterMeta};

/// GeoTIFF tag ids read via the decoder's unknown-tag escape hatch.
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

/// Read a raster from disk, dispatching on the file extension.
/// `.tif`/`.tiff` decode as GeoTIFF; everything else is the native format.
pub fn read_raster(path: &Path) -> Result<Raster> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tif") | Some("tiff") => read_geotiff(path),
        _ => read_native(path),
    }
}

/// Write a raster in the native format. The grid shape is validated against
/// the declared metadata first; dtype and band count are taken from the
/// metadata as-is, never inferred from the data.
pub fn write_raster(path: &Path, raster: &Raster) -> Result<()> {
    raster.validate_shape()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string(raster)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_native(path: &Path) -> Result<Raster> {
    let file = fs::File::open(path)?;
    let raster: Raster = serde_json::from_reader(BufReader::new(file))?;
    raster.validate_shape()?;
    Ok(raster)
}

/// Decode a single-band GeoTIFF. The affine transform is recovered from the
/// ModelPixelScale/ModelTiepoint tags when present; rasters without them get
/// a unit north-up transform. The CRS geokeys are not interpreted — uploads
/// are taken to be EPSG:4326, the convention of the upstream planner.
fn read_geotiff(path: &Path) -> Result<Raster> {
    let file = fs::File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let scale = decoder
        .find_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE))
        .ok()
        .flatten()
        .and_then(|v| v.into_f64_vec().ok());
    let tiepoint = decoder
        .find_tag(Tag::Unknown(TAG_MODEL_TIEPOINT))
        .ok()
        .flatten()
        .and_then(|v| v.into_f64_vec().ok());
    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(TAG_GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim().parse::<f32>().ok());

    let transform = match (scale.as_deref(), tiepoint.as_deref()) {
        (Some([sx, sy, ..]), Some([i, j, _, x, y, ..])) => GeoTransform {
            origin_x: x - i * sx,
            origin_y: y + j * sy,
            pixel_width: *sx,
            pixel_height: -sy,
        },
        _ => GeoTransform {
            origin_x: 0.0,
            origin_y: height as f64,
            pixel_width: 1.0,
            pixel_height: -1.0,
        },
    };

    let (data, dtype) = match decoder.read_image()? {
        DecodingResult::F32(v) => (v, DType::F32),
        DecodingResult::U8(v) => (v.into_iter().map(f32::from).collect(), DType::U8),
        DecodingResult::U16(v) => (v.into_iter().map(f32::from).collect(), DType::F32),
        other => {
            return Err(crate::error::ExecError::MalformedDocument(format!(
                "unsupported GeoTIFF sample type in {}: {:?}",
                path.display(),
                sample_kind(&other)
            )))
        }
    };

    let meta = RasterMeta {
        crs: "EPSG:4326".to_string(),
        transform,
        width,
        height,
        bands: 1,
        dtype,
        nodata,
    };
    let raster = Raster { meta, data };
    raster.validate_shape()?;
    Ok(raster)
}

fn sample_kind(r: &DecodingResult) -> &'static str {
    match r {
        DecodingResult::U8(_) => "u8",
        DecodingResult::U16(_) => "u16",
        DecodingResult::U32(_) => "u32",
        DecodingResult::U64(_) => "u64",
        DecodingResult::I8(_) => "i8",
        DecodingResult::I16(_) => "i16",
        DecodingResult::I32(_) => "i32",
        DecodingResult::I64(_) => "i64",
        DecodingResult::F32(_) => "f32",
        DecodingResult::F64(_) => "f64",
    }
}
