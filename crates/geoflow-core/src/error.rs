//! Error taxonomy for workflow execution.
//!
//! Document-level errors (`MalformedDocument`, `MissingLocation`) are raised
//! before any side effect; per-step errors leave previously produced
//! artifacts on disk. There is no retry and no rollback.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The workflow JSON failed schema validation. Surfaced before any step runs.
    #[error("malformed workflow document: {0}")]
    MalformedDocument(String),

    /// A declared input file was absent when its step came up for execution.
    #[error("step {step}: missing input: {path}")]
    MissingInput { step: usize, path: PathBuf },

    /// Unknown (tool, action) combination. Recoverable at plan level (the
    /// step is skipped); only surfaces as an error when forced fatal.
    #[error("step {step}: unsupported operation: tool '{tool}', action {action:?}")]
    UnsupportedOperation {
        step: usize,
        tool: String,
        action: String,
    },

    /// Clip geometry and raster extent do not intersect.
    #[error("clip boundary does not overlap the raster extent")]
    NoOverlap,

    /// A free-text location could not be resolved to a boundary polygon.
    #[error("no boundary found for location {0:?}")]
    GeocodeNotFound(String),

    /// The workflow requires a boundary but no step names a location.
    #[error("workflow requires a clip boundary but no step names a location")]
    MissingLocation,

    /// Grid length disagrees with the declared width/height/band metadata.
    /// Indicates a programming error upstream, not bad user data.
    #[error("raster grid holds {actual} samples but metadata declares {expected} ({width}x{height}, {bands} band(s))")]
    ShapeMismatch {
        actual: usize,
        expected: usize,
        width: usize,
        height: usize,
        bands: usize,
    },

    /// Boundary and raster coordinate reference systems differ.
    #[error("boundary CRS '{boundary}' does not match raster CRS '{raster}'")]
    CrsMismatch { boundary: String, raster: String },

    /// A classification rule failed its own precondition (gap/overlap in a
    /// threshold partition, unsorted percentile list, ...).
    #[error("invalid classification rule: {0}")]
    InvalidRule(String),

    /// Tags a handler failure with the index of the step it occurred in.
    #[error("step {step}: {source}")]
    StepFailed {
        step: usize,
        #[source]
        source: Box<ExecError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("GeoTIFF decode failed: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("map image encode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("raster (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
