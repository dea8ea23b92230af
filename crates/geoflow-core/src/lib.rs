//! Workflow execution engine for declarative geospatial pipelines.
//!
//! A planner (human or otherwise) emits a JSON workflow document; this crate
//! parses it into an explicit operation plan, resolves inter-step file
//! dependencies, dispatches each step to a registered raster operation, and
//! persists every intermediate and final raster plus a rendered map image.

pub mod boundary;
pub mod classify;
pub mod error;
pub mod io;
pub mod ops;
pub mod raster;
pub mod registry;
pub mod render;
pub mod workflow;

pub use error::{ExecError, Result};
pub use raster::{DType, GeoTransform, Raster, RasterMeta};
pub use workflow::context::RunContext;
pub use workflow::interpreter::Interpreter;
