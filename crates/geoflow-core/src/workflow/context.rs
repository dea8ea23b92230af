//! Per-run directory layout.
//!
//! All filesystem roots are explicit values on the context; nothing in the
//! engine consults the process working directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory roots for one workflow run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Source scenes and band files, read-only during a run.
    pub uploads_dir: PathBuf,
    /// Every intermediate and final raster, plus rendered map images.
    pub outputs_dir: PathBuf,
    /// Per-run cache of resolved boundary GeoJSON files.
    pub geojson_dir: PathBuf,
    /// Read-only gazetteer of `<key>_boundary.geojson` source files.
    pub gazetteer_dir: PathBuf,
}

impl RunContext {
    /// Conventional layout under a single root directory.
    pub fn under(root: &Path) -> Self {
        Self {
            uploads_dir: root.join("uploads"),
            outputs_dir: root.join("outputs"),
            geojson_dir: root.join("geojson"),
            gazetteer_dir: root.join("gazetteer"),
        }
    }

    /// Create the writable directories. The gazetteer dir is left alone: it
    /// is an input, and its absence only matters once a lookup happens.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.uploads_dir)?;
        fs::create_dir_all(&self.outputs_dir)?;
        fs::create_dir_all(&self.geojson_dir)?;
        Ok(())
    }
}
