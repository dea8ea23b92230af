//! Sequential plan execution with cross-step artifact chaining.
//!
//! Steps run strictly in document order, fail-fast. An artifact table maps
//! each step's declared `output_file` string to the path actually produced,
//! so a later step naming it as `input_file` resolves to a file that is
//! known to exist. Artifacts written before a failure stay on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::boundary::{Boundary, Gazetteer};
use crate::error::{ExecError, Result};
use crate::registry;
use crate::workflow::context::RunContext;
use crate::workflow::document::{OpKind, Plan, PlannedStep};

pub struct Interpreter {
    ctx: RunContext,
}

impl Interpreter {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Execute a plan, returning every produced artifact path in execution
    /// order. The first fatal error aborts the run; `Unsupported` steps are
    /// skipped with a warning.
    pub fn execute(&self, plan: &Plan) -> Result<Vec<PathBuf>> {
        self.ctx.ensure_dirs()?;
        let boundary = self.resolve_boundary(plan)?;

        let mut artifacts: HashMap<String, PathBuf> = HashMap::new();
        let mut produced = Vec::new();

        for step in &plan.steps {
            match step.op {
                OpKind::Unsupported => {
                    warn!(
                        step = step.index,
                        tool = step.tool.name(),
                        action = %step.action,
                        "unsupported operation, skipping"
                    );
                    continue;
                }
                OpKind::LoadInput => {
                    let input = self.resolve_input(step, &artifacts)?;
                    info!(step = step.index, path = %input.display(), "input loaded");
                    if let Some(declared) = &step.output_file {
                        artifacts.insert(declared.clone(), input.clone());
                    }
                    if let Some(declared) = &step.input_file {
                        artifacts.insert(declared.clone(), input.clone());
                    }
                    produced.push(input);
                }
                _ => {
                    let input = if step.input_file.is_some() {
                        Some(self.resolve_input(step, &artifacts)?)
                    } else {
                        None
                    };
                    // Presence of output_file is validated at parse time.
                    let declared = step.output_file.clone().ok_or_else(|| {
                        ExecError::MalformedDocument(format!(
                            "step {}: lost its output_file",
                            step.index
                        ))
                    })?;
                    let output = self.output_path(&declared);
                    info!(
                        step = step.index,
                        op = ?step.op,
                        output = %output.display(),
                        "executing step"
                    );
                    registry::dispatch(
                        step,
                        input.as_deref(),
                        &output,
                        &self.ctx,
                        boundary.as_ref(),
                    )
                    .map_err(|e| tag_step(step.index, e))?;
                    artifacts.insert(declared, output.clone());
                    produced.push(output);
                }
            }
        }
        Ok(produced)
    }

    fn resolve_boundary(&self, plan: &Plan) -> Result<Option<Boundary>> {
        if !plan.requires_boundary() {
            return Ok(None);
        }
        let location = plan.location.as_ref().ok_or(ExecError::MissingLocation)?;
        let mut gazetteer = Gazetteer::new(
            self.ctx.gazetteer_dir.clone(),
            self.ctx.geojson_dir.clone(),
        );
        Ok(Some(gazetteer.resolve(location)?))
    }

    /// Resolve a step's declared `input_file`: an existing absolute path is
    /// taken as-is, then the artifact table, then the uploads directory,
    /// then the outputs directory.
    fn resolve_input(
        &self,
        step: &PlannedStep,
        artifacts: &HashMap<String, PathBuf>,
    ) -> Result<PathBuf> {
        let declared = step.input_file.as_ref().ok_or_else(|| {
            ExecError::MissingInput {
                step: step.index,
                path: PathBuf::new(),
            }
        })?;
        let as_path = Path::new(declared);
        if as_path.is_absolute() && as_path.exists() {
            return Ok(as_path.to_path_buf());
        }
        if let Some(produced) = artifacts.get(declared) {
            return Ok(produced.clone());
        }
        // Planner documents sometimes carry the upstream path prefix; only
        // the file name is significant for upload lookup.
        if let Some(name) = as_path.file_name() {
            let uploaded = self.ctx.uploads_dir.join(name);
            if uploaded.exists() {
                return Ok(uploaded);
            }
            let output = self.ctx.outputs_dir.join(name);
            if output.exists() {
                return Ok(output);
            }
        }
        Err(ExecError::MissingInput {
            step: step.index,
            path: self.ctx.uploads_dir.join(declared),
        })
    }

    fn output_path(&self, declared: &str) -> PathBuf {
        let as_path = Path::new(declared);
        if as_path.is_absolute() {
            return as_path.to_path_buf();
        }
        match as_path.file_name() {
            Some(name) => self.ctx.outputs_dir.join(name),
            None => self.ctx.outputs_dir.join(declared),
        }
    }
}

/// Attach the step index to errors that do not already carry one.
fn tag_step(step: usize, err: ExecError) -> ExecError {
    match err {
        e @ (ExecError::MissingInput { .. }
        | ExecError::UnsupportedOperation { .. }
        | ExecError::StepFailed { .. }) => e,
        other => ExecError::StepFailed {
            step,
            source: Box::new(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{read_raster, write_raster};
    use crate::raster::Raster;
    use crate::workflow::document::parse_document;
    use std::fs;

    fn context() -> (tempfile::TempDir, RunContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::under(dir.path());
        ctx.ensure_dirs().unwrap();
        (dir, ctx)
    }

    /// DEM with a single interior pit, persisted as an upload.
    fn seed_dem(ctx: &RunContext, name: &str) -> Raster {
        let mut dem = Raster::flat(5, 5, 10.0);
        dem.set(2, 2, 4.0);
        write_raster(&ctx.uploads_dir.join(name), &dem).unwrap();
        dem
    }

    const FLOOD_DOC: &str = r#"{
      "workflow": [
        { "task": "flood-prone analysis for Chennai",
          "action": "Load DEM data",
          "args": { "tool": "gdal", "input_file": "dem.json" } },
        { "task": "flood-prone analysis for Chennai",
          "action": "Fill sinks in DEM",
          "args": { "tool": "whiteboxtools", "input_file": "dem.json",
                    "output_file": "filled.json" } },
        { "task": "flood-prone analysis for Chennai",
          "action": "Compute D8 flow accumulation",
          "args": { "tool": "whiteboxtools", "input_file": "filled.json",
                    "output_file": "flow.json" } },
        { "task": "flood-prone analysis for Chennai",
          "action": "Classify flood risk zones",
          "args": { "tool": "rasterio", "input_file": "flow.json",
                    "output_file": "flood_risk.json" } }
      ]
    }"#;

    #[test]
    fn flood_pipeline_chains_step_outputs() {
        let (_dir, ctx) = context();
        seed_dem(&ctx, "dem.json");

        let plan = parse_document(FLOOD_DOC).unwrap();
        let outputs = Interpreter::new(ctx.clone()).execute(&plan).unwrap();
        assert_eq!(outputs.len(), 4);

        for path in &outputs {
            let len = fs::metadata(path).unwrap().len();
            assert!(len > 0, "{} is empty", path.display());
        }
        // Step 3 consumed step 2's artifact, not a stale upload.
        assert_eq!(outputs[2], ctx.outputs_dir.join("flow.json"));
        let flow = read_raster(&outputs[2]).unwrap();
        assert!(flow.data.iter().all(|&v| v >= 1.0));
        // Classification also rendered a map image.
        assert!(ctx.outputs_dir.join("flood_risk_map.png").exists());
    }

    #[test]
    fn missing_upload_fails_with_step_index() {
        let (_dir, ctx) = context();
        let plan = parse_document(FLOOD_DOC).unwrap();
        match Interpreter::new(ctx).execute(&plan) {
            Err(ExecError::MissingInput { step: 0, .. }) => {}
            other => panic!("expected MissingInput at step 0, got {other:?}"),
        }
    }

    #[test]
    fn skipped_step_starves_its_dependents() {
        let (_dir, ctx) = context();
        seed_dem(&ctx, "dem.json");
        let doc = r#"{ "workflow": [
          { "action": "Interpolate with kriging",
            "args": { "tool": "gdal", "input_file": "dem.json",
                      "output_file": "kriged.json" } },
          { "action": "Fill sinks in DEM",
            "args": { "tool": "whiteboxtools", "input_file": "kriged.json",
                      "output_file": "filled.json" } }
        ] }"#;
        let plan = parse_document(doc).unwrap();
        match Interpreter::new(ctx).execute(&plan) {
            Err(ExecError::MissingInput { step: 1, .. }) => {}
            other => panic!("expected MissingInput at step 1, got {other:?}"),
        }
    }

    #[test]
    fn clip_without_location_fails_before_any_step() {
        let (_dir, ctx) = context();
        seed_dem(&ctx, "dem.json");
        let doc = r#"{ "workflow": [
          { "action": "Fill sinks in DEM",
            "args": { "tool": "whiteboxtools", "input_file": "dem.json",
                      "output_file": "filled.json" } },
          { "action": "Clip DEM to boundary",
            "args": { "tool": "geopandas", "input_file": "filled.json",
                      "output_file": "clipped.json" } }
        ] }"#;
        let plan = parse_document(doc).unwrap();
        let outputs_dir = ctx.outputs_dir.clone();
        match Interpreter::new(ctx).execute(&plan) {
            Err(ExecError::MissingLocation) => {}
            other => panic!("expected MissingLocation, got {other:?}"),
        }
        // Fails in the prologue: step 0 never ran.
        assert!(!outputs_dir.join("filled.json").exists());
    }

    #[test]
    fn suitability_pipeline_clips_and_classifies() {
        let (_dir, ctx) = context();
        // Raster::flat spans [0, 0.0045°]² from origin_y; the boundary covers
        // its middle. Elevation 10 and near-zero slope score (4 + 5) / 2 = 4.
        let dem = Raster::flat(5, 5, 10.0);
        write_raster(&ctx.uploads_dir.join("dem.json"), &dem).unwrap();
        fs::create_dir_all(&ctx.gazetteer_dir).unwrap();
        fs::write(
            ctx.gazetteer_dir.join("vellore_boundary.geojson"),
            r#"{ "type": "Polygon",
                 "coordinates": [[[0.0005, 0.0005], [0.004, 0.0005],
                                  [0.004, 0.004], [0.0005, 0.004],
                                  [0.0005, 0.0005]]] }"#,
        )
        .unwrap();

        let doc = r#"{ "workflow": [
          { "task": "site suitability for Vellore",
            "action": "Clip DEM to boundary",
            "args": { "tool": "geopandas", "input_file": "dem.json",
                      "output_file": "clipped.json" } },
          { "task": "site suitability for Vellore",
            "action": "Classify site suitability",
            "args": { "tool": "rasterio", "input_file": "clipped.json",
                      "output_file": "suitability.json" } }
        ] }"#;
        let plan = parse_document(doc).unwrap();
        let outputs = Interpreter::new(ctx.clone()).execute(&plan).unwrap();
        assert_eq!(outputs.len(), 2);

        let classes = read_raster(&outputs[1]).unwrap();
        assert!(classes
            .data
            .iter()
            .any(|&v| v == 4.0), "expected class-4 cells inside the boundary");
        assert!(ctx.outputs_dir.join("suitability_map.png").exists());
        // Boundary was persisted to the run cache.
        assert!(ctx.geojson_dir.join("vellore_boundary.geojson").exists());
    }

    #[test]
    fn failed_clip_writes_no_output_file() {
        let (_dir, ctx) = context();
        seed_dem(&ctx, "dem.json");
        // Boundary far outside the DEM's extent.
        fs::create_dir_all(&ctx.gazetteer_dir).unwrap();
        fs::write(
            ctx.gazetteer_dir.join("atlantis_boundary.geojson"),
            r#"{ "type": "Polygon",
                 "coordinates": [[[10.0, 10.0], [11.0, 10.0],
                                  [11.0, 11.0], [10.0, 11.0],
                                  [10.0, 10.0]]] }"#,
        )
        .unwrap();

        let doc = r#"{ "workflow": [
          { "task": "flood-prone analysis for Atlantis",
            "action": "Clip DEM to boundary",
            "args": { "tool": "geopandas", "input_file": "dem.json",
                      "output_file": "clipped.json" } }
        ] }"#;
        let plan = parse_document(doc).unwrap();
        match Interpreter::new(ctx.clone()).execute(&plan) {
            Err(ExecError::StepFailed { step: 0, source }) => {
                assert!(matches!(*source, ExecError::NoOverlap));
            }
            other => panic!("expected NoOverlap at step 0, got {other:?}"),
        }
        assert!(!ctx.outputs_dir.join("clipped.json").exists());
    }

    #[test]
    fn artifacts_survive_a_late_failure() {
        let (_dir, ctx) = context();
        seed_dem(&ctx, "dem.json");
        let doc = r#"{ "workflow": [
          { "action": "Fill sinks in DEM",
            "args": { "tool": "whiteboxtools", "input_file": "dem.json",
                      "output_file": "filled.json" } },
          { "action": "Compute D8 flow accumulation",
            "args": { "tool": "whiteboxtools", "input_file": "missing.json",
                      "output_file": "flow.json" } }
        ] }"#;
        let plan = parse_document(doc).unwrap();
        assert!(Interpreter::new(ctx.clone()).execute(&plan).is_err());
        assert!(ctx.outputs_dir.join("filled.json").exists());
        assert!(!ctx.outputs_dir.join("flow.json").exists());
    }
}
