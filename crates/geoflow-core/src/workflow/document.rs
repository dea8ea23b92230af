//! Workflow document schema and parse-time operation translation.
//!
//! The planner emits steps whose `action` is free text. That text is
//! interpreted in exactly one place, [`translate`], when the document is
//! parsed into a [`Plan`]; from then on every step carries an explicit
//! [`OpKind`] and execution never matches on strings. Unknown
//! `(tool, action)` combinations become [`OpKind::Unsupported`] planned
//! steps, skipped (and logged) at run time.

use serde::Deserialize;

use crate::error::{ExecError, Result};

/// The planner-facing tool vocabulary. Which operation actually runs is
/// decided by [`translate`], not by the tool alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Whiteboxtools,
    Qgis,
    Gdal,
    Rasterio,
    Osmnx,
    Ndvi,
    Geopandas,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Whiteboxtools => "whiteboxtools",
            Self::Qgis => "qgis",
            Self::Gdal => "gdal",
            Self::Rasterio => "rasterio",
            Self::Osmnx => "osmnx",
            Self::Ndvi => "ndvi",
            Self::Geopandas => "geopandas",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepArgs {
    pub tool: ToolKind,
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub task: Option<String>,
    pub action: String,
    pub args: StepArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDocument {
    pub workflow: Vec<Step>,
}

/// Every operation the engine can execute. `LoadInput` passes its input
/// through unchanged; `Unsupported` records an unrecognized step so the run
/// can skip it without losing the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    LoadInput,
    FillDepressions,
    FlowAccumulation,
    Slope,
    Clip,
    StackBands,
    Ndvi,
    ThresholdBinary,
    ClassifyFlood,
    ClassifyLandcover,
    ClassifySuitability,
    Unsupported,
}

/// Translate a planner-emitted `(tool, action)` pair into an operation.
/// Case-insensitive keyword matching, checked in priority order; this is
/// the only function in the crate that inspects action text.
pub fn translate(tool: ToolKind, action: &str) -> OpKind {
    let action = action.to_lowercase();
    if action.contains("load") {
        return OpKind::LoadInput;
    }
    if action.contains("clip") {
        return OpKind::Clip;
    }
    if action.contains("stack") {
        return OpKind::StackBands;
    }
    if action.contains("classify") || action.contains("classification") {
        if action.contains("flood") {
            return OpKind::ClassifyFlood;
        }
        if action.contains("land") || action.contains("lulc") {
            return OpKind::ClassifyLandcover;
        }
        if action.contains("suitab") || action.contains("site") {
            return OpKind::ClassifySuitability;
        }
        return OpKind::Unsupported;
    }
    if action.contains("ndvi") || tool == ToolKind::Ndvi {
        return OpKind::Ndvi;
    }
    match tool {
        ToolKind::Whiteboxtools => {
            if action.contains("fill") {
                OpKind::FillDepressions
            } else if action.contains("flow") {
                OpKind::FlowAccumulation
            } else if action.contains("slope") {
                OpKind::Slope
            } else {
                OpKind::Unsupported
            }
        }
        ToolKind::Qgis => {
            if action.contains("threshold") || action.contains("risk") {
                OpKind::ThresholdBinary
            } else {
                OpKind::Unsupported
            }
        }
        _ => OpKind::Unsupported,
    }
}

/// One step after parse-time translation.
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub index: usize,
    pub op: OpKind,
    pub task: Option<String>,
    pub tool: ToolKind,
    pub action: String,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    pub threshold: Option<f32>,
}

/// A validated, translated workflow ready for execution.
#[derive(Debug, Clone)]
pub struct Plan {
    pub steps: Vec<PlannedStep>,
    /// Place name extracted from a location-bearing task, original casing.
    pub location: Option<String>,
}

impl Plan {
    pub fn requires_boundary(&self) -> bool {
        self.steps.iter().any(|s| s.op == OpKind::Clip)
    }
}

/// Extract a place name from task texts: a task mentioning flood-prone or
/// site-suitability analysis with a "for <place>" marker names the run's
/// boundary location.
fn extract_location(steps: &[Step]) -> Option<String> {
    for step in steps {
        let Some(task) = &step.task else { continue };
        let lower = task.to_lowercase();
        if !(lower.contains("flood-prone")
            || lower.contains("flood prone")
            || lower.contains("site suitability"))
        {
            continue;
        }
        if let Some(pos) = lower.find(" for ") {
            let place = task[pos + 5..].trim();
            if !place.is_empty() {
                return Some(place.to_string());
            }
        }
    }
    None
}

/// Parse and validate a workflow document. All schema errors surface here,
/// before any side effect.
pub fn parse_document(json: &str) -> Result<Plan> {
    let doc: WorkflowDocument = serde_json::from_str(json)
        .map_err(|e| ExecError::MalformedDocument(e.to_string()))?;
    if doc.workflow.is_empty() {
        return Err(ExecError::MalformedDocument(
            "workflow step list is empty".into(),
        ));
    }

    let location = extract_location(&doc.workflow);
    let mut steps = Vec::with_capacity(doc.workflow.len());
    for (index, step) in doc.workflow.into_iter().enumerate() {
        let op = translate(step.args.tool, &step.action);
        if op == OpKind::ThresholdBinary && step.args.threshold.is_none() {
            return Err(ExecError::MalformedDocument(format!(
                "step {index}: threshold operation declares no threshold value"
            )));
        }
        if op != OpKind::Unsupported
            && op != OpKind::StackBands
            && step.args.input_file.is_none()
        {
            return Err(ExecError::MalformedDocument(format!(
                "step {index}: operation reads a raster but declares no input_file"
            )));
        }
        if op != OpKind::Unsupported
            && op != OpKind::LoadInput
            && step.args.output_file.is_none()
        {
            return Err(ExecError::MalformedDocument(format!(
                "step {index}: operation produces a raster but declares no output_file"
            )));
        }
        steps.push(PlannedStep {
            index,
            op,
            task: step.task,
            tool: step.args.tool,
            action: step.action,
            input_file: step.args.input_file,
            output_file: step.args.output_file,
            threshold: step.args.threshold,
        });
    }
    Ok(Plan { steps, location })
}
