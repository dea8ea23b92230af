//! Tool registry: the operation table and the single dispatch point.
//!
//! Each executable [`OpKind`] has a registry row describing its contract
//! (name, category, input arity, output kind) and a handler arm in
//! [`dispatch`]. Handlers read the resolved input raster, apply one
//! operation from [`crate::ops`] or [`crate::classify`], and write the
//! result at the resolved output path. Classification handlers additionally
//! render `<output_stem>_map.png` beside the raster.

use std::path::{Path, PathBuf};

use crate::boundary::Boundary;
use crate::classify::{percentile, suitability, threshold};
use crate::error::{ExecError, Result};
use crate::io::{read_raster, write_raster};
use crate::ops::slope::SlopeUnits;
use crate::ops::{clip, fill, flow, ndvi, slope, stack, threshold_binary};
use crate::render::render_classified;
use crate::workflow::context::RunContext;
use crate::workflow::document::{OpKind, PlannedStep};

/// Input arity a handler expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Passes its input through or gathers inputs itself.
    None,
    SingleBand,
    MultiBand,
}

/// One row of the operation table.
#[derive(Debug)]
pub struct OpSpec {
    pub op: OpKind,
    pub name: &'static str,
    pub category: &'static str,
    pub summary: &'static str,
    pub arity: Arity,
    pub output: &'static str,
}

/// Every executable operation, in registry order.
pub static REGISTRY: &[OpSpec] = &[
    OpSpec {
        op: OpKind::LoadInput,
        name: "load_input",
        category: "io",
        summary: "pass an uploaded raster through unchanged",
        arity: Arity::None,
        output: "source raster path",
    },
    OpSpec {
        op: OpKind::FillDepressions,
        name: "fill_depressions",
        category: "hydrology",
        summary: "fill DEM sinks so every cell drains to the edge",
        arity: Arity::SingleBand,
        output: "filled DEM (F32)",
    },
    OpSpec {
        op: OpKind::FlowAccumulation,
        name: "flow_accumulation",
        category: "hydrology",
        summary: "D8 upstream contributing cell counts",
        arity: Arity::SingleBand,
        output: "accumulation grid (U32)",
    },
    OpSpec {
        op: OpKind::Slope,
        name: "slope",
        category: "terrain",
        summary: "Horn 3x3 slope in degrees",
        arity: Arity::SingleBand,
        output: "slope raster (F32)",
    },
    OpSpec {
        op: OpKind::Clip,
        name: "clip",
        category: "vector",
        summary: "crop to the run boundary, mask cells outside the polygon",
        arity: Arity::MultiBand,
        output: "clipped raster",
    },
    OpSpec {
        op: OpKind::StackBands,
        name: "stack_bands",
        category: "imagery",
        summary: "stack Sentinel-2 B02/B03/B04/B08 uploads into one raster",
        arity: Arity::None,
        output: "4-band stack (F32)",
    },
    OpSpec {
        op: OpKind::Ndvi,
        name: "ndvi",
        category: "imagery",
        summary: "(NIR - RED) / (NIR + RED + eps) from a band stack",
        arity: Arity::MultiBand,
        output: "NDVI raster (F32)",
    },
    OpSpec {
        op: OpKind::ThresholdBinary,
        name: "threshold_binary",
        category: "classification",
        summary: "binary mask of cells above a fixed threshold",
        arity: Arity::SingleBand,
        output: "mask (U8)",
    },
    OpSpec {
        op: OpKind::ClassifyFlood,
        name: "classify_flood",
        category: "classification",
        summary: "percentile flood-risk classes from flow accumulation",
        arity: Arity::SingleBand,
        output: "class raster (U8) + map PNG",
    },
    OpSpec {
        op: OpKind::ClassifyLandcover,
        name: "classify_landcover",
        category: "classification",
        summary: "fixed-threshold land-cover classes from NDVI",
        arity: Arity::SingleBand,
        output: "class raster (U8) + map PNG",
    },
    OpSpec {
        op: OpKind::ClassifySuitability,
        name: "classify_suitability",
        category: "classification",
        summary: "composite elevation + slope suitability from a clipped DEM",
        arity: Arity::SingleBand,
        output: "class raster (U8) + map PNG",
    },
];

pub fn spec_of(op: OpKind) -> Option<&'static OpSpec> {
    REGISTRY.iter().find(|s| s.op == op)
}

/// Path of the rendered map image for a classified raster output.
fn map_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{stem}_map.png"))
}

/// Execute one planned step against its resolved paths. `input` is `None`
/// only for operations with `Arity::None`; `boundary` is present whenever
/// the plan carries a location.
pub fn dispatch(
    step: &PlannedStep,
    input: Option<&Path>,
    output: &Path,
    ctx: &RunContext,
    boundary: Option<&Boundary>,
) -> Result<()> {
    match step.op {
        OpKind::FillDepressions => {
            let dem = read_raster(input_path(step, input)?)?;
            write_raster(output, &fill::fill_depressions(&dem))
        }
        OpKind::FlowAccumulation => {
            let dem = read_raster(input_path(step, input)?)?;
            write_raster(output, &flow::flow_accumulation(&dem))
        }
        OpKind::Slope => {
            let dem = read_raster(input_path(step, input)?)?;
            write_raster(output, &slope::compute_slope(&dem, SlopeUnits::Degrees))
        }
        OpKind::Clip => {
            let raster = read_raster(input_path(step, input)?)?;
            let boundary = boundary.ok_or(ExecError::MissingLocation)?;
            write_raster(output, &clip::clip_to_boundary(&raster, boundary)?)
        }
        OpKind::StackBands => {
            let files = stack::locate_band_files(&ctx.uploads_dir).map_err(|missing| {
                ExecError::MissingInput {
                    step: step.index,
                    path: ctx.uploads_dir.join(missing.join("+")),
                }
            })?;
            let mut bands = Vec::with_capacity(files.len());
            for file in &files {
                bands.push(read_raster(file)?);
            }
            write_raster(output, &stack::stack_bands(&bands)?)
        }
        OpKind::Ndvi => {
            let stacked = read_raster(input_path(step, input)?)?;
            write_raster(output, &ndvi::compute_ndvi(&stacked)?)
        }
        OpKind::ThresholdBinary => {
            let raster = read_raster(input_path(step, input)?)?;
            // Presence validated at parse time.
            let threshold = step.threshold.ok_or_else(|| {
                ExecError::MalformedDocument("threshold step lost its threshold".into())
            })?;
            write_raster(output, &threshold_binary(&raster, threshold))
        }
        OpKind::ClassifyFlood => {
            let flow = read_raster(input_path(step, input)?)?;
            let classified = percentile::classify_flood_risk(&flow)?;
            write_raster(output, &classified.raster)?;
            render_classified(&classified, &map_path(output))
        }
        OpKind::ClassifyLandcover => {
            let ndvi = read_raster(input_path(step, input)?)?;
            let classified = threshold::classify_landcover(&ndvi);
            write_raster(output, &classified.raster)?;
            render_classified(&classified, &map_path(output))
        }
        OpKind::ClassifySuitability => {
            let dem = read_raster(input_path(step, input)?)?;
            let slope_deg = slope::compute_slope(&dem, SlopeUnits::Degrees);
            let classified = suitability::classify_suitability(&dem, &slope_deg)?;
            write_raster(output, &classified.raster)?;
            render_classified(&classified, &map_path(output))
        }
        // LoadInput and Unsupported are handled by the interpreter before
        // dispatch; reaching here is a plan construction error.
        OpKind::LoadInput | OpKind::Unsupported => Err(ExecError::UnsupportedOperation {
            step: step.index,
            tool: step.tool.name().to_string(),
            action: step.action.clone(),
        }),
    }
}

fn input_path<'a>(step: &PlannedStep, input: Option<&'a Path>) -> Result<&'a Path> {
    input.ok_or_else(|| ExecError::MissingInput {
        step: step.index,
        path: PathBuf::from(step.input_file.clone().unwrap_or_default()),
    })
}
