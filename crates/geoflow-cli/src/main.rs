/// Workflow runner: parses a JSON workflow document, executes it against the
/// run's directory layout, and prints every produced artifact path.
///
/// Exit 0 on full success with all declared outputs present; exit 1 on fatal
/// error with a message naming the step index and error kind on stderr.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use geoflow_core::registry::REGISTRY;
use geoflow_core::workflow::document::parse_document;
use geoflow_core::{Interpreter, RunContext};

#[derive(Parser, Debug)]
#[command(name = "geoflow", about = "Execute declarative geospatial workflows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a workflow document
    Run {
        /// Path to the workflow JSON document
        workflow: PathBuf,

        /// Directory of uploaded source rasters and band files
        #[arg(long, default_value = "data/uploads")]
        uploads: PathBuf,

        /// Directory receiving every intermediate and final raster
        #[arg(long, default_value = "data/outputs")]
        outputs: PathBuf,

        /// Per-run boundary cache directory
        #[arg(long, default_value = "data/geojson")]
        geojson: PathBuf,

        /// Read-only gazetteer of `<key>_boundary.geojson` files
        #[arg(long, default_value = "data/gazetteer")]
        gazetteer: PathBuf,
    },
    /// Print the operation registry
    ListOps,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    match Cli::parse().command {
        Command::Run {
            workflow,
            uploads,
            outputs,
            geojson,
            gazetteer,
        } => run(workflow, uploads, outputs, geojson, gazetteer),
        Command::ListOps => {
            list_ops();
            Ok(())
        }
    }
}

fn run(
    workflow: PathBuf,
    uploads: PathBuf,
    outputs: PathBuf,
    geojson: PathBuf,
    gazetteer: PathBuf,
) -> Result<()> {
    let text = fs::read_to_string(&workflow)
        .with_context(|| format!("reading workflow document {}", workflow.display()))?;
    let plan = parse_document(&text)?;

    let ctx = RunContext {
        uploads_dir: uploads,
        outputs_dir: outputs,
        geojson_dir: geojson,
        gazetteer_dir: gazetteer,
    };
    let produced = Interpreter::new(ctx)
        .execute(&plan)
        .context("workflow execution failed")?;

    for path in &produced {
        println!("{}", path.display());
    }
    Ok(())
}

fn list_ops() {
    println!(
        "{:<22} {:<16} {:<28} {}",
        "OPERATION", "CATEGORY", "OUTPUT", "SUMMARY"
    );
    for spec in REGISTRY {
        println!(
            "{:<22} {:<16} {:<28} {}",
            spec.name, spec.category, spec.output, spec.summary
        );
    }
}
