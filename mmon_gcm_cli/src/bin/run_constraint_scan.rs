//! Solve a supermodel at every point of a constraint scan
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use mmon_gcm_cli::{init_logging, light_colour, parse_args, processes, starch_knockout};
use mmon_gcm_core::batch::checkpoint::CheckpointStore;
use mmon_gcm_core::batch::finish;
use mmon_gcm_core::batch::pool::WorkerPool;
use mmon_gcm_core::configuration;
use mmon_gcm_core::constraint_scan::{full_factorial, random_samples, run_constraint_scan};
use mmon_gcm_core::io::tables::{
    read_indexed_table, read_parameter_table, write_indexed_table, write_results,
};
use mmon_gcm_core::metabolic_model::model::Model;
use mmon_gcm_core::supermodel::conditions::{LightColour, PhysiologicalConditions};

#[derive(Parser, Debug)]
#[command(name = "run_constraint_scan")]
#[command(about = "pFBA and FVA of a guard cell supermodel over a table of constraint values", long_about = None)]
struct Args {
    /// Results CSV, solutions in progress are kept in _tmp next to it
    results_path: PathBuf,
    /// Supermodel in COBRA JSON format
    model_path: PathBuf,
    /// Constraints CSV, one raw value in [0, 1] per scanned dimension, written
    /// first when --grid or --samples is given
    constraints_path: PathBuf,
    /// Parameters CSV with Min and Max for every scanned dimension
    parameters_path: PathBuf,
    /// blue, white or nops
    #[arg(value_parser = light_colour)]
    light_colour: LightColour,
    /// True or False
    #[arg(value_parser = starch_knockout, action = clap::ArgAction::Set)]
    starch_knockout: bool,
    /// Number of worker threads
    #[arg(value_parser = processes)]
    no_cores: usize,
    /// Scanned columns for --grid and --samples, e.g. light,atpase
    #[arg(long, value_delimiter = ',')]
    dimensions: Vec<String>,
    /// Write a full factorial table with this many levels per dimension
    #[arg(long, value_name = "LEVELS", requires = "dimensions", conflicts_with = "samples")]
    grid: Option<usize>,
    /// Write this many uniformly sampled rows
    #[arg(long, value_name = "ROWS", requires = "dimensions")]
    samples: Option<usize>,
    /// Seed for --samples
    #[arg(long, default_value_t = 0, requires = "samples")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let args: Args = parse_args();
    init_logging();
    let configuration = configuration::current();
    let conditions = PhysiologicalConditions {
        light: args.light_colour,
        atpase: None,
        starch_knockout: args.starch_knockout,
    };

    let model = Model::read_json(&args.model_path)
        .with_context(|| format!("Unable to load model {}", args.model_path.display()))?;
    let parameters = read_parameter_table(&args.parameters_path)
        .with_context(|| format!("Unable to load parameters {}", args.parameters_path.display()))?;
    let generated = match (args.grid, args.samples) {
        (Some(levels), _) => Some(full_factorial(&args.dimensions, levels)),
        (None, Some(rows)) => Some(random_samples(&args.dimensions, rows, args.seed)),
        (None, None) => None,
    };
    if let Some(generated) = generated {
        write_indexed_table(&args.constraints_path, &generated).with_context(|| {
            format!("Unable to save constraints {}", args.constraints_path.display())
        })?;
        info!(
            "{} scan points over {} saved to {}",
            generated.len(),
            args.dimensions.join(", "),
            args.constraints_path.display()
        );
    }
    let constraints = read_indexed_table(&args.constraints_path).with_context(|| {
        format!("Unable to load constraints {}", args.constraints_path.display())
    })?;

    let store = CheckpointStore::for_results(&args.results_path);
    let pool = WorkerPool::new(args.no_cores)?;
    let outcome = run_constraint_scan(
        &model,
        &parameters,
        &constraints,
        &conditions,
        &store,
        &pool,
        configuration.tolerance,
    )?;
    info!(
        "{} points, {} solved previously, {} solved in this run",
        outcome.batch.total, outcome.batch.previously_solved, outcome.batch.solved_this_run
    );
    finish(&outcome.batch, &store, &args.results_path, |path| {
        write_results(path, &outcome.batch.results, Some(&outcome.dimensions))
    })?;
    Ok(())
}
