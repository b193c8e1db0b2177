//! Solve a constrained supermodel once per row of a weighting table
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use mmon_gcm_cli::{
    atpase_constraint, init_logging, light_colour, parse_args, processes, starch_knockout,
};
use mmon_gcm_core::alternative_modes::{
    generate_weightings, run_alternative_modes, DEFAULT_WEIGHT_RANGE,
};
use mmon_gcm_core::batch::checkpoint::CheckpointStore;
use mmon_gcm_core::batch::finish;
use mmon_gcm_core::batch::pool::WorkerPool;
use mmon_gcm_core::configuration;
use mmon_gcm_core::io::tables::{
    read_indexed_table, read_parameter_table, write_indexed_table, write_results,
};
use mmon_gcm_core::metabolic_model::model::Model;
use mmon_gcm_core::supermodel::conditions::{
    LightColour, PhysiologicalConditions, DEFAULT_ATPASE_FACTOR, DEFAULT_PHOTON_TOTAL,
};

#[derive(Parser, Debug)]
#[command(name = "run_alternative_modes")]
#[command(about = "Weighted pFBA and FVA of a guard cell supermodel, once per weighting row", long_about = None)]
struct Args {
    /// Results CSV, solutions in progress are kept in _tmp next to it
    results_path: PathBuf,
    /// Supermodel in COBRA JSON format
    model_path: PathBuf,
    /// Weightings CSV, one row per solve, written first when --generate is given
    weightings_path: PathBuf,
    /// Parameters CSV
    parameters_path: PathBuf,
    /// blue, white or nops
    #[arg(value_parser = light_colour)]
    light_colour: LightColour,
    /// True or False
    #[arg(value_parser = atpase_constraint, action = clap::ArgAction::Set)]
    atpase_constraint: bool,
    /// True or False
    #[arg(value_parser = starch_knockout, action = clap::ArgAction::Set)]
    starch_knockout: bool,
    /// Number of worker threads
    #[arg(value_parser = processes)]
    no_cores: usize,
    /// Draw this many rows of random weightings and save them to the weightings path
    #[arg(long, value_name = "ROWS")]
    generate: Option<usize>,
    /// Seed for --generate
    #[arg(long, default_value_t = 0, requires = "generate")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let args: Args = parse_args();
    init_logging();
    let configuration = configuration::current();
    let conditions = PhysiologicalConditions {
        light: args.light_colour,
        atpase: args.atpase_constraint.then_some(DEFAULT_ATPASE_FACTOR),
        starch_knockout: args.starch_knockout,
    };

    let model = Model::read_json(&args.model_path)
        .with_context(|| format!("Unable to load model {}", args.model_path.display()))?;
    let parameters = read_parameter_table(&args.parameters_path)
        .with_context(|| format!("Unable to load parameters {}", args.parameters_path.display()))?;
    info!("Model {} loaded", model.id.as_deref().unwrap_or("without id"));
    if let Some(rows) = args.generate {
        let split = model.split_reversible()?;
        let ids: Vec<&str> = split.reactions.keys().map(|id| id.as_str()).collect();
        let generated = generate_weightings(&ids, rows, DEFAULT_WEIGHT_RANGE, args.seed)?;
        write_indexed_table(&args.weightings_path, &generated).with_context(|| {
            format!("Unable to save weightings {}", args.weightings_path.display())
        })?;
        info!(
            "{} rows of weightings with seed {} saved to {}",
            rows,
            args.seed,
            args.weightings_path.display()
        );
    }
    let weightings = read_indexed_table(&args.weightings_path)
        .with_context(|| format!("Unable to load weightings {}", args.weightings_path.display()))?;

    let model = conditions.constrain_model(parameters, model, DEFAULT_PHOTON_TOTAL)?;
    let store = CheckpointStore::for_results(&args.results_path);
    let pool = WorkerPool::new(args.no_cores)?;
    let outcome =
        run_alternative_modes(&model, &weightings, &store, &pool, configuration.tolerance)?;
    info!(
        "{} rows, {} solved previously, {} solved in this run",
        outcome.total, outcome.previously_solved, outcome.solved_this_run
    );
    finish(&outcome, &store, &args.results_path, |path| {
        write_results(path, &outcome.results, None)
    })?;
    Ok(())
}
