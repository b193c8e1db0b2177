use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tempfile::TempDir;
use mmon_gcm_core::alternative_modes::run_alternative_modes;
use mmon_gcm_core::batch::checkpoint::CheckpointStore;
use mmon_gcm_core::batch::pool::WorkerPool;
use mmon_gcm_core::batch::{finish, Completion};
use mmon_gcm_core::io::tables::{read_indexed_table, read_parameter_table, write_results, IndexedTable};
use mmon_gcm_core::metabolic_model::model::Model;
use mmon_gcm_core::optimize::OptimizationStatus;
use mmon_gcm_core::solving::SolutionRecord;
use mmon_gcm_core::supermodel::conditions::{
    LightColour, PhysiologicalConditions, DEFAULT_ATPASE_FACTOR, DEFAULT_PHOTON_TOTAL,
};

const TOLERANCE: f64 = 1e-7;

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data").join(name)
}

/// Fresh directory per test, the store lives in `<dir>/_tmp`
fn run_directory() -> TempDir {
    tempfile::tempdir().unwrap()
}

fn constrained_model() -> Model {
    let conditions = PhysiologicalConditions {
        light: LightColour::White,
        atpase: Some(DEFAULT_ATPASE_FACTOR),
        starch_knockout: false,
    };
    conditions
        .constrain_model(
            read_parameter_table(test_data("toy_parameters.csv")).unwrap(),
            Model::read_json(test_data("toy_supermodel.json")).unwrap(),
            DEFAULT_PHOTON_TOTAL,
        )
        .unwrap()
}

fn weightings() -> IndexedTable {
    read_indexed_table(test_data("toy_weightings.csv")).unwrap()
}

fn sentinel() -> SolutionRecord {
    SolutionRecord {
        status: OptimizationStatus::Optimal,
        objective_value: Some(-1.),
        biological_objective: Some(-1.),
        fluxes: IndexMap::new(),
        variability: IndexMap::new(),
    }
}

fn results_path(directory: &Path) -> PathBuf {
    directory.join("results.csv")
}

#[test]
fn three_rows_from_scratch() {
    let directory = run_directory();
    let results = results_path(directory.path());
    let store = CheckpointStore::for_results(&results);
    let pool = WorkerPool::new(2).unwrap();

    let outcome =
        run_alternative_modes(&constrained_model(), &weightings(), &store, &pool, TOLERANCE).unwrap();
    assert_eq!(outcome.previously_solved, 0);
    assert_eq!(outcome.solved_this_run, 3);
    assert_eq!(outcome.completion, Completion::Complete);
    finish(&outcome, &store, &results, |path| write_results(path, &outcome.results, None)).unwrap();

    let written = read_indexed_table_keys(&results);
    assert_eq!(written, vec![0, 1, 2]);
    assert!(!directory.path().join("_tmp").exists());
}

fn read_indexed_table_keys(path: &Path) -> Vec<usize> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|record| record.unwrap()[0].parse().unwrap())
        .collect()
}

#[test]
fn resumes_from_a_presolved_row() {
    let directory = run_directory();
    let store = CheckpointStore::for_results(results_path(directory.path()));
    store.ensure().unwrap();
    store.write(1, &sentinel()).unwrap();
    let pool = WorkerPool::new(2).unwrap();

    let outcome =
        run_alternative_modes(&constrained_model(), &weightings(), &store, &pool, TOLERANCE).unwrap();
    assert_eq!(outcome.previously_solved, 1);
    assert_eq!(outcome.solved_this_run, 2);
    assert!(outcome.is_complete());
    assert_eq!(outcome.results.len(), 3);
    // the stored row is taken as is, not solved again
    assert_eq!(outcome.results[&1], sentinel());
    assert_eq!(outcome.results[&0].status, OptimizationStatus::Optimal);
}

#[test]
fn resumed_run_matches_uninterrupted_run() {
    let model = constrained_model();
    let pool = WorkerPool::new(2).unwrap();

    let full_directory = run_directory();
    let full_store = CheckpointStore::for_results(results_path(full_directory.path()));
    let full = run_alternative_modes(&model, &weightings(), &full_store, &pool, TOLERANCE).unwrap();

    let resumed_directory = run_directory();
    let resumed_store = CheckpointStore::for_results(results_path(resumed_directory.path()));
    resumed_store.ensure().unwrap();
    resumed_store.write(0, &full.results[&0]).unwrap();
    resumed_store.write(2, &full.results[&2]).unwrap();
    let resumed =
        run_alternative_modes(&model, &weightings(), &resumed_store, &pool, TOLERANCE).unwrap();
    assert_eq!(resumed.previously_solved, 2);
    assert_eq!(resumed.solved_this_run, 1);
    // same rows, same order, same fluxes and ranges
    assert_eq!(resumed.results, full.results);

}

#[test]
fn unreadable_rows_stay_pending() {
    let directory = run_directory();
    let results = results_path(directory.path());
    let store = CheckpointStore::for_results(&results);
    store.ensure().unwrap();
    std::fs::write(store.directory().join("2.json"), "{\"status\": ").unwrap();
    let pool = WorkerPool::new(1).unwrap();
    let model = constrained_model();

    let outcome = run_alternative_modes(&model, &weightings(), &store, &pool, TOLERANCE).unwrap();
    assert_eq!(outcome.completion, Completion::Resumable { pending: vec![2] });
    assert_eq!(outcome.results.len(), 2);
    finish(&outcome, &store, &results, |path| write_results(path, &outcome.results, None)).unwrap();
    assert!(store.exists());
    assert!(!results.exists());
    assert_eq!(store.keys().unwrap().into_iter().collect::<Vec<_>>(), vec![0, 1]);

    // the next run only solves what is left
    let outcome = run_alternative_modes(&model, &weightings(), &store, &pool, TOLERANCE).unwrap();
    assert_eq!(outcome.previously_solved, 2);
    assert_eq!(outcome.solved_this_run, 1);
    assert!(outcome.is_complete());
    finish(&outcome, &store, &results, |path| write_results(path, &outcome.results, None)).unwrap();
    assert!(results.exists());
    assert!(!store.exists());
}
