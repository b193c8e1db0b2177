//! Resumable, parallel batches of solves
//!
//! A batch walks through INIT → RESUMING → SOLVING → AGGREGATING and ends either
//! complete (every row has a record, the checkpoint store is deleted) or
//! resumable (the store is kept for the next run).
pub mod checkpoint;
pub mod pool;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info, warn};
use thiserror::Error;

use crate::batch::checkpoint::{CheckpointError, CheckpointStore};
use crate::batch::pool::WorkerPool;
use crate::io::tables::TableError;
use crate::solving::SolutionRecord;

/// How a batch ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Every row has a record
    Complete,
    /// Some rows have no record, the checkpoint store is kept
    Resumable { pending: Vec<usize> },
}

#[derive(Clone, Debug)]
pub struct BatchOutcome {
    /// Number of input rows
    pub total: usize,
    /// Rows found in the checkpoint store when the batch started
    pub previously_solved: usize,
    /// Rows solved and stored during this run
    pub solved_this_run: usize,
    /// Records of every row that has one, in input order
    pub results: IndexMap<usize, SolutionRecord>,
    pub completion: Completion,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }
}

/// Solve every row that has no record yet and gather all records
///
/// `solve` is called once per pending row, in parallel on `pool`. A row whose
/// record cannot be written stays pending. An error returned by `solve` aborts
/// the batch once running tasks finish, records already stored are kept.
pub fn run_batch<I, E, F>(
    rows: &IndexMap<usize, I>,
    store: &CheckpointStore,
    pool: &WorkerPool,
    solve: F,
) -> Result<BatchOutcome, E>
where
    I: Sync,
    E: From<BatchError> + Send + Debug,
    F: Fn(usize, &I) -> Result<SolutionRecord, E> + Sync + Send,
{
    // Resuming
    let existing: BTreeSet<usize> = if store.exists() {
        info!(
            "Already a tmp directory at {}, checking for existing solutions",
            store.directory().display()
        );
        match store.remove_partial() {
            Ok(0) => {}
            Ok(removed) => info!("Removed {} partially written solutions", removed),
            Err(err) => warn!("Unable to remove partially written solutions: {}", err),
        }
        let keys = store.keys().unwrap_or_else(|err| {
            warn!("Unable to list existing solutions, solving every row: {}", err);
            BTreeSet::new()
        });
        let existing: BTreeSet<usize> = keys.into_iter().filter(|key| rows.contains_key(key)).collect();
        info!(
            "There are already {} solutions, dropping these from the batch",
            existing.len()
        );
        existing
    } else {
        info!(
            "No existing tmp directory at {}, creating temp directory to store solutions as they come in",
            store.directory().display()
        );
        store.ensure().map_err(BatchError::from)?;
        BTreeSet::new()
    };

    // Solving
    let pending: Vec<usize> = rows
        .keys()
        .copied()
        .filter(|key| !existing.contains(key))
        .collect();
    info!(
        "Solving {} rows with {} workers",
        pending.len(),
        pool.workers()
    );
    let stored = std::sync::atomic::AtomicUsize::new(0);
    pool.try_for_each(pending, |key| -> Result<(), E> {
        let Some(row) = rows.get(&key) else {
            return Ok(());
        };
        let record = solve(key, row)?;
        debug!("Row {} solved: {}", key, record.status);
        match store.write(key, &record) {
            Ok(()) => {
                stored.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
            Err(err) => warn!("Row {} stays pending, unable to store its solution: {}", key, err),
        }
        Ok(())
    })?;

    // Aggregating
    let mut results = IndexMap::with_capacity(rows.len());
    let mut missing = Vec::new();
    for key in rows.keys().copied() {
        if !store.contains(key) {
            missing.push(key);
            continue;
        }
        match store.read::<SolutionRecord>(key) {
            Ok(record) => {
                results.insert(key, record);
            }
            Err(err) => {
                warn!("Discarding unreadable solution for row {}: {}", key, err);
                if let Err(err) = store.remove_key(key) {
                    warn!("{}", err);
                }
                missing.push(key);
            }
        }
    }
    let completion = if missing.is_empty() {
        Completion::Complete
    } else {
        Completion::Resumable { pending: missing }
    };
    Ok(BatchOutcome {
        total: rows.len(),
        previously_solved: existing.len(),
        solved_this_run: stored.into_inner(),
        results,
        completion,
    })
}

/// Terminal state: write the results and remove the store if every row was solved,
/// otherwise keep the store and report what is left
pub fn finish<P, W>(
    outcome: &BatchOutcome,
    store: &CheckpointStore,
    results_path: P,
    write: W,
) -> Result<(), BatchError>
where
    P: AsRef<Path>,
    W: FnOnce(&Path) -> Result<(), TableError>,
{
    let results_path = results_path.as_ref();
    match &outcome.completion {
        Completion::Complete => {
            write(results_path)?;
            info!("All solutions saved to {}", results_path.display());
            info!("Deleting temp directory {}", store.directory().display());
            store.remove()?;
        }
        Completion::Resumable { pending } => {
            warn!(
                "{} of {} rows are still pending, keeping {} so the run can be resumed",
                pending.len(),
                outcome.total,
                store.directory().display()
            );
        }
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),
    #[error("Unable to start worker pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Table(#[from] TableError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::OptimizationStatus;

    fn scratch() -> (tempfile::TempDir, CheckpointStore) {
        let directory = tempfile::tempdir().unwrap();
        let store = CheckpointStore::for_results(directory.path().join("results.csv"));
        (directory, store)
    }

    fn record(value: f64) -> SolutionRecord {
        SolutionRecord {
            status: OptimizationStatus::Optimal,
            objective_value: Some(value),
            biological_objective: Some(value),
            fluxes: IndexMap::new(),
            variability: IndexMap::new(),
        }
    }

    fn rows(n: usize) -> IndexMap<usize, f64> {
        (0..n).map(|key| (key, key as f64)).collect()
    }

    #[test]
    fn solves_only_pending_rows() {
        let (_directory, store) = scratch();
        store.ensure().unwrap();
        store.write(1, &record(-1.)).unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let calls = std::sync::Mutex::new(Vec::new());
        let outcome = run_batch(&rows(3), &store, &pool, |key, value: &f64| {
            calls.lock().unwrap().push(key);
            Ok::<_, BatchError>(record(*value))
        })
        .unwrap();
        let mut calls = calls.into_inner().unwrap();
        calls.sort();
        assert_eq!(calls, vec![0, 2]);
        assert_eq!(outcome.previously_solved, 1);
        assert_eq!(outcome.solved_this_run, 2);
        assert!(outcome.is_complete());
        assert_eq!(outcome.results.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(outcome.results[&1].objective_value, Some(-1.));
    }

    #[test]
    fn fatal_error_keeps_stored_rows() {
        let (_directory, store) = scratch();
        let pool = WorkerPool::new(1).unwrap();
        let result = run_batch(&rows(3), &store, &pool, |key, value: &f64| {
            if key == 1 {
                Err(BatchError::ThreadPool("boom".to_string()))
            } else {
                Ok(record(*value))
            }
        });
        assert!(result.is_err());
        assert!(store.exists());
        assert!(!store.contains(1));
    }

    #[test]
    fn finish_keeps_store_when_incomplete() {
        let (_directory, store) = scratch();
        store.ensure().unwrap();
        let outcome = BatchOutcome {
            total: 2,
            previously_solved: 0,
            solved_this_run: 1,
            results: IndexMap::new(),
            completion: Completion::Resumable { pending: vec![1] },
        };
        let results_path = store.directory().parent().unwrap().join("results.csv");
        finish(&outcome, &store, &results_path, |_| panic!("must not write")).unwrap();
        assert!(store.exists());
        assert!(!results_path.exists());
    }
}
