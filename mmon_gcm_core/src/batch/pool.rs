//! Worker pool shared by the batch drivers
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::batch::BatchError;

/// A fixed size pool of worker threads, created once per batch run
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, BatchError> {
        if workers == 0 {
            return Err(BatchError::InvalidWorkerCount(workers));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("mmon-gcm-worker-{}", index))
            .build()
            .map_err(|err| BatchError::ThreadPool(err.to_string()))?;
        Ok(Self { pool, workers })
    }

    /// Pool sized from the configured worker count
    pub fn from_configuration() -> Result<Self, BatchError> {
        Self::new(crate::configuration::current().processes)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run a task for every item, stopping early on the first error
    ///
    /// Items are independent, there is no ordering between tasks.
    pub fn try_for_each<T, E, F>(&self, items: Vec<T>, task: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        F: Fn(T) -> Result<(), E> + Sync + Send,
    {
        self.pool
            .install(|| items.into_par_iter().try_for_each(|item| task(item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_every_item() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);
        let sum = AtomicUsize::new(0);
        pool.try_for_each((1..=100).collect(), |i: usize| {
            sum.fetch_add(i, Ordering::Relaxed);
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(sum.into_inner(), 5050);
    }

    #[test]
    fn stops_on_error() {
        let pool = WorkerPool::new(1).unwrap();
        let result = pool.try_for_each(vec![1, 2, 3], |i: i32| if i == 2 { Err(i) } else { Ok(()) });
        assert_eq!(result, Err(2));
    }

    #[test]
    fn zero_workers() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(BatchError::InvalidWorkerCount(0))
        ));
    }
}
