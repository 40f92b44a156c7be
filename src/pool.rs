use crate::{SolverError, WORKER_THREADS};
use anyhow::{Context, Result};
use std::{future::Future, ops::Range, sync::atomic::Ordering};
use tokio::{runtime::Runtime, task::JoinSet};
#[cfg(test)]
use std::sync::{atomic::AtomicUsize, Arc};

/// Fixed-size pool of worker threads shared by the parallel sweeps.
///
/// All parallelism is data-parallel loop execution over the grid: a sweep
/// spawns CPU-bound tasks onto the pool and blocks the calling thread until
/// every one of them has been joined.
pub struct WorkerPool {
    runtime: Runtime,
    workers: usize,
    #[cfg(test)]
    faults: Arc<TaskFaults>,
}

impl WorkerPool {
    /// Starts a pool with `workers` threads.
    ///
    /// With `None` the size comes from [`WORKER_THREADS`], and when that is zero
    /// from the runtime default (one thread per core).
    pub fn new(workers: Option<usize>) -> Result<Self> {
        let threads = workers.unwrap_or(WORKER_THREADS.load(Ordering::Relaxed) as usize);
        if workers == Some(0) {
            return Err(
                SolverError::InvalidConfiguration("worker count must be positive".into()).into(),
            );
        }

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if threads > 0 {
            builder.worker_threads(threads);
        }
        let runtime = builder
            .thread_name("poisson-worker")
            .build()
            .context("Failed to start the worker pool")?;
        let workers = runtime.metrics().num_workers();
        Ok(Self {
            runtime,
            workers,
            #[cfg(test)]
            faults: Arc::default(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    #[cfg(test)]
    pub(crate) fn faults(&self) -> Arc<TaskFaults> {
        self.faults.clone()
    }

    #[cfg(test)]
    pub(crate) fn set_faults(&mut self, faults: Arc<TaskFaults>) {
        self.faults = faults;
    }
}

/// Makes the task with a chosen index panic and counts the tasks spawned and
/// finished by every sweep run on the pool.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct TaskFaults {
    panic_on: Option<usize>,
    spawned: AtomicUsize,
    finished: AtomicUsize,
}

#[cfg(test)]
impl TaskFaults {
    pub(crate) fn panic_on(task: usize) -> Arc<Self> {
        Arc::new(Self {
            panic_on: Some(task),
            ..Default::default()
        })
    }

    pub(crate) fn spawn(&self) {
        self.spawned.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn run(&self, task: usize) {
        if self.panic_on == Some(task) {
            panic!("task {} failed", task);
        }
    }

    pub(crate) fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub(crate) fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Splits the interior planes `1..=n` into at most `parts` contiguous ranges of
/// nearly equal length.
pub(crate) fn split_planes(n: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, n.max(1));
    let (base, extra) = (n / parts, n % parts);
    let mut start = 1;
    (0..parts)
        .map(|p| {
            let len = base + usize::from(p < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Waits for every task left in `set`, discarding results.
///
/// Tasks spawned by a sweep hold views of the fields being updated, so no sweep
/// may return, not even with an error, while one of them is still running.
pub(crate) async fn drain<T: 'static>(set: &mut JoinSet<T>) {
    while set.join_next().await.is_some() {}
}
