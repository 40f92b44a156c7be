use crate::{
    grid::{SharedCells, SharedCellsMut},
    pool::{drain, split_planes},
    ConvergenceMonitor, DoubleBuffer, Grid3, Problem, RelaxationSolver, ResidualAccumulator,
    SolverConfig, SolverError, Stencil, WorkerPool,
};
use anyhow::Result;
use std::cell::Cell;
use tokio::task::JoinSet;

/// Jacobi relaxation: every sweep reads only the current field and writes the
/// next one, so all cells of a sweep are independent.
///
/// # Example
///
/// ```rust
/// use poisson_relax::{JacobiSolver, Problem, RelaxationSolver, SolverConfig};
///
/// let config = SolverConfig::new(8, 1000, 1e-10);
/// let problem = Problem::uniform(8, 1.0, 0.0).unwrap();
/// let mut solver = JacobiSolver::new(config, problem).unwrap();
/// let report = solver.solve().unwrap();
/// assert!(report.converged);
/// assert!((solver.solution()[(4, 4, 4)] - 1.0).abs() < 1e-6);
/// ```
pub struct JacobiSolver {
    config: SolverConfig,
    stencil: Stencil,
    monitor: ConvergenceMonitor,
    source: Grid3,
    fields: DoubleBuffer,
    pool: Option<WorkerPool>,
}

impl JacobiSolver {
    /// Creates a single-threaded solver.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid, does not match the size of
    /// `problem`, or the scratch field cannot be allocated.
    pub fn new(config: SolverConfig, problem: Problem) -> Result<Self> {
        Self::build(config, problem, false)
    }

    /// Creates a solver that splits every sweep across a [`WorkerPool`] of
    /// `config.workers` threads.
    pub fn parallel(config: SolverConfig, problem: Problem) -> Result<Self> {
        Self::build(config, problem, true)
    }

    fn build(config: SolverConfig, problem: Problem, parallel: bool) -> Result<Self> {
        config.validate()?;
        if problem.n() != config.n {
            return Err(SolverError::InvalidConfiguration(format!(
                "problem has n = {}, configuration has n = {}",
                problem.n(),
                config.n
            ))
            .into());
        }
        let (source, initial) = problem.into_parts();
        let fields = DoubleBuffer::new(initial)?;
        let pool = if parallel {
            Some(WorkerPool::new(config.workers)?)
        } else {
            None
        };
        Ok(Self {
            config,
            stencil: Stencil::new(config.n),
            monitor: ConvergenceMonitor::new(config.norm, config.tolerance),
            source,
            fields,
            pool,
        })
    }

    /// Worker threads used per sweep, `1` for the single-threaded solver.
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(1, WorkerPool::workers)
    }

    pub fn into_solution(self) -> Grid3 {
        self.fields.into_current()
    }

    fn sweep_sequential(
        stencil: Stencil,
        source: &Grid3,
        fields: &mut DoubleBuffer,
    ) -> ResidualAccumulator {
        let n = stencil.n();
        let (current, next) = fields.split();
        let next = Cell::from_mut(next.cells_mut()).as_slice_of_cells();
        let mut acc = ResidualAccumulator::default();
        for i in 1..=n {
            for j in 1..=n {
                stencil.relax_column(i, j, source.cells(), current.cells(), next, &mut acc);
            }
        }
        acc
    }

    fn sweep_parallel(
        pool: &WorkerPool,
        stencil: Stencil,
        source: &Grid3,
        fields: &mut DoubleBuffer,
    ) -> Result<ResidualAccumulator> {
        let n = stencil.n();
        let (current, next) = fields.split();
        let source = SharedCells::new(source);
        let read = SharedCells::new(current);
        let write = SharedCellsMut::new(next);
        let chunks = split_planes(n, pool.workers());

        #[cfg(test)]
        let faults = pool.faults();
        // each task writes a disjoint range of i-planes of `next`
        let partials = pool.block_on(async move {
            let mut set = JoinSet::new();
            for (idx, planes) in chunks.into_iter().enumerate() {
                #[cfg(test)]
                let faults = faults.clone();
                #[cfg(test)]
                faults.spawn();
                set.spawn(async move {
                    #[cfg(test)]
                    faults.run(idx);
                    let mut acc = ResidualAccumulator::default();
                    for i in planes {
                        for j in 1..=n {
                            stencil.relax_column(i, j, &source, &read, &write, &mut acc);
                        }
                    }
                    #[cfg(test)]
                    faults.finish();
                    (idx, acc)
                });
            }

            let mut partials = vec![ResidualAccumulator::default(); set.len()];
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((idx, acc)) => partials[idx] = acc,
                    Err(_) => {
                        drain(&mut set).await;
                        return Err(SolverError::WorkerPanicked);
                    }
                }
            }
            Ok(partials)
        })?;

        let mut acc = ResidualAccumulator::default();
        for partial in &partials {
            acc.merge(partial);
        }
        Ok(acc)
    }
}

impl RelaxationSolver for JacobiSolver {
    fn sweep(&mut self) -> Result<f64> {
        let acc = match &self.pool {
            Some(pool) => Self::sweep_parallel(pool, self.stencil, &self.source, &mut self.fields)?,
            None => Self::sweep_sequential(self.stencil, &self.source, &mut self.fields),
        };
        // every task has been joined, the roles can change now
        self.fields.swap();
        Ok(self.monitor.finish(&acc, self.config.n))
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn monitor(&self) -> &ConvergenceMonitor {
        &self.monitor
    }

    fn solution(&self) -> &Grid3 {
        self.fields.current()
    }

    fn bytes_total(&self) -> usize {
        self.source.bytes_total() + self.fields.bytes_total()
    }
}
