use crate::{
    wavefront::WavefrontExecutor, ConvergenceMonitor, Grid3, Problem, RelaxationSolver,
    ResidualAccumulator, SolverConfig, SolverError, Stencil, TaskGraph, WavefrontKind, WorkerPool,
};
use anyhow::Result;
use std::cell::Cell;

enum Schedule {
    Sequential,
    Wavefront { graph: TaskGraph, pool: WorkerPool },
}

/// Gauss-Seidel relaxation: a single field updated in place, each cell seeing
/// the values already updated earlier in the same sweep.
///
/// The sequential schedule visits cells in increasing `i`, then `j`, then `k`.
/// The wavefront schedule runs the columns `(i, j)` on a [`WorkerPool`] in an
/// order allowed by a [`TaskGraph`]; every cell is computed from exactly the
/// same operands as in the sequential sweep, so both produce the same field.
///
/// # Example
///
/// ```rust
/// use poisson_relax::{GaussSeidelSolver, Problem, RelaxationSolver, SolverConfig, WavefrontKind};
///
/// let config = SolverConfig::new(6, 500, 1e-8).with_workers(2);
/// let problem = Problem::centered_block(6, 20.0, 20.0, 2, 200.0).unwrap();
/// let mut sequential = GaussSeidelSolver::new(config, problem.clone()).unwrap();
/// let mut wavefront =
///     GaussSeidelSolver::wavefront(config, problem, WavefrontKind::PointToPoint).unwrap();
///
/// let report = sequential.solve().unwrap();
/// assert_eq!(wavefront.solve().unwrap().iterations, report.iterations);
/// assert_eq!(sequential.solution(), wavefront.solution());
/// ```
pub struct GaussSeidelSolver {
    config: SolverConfig,
    stencil: Stencil,
    monitor: ConvergenceMonitor,
    source: Grid3,
    field: Grid3,
    schedule: Schedule,
}

impl GaussSeidelSolver {
    /// Creates a single-threaded solver.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or does not match the size of `problem`.
    pub fn new(config: SolverConfig, problem: Problem) -> Result<Self> {
        Self::build(config, problem, None)
    }

    /// Creates a solver that runs every sweep as a wavefront over a worker pool
    /// of `config.workers` threads.
    pub fn wavefront(config: SolverConfig, problem: Problem, kind: WavefrontKind) -> Result<Self> {
        Self::build(config, problem, Some(kind))
    }

    fn build(config: SolverConfig, problem: Problem, kind: Option<WavefrontKind>) -> Result<Self> {
        config.validate()?;
        if problem.n() != config.n {
            return Err(SolverError::InvalidConfiguration(format!(
                "problem has n = {}, configuration has n = {}",
                problem.n(),
                config.n
            ))
            .into());
        }
        let schedule = match kind {
            None => Schedule::Sequential,
            Some(kind) => Schedule::Wavefront {
                graph: TaskGraph::new(config.n, kind),
                pool: WorkerPool::new(config.workers)?,
            },
        };
        let (source, field) = problem.into_parts();
        Ok(Self {
            config,
            stencil: Stencil::new(config.n),
            monitor: ConvergenceMonitor::new(config.norm, config.tolerance),
            source,
            field,
            schedule,
        })
    }

    /// The dependency graph of the wavefront schedule, `None` for the sequential one.
    pub fn task_graph(&self) -> Option<&TaskGraph> {
        match &self.schedule {
            Schedule::Sequential => None,
            Schedule::Wavefront { graph, .. } => Some(graph),
        }
    }

    /// Worker threads used per sweep, `1` for the sequential schedule.
    pub fn workers(&self) -> usize {
        match &self.schedule {
            Schedule::Sequential => 1,
            Schedule::Wavefront { pool, .. } => pool.workers(),
        }
    }

    pub fn into_solution(self) -> Grid3 {
        self.field
    }

    fn sweep_sequential(
        stencil: Stencil,
        source: &Grid3,
        field: &mut Grid3,
    ) -> ResidualAccumulator {
        let cells = Cell::from_mut(field.cells_mut()).as_slice_of_cells();
        let mut acc = ResidualAccumulator::default();
        for i in 1..=stencil.n() {
            for j in 1..=stencil.n() {
                stencil.relax_column(i, j, source.cells(), cells, cells, &mut acc);
            }
        }
        acc
    }
}

impl RelaxationSolver for GaussSeidelSolver {
    fn sweep(&mut self) -> Result<f64> {
        let acc = match &self.schedule {
            Schedule::Sequential => {
                Self::sweep_sequential(self.stencil, &self.source, &mut self.field)
            }
            Schedule::Wavefront { graph, pool } => {
                let partials = WavefrontExecutor::new(graph, self.stencil).run(
                    pool,
                    &self.source,
                    &mut self.field,
                )?;
                partials
                    .iter()
                    .fold(ResidualAccumulator::default(), |mut acc, partial| {
                        acc.merge(partial);
                        acc
                    })
            }
        };
        Ok(self.monitor.finish(&acc, self.config.n))
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn monitor(&self) -> &ConvergenceMonitor {
        &self.monitor
    }

    fn solution(&self) -> &Grid3 {
        &self.field
    }

    fn bytes_total(&self) -> usize {
        self.source.bytes_total() + self.field.bytes_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JacobiSolver, Norm};

    #[test]
    fn test_single_sweep_values() {
        let config = SolverConfig::new(3, 10, 1e-9).with_norm(Norm::MaxAbs);
        let problem = Problem::uniform(3, 6.0, 0.0).unwrap();
        let mut solver = GaussSeidelSolver::new(config, problem).unwrap();
        solver.sweep().unwrap();

        let u = solver.solution();
        assert_eq!(u[(1, 1, 1)], 3.0);
        // (1, 1, 1) was already updated when (1, 1, 2) was visited
        assert_eq!(u[(1, 1, 2)], 2.5);
    }

    #[test]
    fn test_converges_faster_than_jacobi() {
        let n = 8;
        let config = SolverConfig::new(n, 2000, 1e-8);
        let problem = Problem::radiator(n, 0.0).unwrap();
        let gs = GaussSeidelSolver::new(config, problem.clone())
            .unwrap()
            .solve()
            .unwrap();
        let jacobi = JacobiSolver::new(config, problem).unwrap().solve().unwrap();
        assert!(gs.converged && jacobi.converged);
        assert!(gs.iterations < jacobi.iterations);
    }

    #[test]
    fn test_wavefront_residual_close_to_sequential() {
        let n = 7;
        let config = SolverConfig::new(n, 40, 1e-12).with_workers(3);
        let problem = Problem::radiator(n, 0.0).unwrap();
        let mut sequential = GaussSeidelSolver::new(config, problem.clone()).unwrap();
        let mut wavefront =
            GaussSeidelSolver::wavefront(config, problem, WavefrontKind::PointToPoint).unwrap();
        assert_eq!(wavefront.workers(), 3);
        assert!(sequential.task_graph().is_none());
        assert_eq!(
            wavefront.task_graph().map(TaskGraph::kind),
            Some(WavefrontKind::PointToPoint)
        );

        for _ in 0..20 {
            let expected = sequential.sweep().unwrap();
            let actual = wavefront.sweep().unwrap();
            assert!((actual - expected).abs() <= 1e-9 * expected);
        }
        assert_eq!(sequential.solution(), wavefront.solution());
    }
}
