use crate::{
    GaussSeidelSolver, JacobiSolver, Norm, Problem, RelaxationSolver, SolverError, WavefrontKind,
};
use anyhow::Result;

/// Parameters of one solve, fixed for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    /// Interior cells per axis.
    pub n: usize,
    /// Maximum number of sweeps.
    pub iter_max: usize,
    /// The solve stops once the residual is strictly below this value.
    pub tolerance: f64,
    /// Norm of the residual, see [`Norm`].
    pub norm: Norm,
    /// Size of the worker pool for parallel methods.
    /// `None` falls back to [`WORKER_THREADS`](crate::WORKER_THREADS).
    pub workers: Option<usize>,
}

impl SolverConfig {
    pub fn new(n: usize, iter_max: usize, tolerance: f64) -> Self {
        Self {
            n,
            iter_max,
            tolerance,
            norm: Norm::default(),
            workers: None,
        }
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Checks the parameters without allocating anything.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if the grid size or iteration cap is
    /// zero, the tolerance is not a positive finite number, or zero workers were
    /// requested.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.n == 0 {
            "grid size must be positive"
        } else if self.iter_max == 0 {
            "iteration cap must be positive"
        } else if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            "tolerance must be a positive finite number"
        } else if self.workers == Some(0) {
            "worker count must be positive"
        } else {
            return Ok(());
        };
        Err(SolverError::InvalidConfiguration(reason.into()).into())
    }
}

/// The available relaxation methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Single-threaded Jacobi.
    Jacobi,
    /// Jacobi with the interior planes split across the worker pool.
    JacobiParallel,
    /// Single-threaded Gauss-Seidel in `(i, j, k)` order.
    GaussSeidel,
    /// Gauss-Seidel with point-to-point wavefront scheduling.
    Wavefront,
    /// Gauss-Seidel with a barrier after every diagonal.
    WavefrontBarrier,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Jacobi,
        Method::JacobiParallel,
        Method::GaussSeidel,
        Method::Wavefront,
        Method::WavefrontBarrier,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Jacobi => "jacobi",
            Method::JacobiParallel => "jacobi-parallel",
            Method::GaussSeidel => "gauss-seidel",
            Method::Wavefront => "wavefront",
            Method::WavefrontBarrier => "wavefront-barrier",
        }
    }

    pub fn is_parallel(&self) -> bool {
        !matches!(self, Method::Jacobi | Method::GaussSeidel)
    }

    /// Builds a solver for this method.
    pub fn build(
        &self,
        config: SolverConfig,
        problem: Problem,
    ) -> Result<Box<dyn RelaxationSolver>> {
        Ok(match self {
            Method::Jacobi => Box::new(JacobiSolver::new(config, problem)?),
            Method::JacobiParallel => Box::new(JacobiSolver::parallel(config, problem)?),
            Method::GaussSeidel => Box::new(GaussSeidelSolver::new(config, problem)?),
            Method::Wavefront => Box::new(GaussSeidelSolver::wavefront(
                config,
                problem,
                WavefrontKind::PointToPoint,
            )?),
            Method::WavefrontBarrier => Box::new(GaussSeidelSolver::wavefront(
                config,
                problem,
                WavefrontKind::DiagonalBarrier,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(config: SolverConfig) -> Option<String> {
        match config.validate() {
            Ok(()) => None,
            Err(err) => match err.downcast_ref::<SolverError>() {
                Some(SolverError::InvalidConfiguration(reason)) => Some(reason.clone()),
                other => panic!("unexpected error {:?}", other),
            },
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(reason(SolverConfig::new(10, 500, 1e-6)), None);
        assert!(reason(SolverConfig::new(0, 500, 1e-6)).is_some());
        assert!(reason(SolverConfig::new(10, 0, 1e-6)).is_some());
        for tolerance in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
            assert!(reason(SolverConfig::new(10, 500, tolerance)).is_some());
        }
        assert!(reason(SolverConfig::new(10, 500, 1e-6).with_workers(0)).is_some());
        assert_eq!(reason(SolverConfig::new(10, 500, 1e-6).with_workers(3)), None);
    }

    #[test]
    fn test_method_names_are_unique() {
        for (i, a) in Method::ALL.iter().enumerate() {
            for b in &Method::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }
}
