use std::fmt;

/// Failures of a relaxation solve.
///
/// Public functions return [`anyhow::Result`]; when the failure belongs to this
/// taxonomy the error can be recovered with `err.downcast_ref::<SolverError>()`.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    /// A field of `cells` values could not be allocated.
    AllocationFailure { cells: usize },
    /// The iteration cap was reached before the residual fell below the tolerance.
    ///
    /// Never returned by [`RelaxationSolver::solve`](crate::RelaxationSolver::solve)
    /// itself, see [`SolveReport::ensure_converged`](crate::SolveReport::ensure_converged).
    NonConvergence { iterations: usize, residual: f64 },
    /// Parameters rejected before anything was allocated.
    InvalidConfiguration(String),
    /// A worker task panicked in the middle of a sweep; the field is left
    /// partially updated and the solve must be abandoned.
    WorkerPanicked,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::AllocationFailure { cells } => {
                write!(f, "failed to allocate a field of {} cells", cells)
            }
            SolverError::NonConvergence {
                iterations,
                residual,
            } => write!(
                f,
                "no convergence after {} iterations, residual = {:e}",
                iterations, residual
            ),
            SolverError::InvalidConfiguration(reason) => {
                write!(f, "invalid configuration: {}", reason)
            }
            SolverError::WorkerPanicked => write!(f, "a worker panicked during a sweep"),
        }
    }
}

impl std::error::Error for SolverError {}
