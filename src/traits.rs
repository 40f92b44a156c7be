use crate::{ConvergenceMonitor, Grid3, Norm, SolverConfig, SolverError};
use anyhow::Result;

/// Outcome of [`RelaxationSolver::solve`].
#[derive(Clone, Debug, PartialEq)]
pub struct SolveReport {
    /// Number of sweeps performed.
    pub iterations: usize,
    /// Residual of the last sweep.
    pub residual: f64,
    /// Whether the residual fell below the tolerance before the iteration cap.
    pub converged: bool,
    /// The norm `residual` is measured in.
    pub norm: Norm,
    /// Residual of every sweep, in order.
    pub residuals: Vec<f64>,
}

impl SolveReport {
    /// Turns running out of iterations into an error, for callers that treat it as one.
    ///
    /// # Errors
    ///
    /// [`SolverError::NonConvergence`] if the solve hit the iteration cap.
    pub fn ensure_converged(&self) -> Result<()> {
        if self.converged {
            Ok(())
        } else {
            Err(SolverError::NonConvergence {
                iterations: self.iterations,
                residual: self.residual,
            }
            .into())
        }
    }
}

/// Iterative relaxation of the discretized Poisson equation
pub trait RelaxationSolver {
    /// Performs one sweep over every interior cell.
    ///
    /// # Returns
    ///
    /// The residual between the field before and after the sweep, measured in
    /// the norm of the solver's [`ConvergenceMonitor`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::WorkerPanicked`] if a parallel sweep lost a
    /// worker. The field is then partially updated and the solve must be
    /// abandoned.
    fn sweep(&mut self) -> Result<f64>;

    /// Parameters the solver was built with.
    fn config(&self) -> &SolverConfig;

    /// Convergence criterion, fixed for the lifetime of the solver.
    fn monitor(&self) -> &ConvergenceMonitor;

    /// The current solution field, halo included.
    fn solution(&self) -> &Grid3;

    /// Sweeps until the residual is below the tolerance or the iteration cap is reached.
    ///
    /// Running out of iterations is not an error: the report tells whether the
    /// solve converged and the solution keeps the best-effort field.
    fn solve(&mut self) -> Result<SolveReport> {
        let (iter_max, monitor) = (self.config().iter_max, *self.monitor());
        let mut residuals = Vec::with_capacity(iter_max.min(1 << 12));
        let mut residual = f64::INFINITY;
        while residuals.len() < iter_max {
            residual = self.sweep()?;
            residuals.push(residual);
            if monitor.is_converged(residual) {
                break;
            }
        }
        Ok(SolveReport {
            iterations: residuals.len(),
            residual,
            converged: monitor.is_converged(residual),
            norm: monitor.norm(),
            residuals,
        })
    }

    /// Returns the approximate heap memory usage of the solver in bytes.
    fn bytes_total(&self) -> usize;
}
