#![warn(clippy::all)]

mod config;
mod convergence;
mod error;
mod gauss_seidel;
mod grid;
mod jacobi;
mod kernel;
mod output;
mod pool;
mod problem;
mod traits;
mod wavefront;

pub use config::{Method, SolverConfig};
pub use convergence::{ConvergenceMonitor, Norm, ResidualAccumulator};
pub use error::SolverError;
pub use gauss_seidel::GaussSeidelSolver;
pub use grid::{DoubleBuffer, Grid3};
pub use jacobi::JacobiSolver;
pub use kernel::Stencil;
pub use output::{from_file, read_field, to_file, write_field, FieldFormat};
pub use pool::WorkerPool;
pub use problem::{Problem, RADIATOR_SOURCE, RADIATOR_WALL_TEMPERATURE};
pub use traits::{RelaxationSolver, SolveReport};
pub use wavefront::{TaskGraph, TaskId, WavefrontKind};

pub const VERSION: &str = "0.1.0";

use std::sync::atomic::AtomicU32;
/// Default size of a [`WorkerPool`] when the configuration does not set one.
/// Zero means one thread per core.
pub static WORKER_THREADS: AtomicU32 = AtomicU32::new(0);
