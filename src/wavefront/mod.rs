//! Dependency-aware scheduling of a Gauss-Seidel sweep.
mod executor;
mod graph;

pub(crate) use executor::WavefrontExecutor;
pub use graph::{TaskGraph, TaskId, WavefrontKind};
