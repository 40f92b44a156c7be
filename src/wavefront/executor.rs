use super::{TaskGraph, TaskId};
use crate::{
    grid::{SharedCells, SharedCellsMut},
    pool::drain,
    Grid3, ResidualAccumulator, SolverError, Stencil, WorkerPool,
};
use anyhow::{anyhow, Result};
use tokio::task::JoinSet;

/// Runs one in-place Gauss-Seidel sweep over a [`TaskGraph`] on a [`WorkerPool`].
///
/// The calling thread is the dispatcher: it owns the pending-predecessor
/// counters, spawns a column task as soon as its counter drops to zero and
/// decrements the counters of a task's dependents once that task has been
/// joined. Joining a task happens-before spawning its dependents, which is what
/// makes the writes of a column visible to the columns that read them.
pub(crate) struct WavefrontExecutor<'a> {
    graph: &'a TaskGraph,
    stencil: Stencil,
}

impl<'a> WavefrontExecutor<'a> {
    pub(crate) fn new(graph: &'a TaskGraph, stencil: Stencil) -> Self {
        debug_assert_eq!(graph.n(), stencil.n());
        Self { graph, stencil }
    }

    /// Relaxes every interior cell of `field` once.
    ///
    /// Returns the residual partials of every task, indexed by [`TaskId`].
    pub(crate) fn run(
        &self,
        pool: &WorkerPool,
        source: &Grid3,
        field: &mut Grid3,
    ) -> Result<Vec<ResidualAccumulator>> {
        let graph = self.graph;
        let stencil = self.stencil;
        let source = SharedCells::new(source);
        let cells = SharedCellsMut::new(field);

        let spawn = |set: &mut JoinSet<(TaskId, ResidualAccumulator)>, task: TaskId| {
            let (i, j) = graph.column(task);
            #[cfg(test)]
            let faults = pool.faults();
            #[cfg(test)]
            faults.spawn();
            set.spawn(async move {
                #[cfg(test)]
                faults.run(task.index());
                let mut acc = ResidualAccumulator::default();
                stencil.relax_column(i, j, &source, &cells, &cells, &mut acc);
                #[cfg(test)]
                faults.finish();
                (task, acc)
            });
        };

        pool.block_on(async {
            let mut pending: Vec<_> = graph
                .tasks()
                .map(|t| graph.predecessors(t).len())
                .collect();
            let mut partials = vec![ResidualAccumulator::default(); graph.len()];
            let mut finished = 0;

            let mut set = JoinSet::new();
            for root in graph.roots() {
                spawn(&mut set, root);
            }
            while let Some(joined) = set.join_next().await {
                let Ok((task, acc)) = joined else {
                    drain(&mut set).await;
                    return Err(anyhow::Error::from(SolverError::WorkerPanicked));
                };
                partials[task.index()] = acc;
                finished += 1;
                for &dep in graph.dependents(task) {
                    pending[dep.index()] -= 1;
                    if pending[dep.index()] == 0 {
                        spawn(&mut set, dep);
                    }
                }
            }

            if finished != graph.len() {
                return Err(anyhow!(
                    "Task graph is not acyclic: {} of {} columns were never scheduled",
                    graph.len() - finished,
                    graph.len()
                ));
            }
            Ok(partials)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pool::TaskFaults, Problem, WavefrontKind};
    use std::cell::Cell;

    fn sequential_sweep(stencil: Stencil, source: &Grid3, field: &mut Grid3) {
        let cells = Cell::from_mut(field.cells_mut()).as_slice_of_cells();
        let mut acc = ResidualAccumulator::default();
        for i in 1..=stencil.n() {
            for j in 1..=stencil.n() {
                stencil.relax_column(i, j, source.cells(), cells, cells, &mut acc);
            }
        }
    }

    #[test]
    fn test_sweep_is_bit_identical_to_sequential() {
        let pool = WorkerPool::new(Some(4)).unwrap();
        for kind in [WavefrontKind::PointToPoint, WavefrontKind::DiagonalBarrier] {
            for n in [1, 2, 5, 12] {
                let problem = Problem::radiator(n, 0.0)
                    .unwrap()
                    .with_random_interior(n as u64, 0.0..40.0)
                    .unwrap();
                let stencil = Stencil::new(n);
                let graph = TaskGraph::new(n, kind);
                let (source, mut expected) = problem.into_parts();
                let mut actual = expected.clone();

                for _ in 0..3 {
                    sequential_sweep(stencil, &source, &mut expected);
                    let partials = WavefrontExecutor::new(&graph, stencil)
                        .run(&pool, &source, &mut actual)
                        .unwrap();
                    assert_eq!(partials.len(), n * n);
                }
                assert_eq!(actual, expected, "kind = {:?}, n = {}", kind, n);
            }
        }
    }

    #[test]
    fn test_cyclic_graph_reports_error() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let n = 3;
        let mut graph = TaskGraph::point_to_point(n);
        // make the root wait for a task that depends on it
        let (root, last) = (graph.id(1, 1), graph.id(n, n));
        graph.add_edge(last, root);

        let problem = Problem::uniform(n, 1.0, 0.0).unwrap();
        let (source, mut field) = problem.into_parts();
        let err = WavefrontExecutor::new(&graph, Stencil::new(n))
            .run(&pool, &source, &mut field)
            .unwrap_err();
        assert!(err.to_string().contains("not acyclic"));
    }

    #[test]
    fn test_panicking_column_drains_the_sweep() {
        let n = 6;
        let mut pool = WorkerPool::new(Some(4)).unwrap();
        let stencil = Stencil::new(n);
        for kind in [WavefrontKind::PointToPoint, WavefrontKind::DiagonalBarrier] {
            let graph = TaskGraph::new(n, kind);
            let failing = graph.id(3, 2);
            let faults = TaskFaults::panic_on(failing.index());
            pool.set_faults(faults.clone());

            let (source, initial) = Problem::radiator(n, 0.0).unwrap().into_parts();
            let mut field = initial.clone();
            let err = WavefrontExecutor::new(&graph, stencil)
                .run(&pool, &source, &mut field)
                .unwrap_err();
            assert_eq!(
                err.downcast_ref::<SolverError>(),
                Some(&SolverError::WorkerPanicked)
            );
            // the dependents of the failed column are never started
            assert!(faults.spawned() < graph.len());
            assert_eq!(faults.finished(), faults.spawned() - 1);

            pool.set_faults(Default::default());
            let mut expected = initial.clone();
            sequential_sweep(stencil, &source, &mut expected);
            let mut actual = initial;
            WavefrontExecutor::new(&graph, stencil)
                .run(&pool, &source, &mut actual)
                .unwrap();
            assert_eq!(actual, expected, "{:?}", kind);
        }
    }
}
