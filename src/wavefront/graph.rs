use ahash::AHashSet;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Index of a task, i.e. of an interior column `(i, j)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u32);

impl TaskId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

type TaskList = SmallVec<[TaskId; 2]>;

/// How the predecessors of a column are declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavefrontKind {
    /// Column `(i, j)` waits for `(i-1, j)` and `(i, j-1)` only.
    PointToPoint,
    /// Column `(i, j)` waits for the whole diagonal `i + j - 1`,
    /// which is a barrier between consecutive diagonals.
    DiagonalBarrier,
}

/// Dependency graph of one Gauss-Seidel sweep.
///
/// There is one task per interior column `(i, j)`, `1 <= i, j <= n`; a task
/// relaxes its whole column in increasing `k`. In the sequential sweep the
/// column reads `(i-1, j, k)` and `(i, j-1, k)` after they were updated and
/// `(i+1, j, k)`, `(i, j+1, k)` before, so the task must start after its
/// predecessors `(i-1, j)`, `(i, j-1)` have finished, and it precedes the
/// columns that read it. Columns on the same diagonal `d = i + j` never touch
/// each other and can run concurrently.
#[derive(Clone, Debug)]
pub struct TaskGraph {
    n: usize,
    kind: WavefrontKind,
    predecessors: Vec<TaskList>,
    dependents: Vec<TaskList>,
}

impl TaskGraph {
    pub fn new(n: usize, kind: WavefrontKind) -> Self {
        match kind {
            WavefrontKind::PointToPoint => Self::point_to_point(n),
            WavefrontKind::DiagonalBarrier => Self::diagonal_barrier(n),
        }
    }

    pub fn point_to_point(n: usize) -> Self {
        Self::build(n, WavefrontKind::PointToPoint, |graph, i, j| {
            let mut list = TaskList::new();
            if i > 1 {
                list.push(graph.id(i - 1, j));
            }
            if j > 1 {
                list.push(graph.id(i, j - 1));
            }
            list
        })
    }

    pub fn diagonal_barrier(n: usize) -> Self {
        Self::build(n, WavefrontKind::DiagonalBarrier, |graph, i, j| {
            let d = i + j;
            if d == 2 {
                return TaskList::new();
            }
            graph
                .diagonal_columns(d - 1)
                .map(|(pi, pj)| graph.id(pi, pj))
                .collect()
        })
    }

    fn build(
        n: usize,
        kind: WavefrontKind,
        predecessors_of: impl Fn(&Self, usize, usize) -> TaskList,
    ) -> Self {
        let mut graph = Self {
            n,
            kind,
            predecessors: vec![],
            dependents: vec![TaskList::new(); n * n],
        };
        let predecessors: Vec<_> = (1..=n)
            .flat_map(|i| (1..=n).map(move |j| (i, j)))
            .map(|(i, j)| predecessors_of(&graph, i, j))
            .collect();
        for (task, preds) in predecessors.iter().enumerate() {
            for p in preds {
                graph.dependents[p.index()].push(TaskId(task as u32));
            }
        }
        graph.predecessors = predecessors;
        graph
    }

    /// Interior cells per axis.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn kind(&self) -> WavefrontKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.n * self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn tasks(&self) -> impl Iterator<Item = TaskId> {
        (0..self.len() as u32).map(TaskId)
    }

    #[inline]
    pub fn id(&self, i: usize, j: usize) -> TaskId {
        debug_assert!((1..=self.n).contains(&i) && (1..=self.n).contains(&j));
        TaskId(((i - 1) * self.n + (j - 1)) as u32)
    }

    /// The column `(i, j)` a task relaxes.
    #[inline]
    pub fn column(&self, task: TaskId) -> (usize, usize) {
        (task.index() / self.n + 1, task.index() % self.n + 1)
    }

    /// Diagonal `d = i + j` of a task, in `2..=2n`.
    pub fn diagonal(&self, task: TaskId) -> usize {
        let (i, j) = self.column(task);
        i + j
    }

    /// Columns `(i, j)` with `i + j = d`, in increasing `i`.
    pub fn diagonal_columns(&self, d: usize) -> impl Iterator<Item = (usize, usize)> {
        let n = self.n;
        let lo = d.saturating_sub(n).max(1);
        let hi = d.saturating_sub(1).min(n);
        (lo..=hi).map(move |i| (i, d - i))
    }

    pub fn predecessors(&self, task: TaskId) -> &[TaskId] {
        &self.predecessors[task.index()]
    }

    pub fn dependents(&self, task: TaskId) -> &[TaskId] {
        &self.dependents[task.index()]
    }

    /// Tasks without predecessors.
    pub fn roots(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks().filter(|&t| self.predecessors(t).is_empty())
    }

    pub fn edges(&self) -> usize {
        self.predecessors.iter().map(|p| p.len()).sum()
    }

    #[cfg(test)]
    pub(crate) fn add_edge(&mut self, from: TaskId, to: TaskId) {
        self.predecessors[to.index()].push(from);
        self.dependents[from.index()].push(to);
    }

    /// One valid execution order (Kahn's algorithm), or `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<TaskId>> {
        let mut pending: Vec<_> = self.predecessors.iter().map(|p| p.len()).collect();
        let mut queue: VecDeque<_> = self.roots().collect();
        let mut order = Vec::with_capacity(self.len());
        while let Some(task) = queue.pop_front() {
            order.push(task);
            for &dep in self.dependents(task) {
                pending[dep.index()] -= 1;
                if pending[dep.index()] == 0 {
                    queue.push_back(dep);
                }
            }
        }
        (order.len() == self.len()).then_some(order)
    }

    /// Whether `order` runs every task exactly once and never before one of its predecessors.
    pub fn respects(&self, order: &[TaskId]) -> bool {
        if order.len() != self.len() {
            return false;
        }
        let mut done = AHashSet::with_capacity(order.len());
        for &task in order {
            if task.index() >= self.len()
                || !self.predecessors(task).iter().all(|p| done.contains(p))
                || !done.insert(task)
            {
                return false;
            }
        }
        true
    }
}
