use crate::ResidualAccumulator;
use std::cell::Cell;

const SIXTH: f64 = 1.0 / 6.0;

/// Cell storage the stencil can read from.
pub(crate) trait Cells {
    fn load(&self, idx: usize) -> f64;
}

/// Cell storage the stencil can write to through a shared reference.
///
/// Reading and writing the same storage is what turns the Jacobi update into
/// the Gauss-Seidel one.
pub(crate) trait CellsMut: Cells {
    fn store(&self, idx: usize, value: f64);
}

impl Cells for [f64] {
    #[inline]
    fn load(&self, idx: usize) -> f64 {
        self[idx]
    }
}

impl Cells for [Cell<f64>] {
    #[inline]
    fn load(&self, idx: usize) -> f64 {
        self[idx].get()
    }
}

impl CellsMut for [Cell<f64>] {
    #[inline]
    fn store(&self, idx: usize, value: f64) {
        self[idx].set(value)
    }
}

/// The 7-point Laplacian stencil on a grid with `n` interior cells per axis.
///
/// The coefficient and `h²` are fixed at construction and never change for the
/// lifetime of a solve. Every solver goes through [`Stencil::relax_column`], so
/// the per-cell arithmetic (including the order of the additions) is the same
/// for Jacobi, sequential Gauss-Seidel and every wavefront schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stencil {
    n: usize,
    side: usize,
    h2: f64,
}

impl Stencil {
    /// Grid spacing convention: the domain `[-1, 1]` is split into `n` steps, `h = 2/n`.
    pub fn new(n: usize) -> Self {
        let h = 2.0 / n as f64;
        Self {
            n,
            side: n + 2,
            h2: h * h,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn h(&self) -> f64 {
        self.h2.sqrt()
    }

    pub fn h2(&self) -> f64 {
        self.h2
    }

    /// Relaxes every interior cell of the column `(i, j, 1..=n)` in increasing `k`.
    ///
    /// Neighbors are loaded from `read` and results stored to `write`; the
    /// difference between the stored and the previous value of each cell goes
    /// into `acc`. When `read` and `write` are the same storage the loads of
    /// `(i-1, j, k)`, `(i, j-1, k)` and `(i, j, k-1)` observe values written
    /// earlier in the same sweep.
    #[inline]
    pub(crate) fn relax_column<S, R, W>(
        &self,
        i: usize,
        j: usize,
        source: &S,
        read: &R,
        write: &W,
        acc: &mut ResidualAccumulator,
    ) where
        S: Cells + ?Sized,
        R: Cells + ?Sized,
        W: CellsMut + ?Sized,
    {
        debug_assert!((1..=self.n).contains(&i) && (1..=self.n).contains(&j));
        let (row, plane) = (self.side, self.side * self.side);
        let base = (i * self.side + j) * self.side;
        for c in base + 1..=base + self.n {
            let old = read.load(c);
            let new = SIXTH
                * (read.load(c - plane)
                    + read.load(c + plane)
                    + read.load(c - row)
                    + read.load(c + row)
                    + read.load(c - 1)
                    + read.load(c + 1)
                    + self.h2 * source.load(c));
            write.store(c, new);
            acc.push(new - old);
        }
    }
}
