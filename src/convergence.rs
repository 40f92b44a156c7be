use crate::Grid3;

/// Norm used to reduce the per-cell changes of a sweep to a single residual.
///
/// The two norms give different numbers for the same field, so a tolerance is
/// only meaningful together with the norm it was chosen for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Norm {
    /// `max |u_new - u_old|` over the interior.
    MaxAbs,
    /// `sqrt(Σ (u_new - u_old)² / N³)` over the interior.
    #[default]
    Rms,
}

/// Running reduction of per-cell differences.
///
/// Tracks both norms at once; the norm is only picked in [`ResidualAccumulator::finish`].
/// Partial accumulators from concurrent tasks are combined with
/// [`ResidualAccumulator::merge`], always in the same order, so the residual of a
/// parallel sweep does not depend on thread timing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResidualAccumulator {
    sum_sq: f64,
    max_abs: f64,
}

impl ResidualAccumulator {
    #[inline]
    pub fn push(&mut self, diff: f64) {
        self.sum_sq += diff * diff;
        self.max_abs = self.max_abs.max(diff.abs());
    }

    pub fn merge(&mut self, other: &ResidualAccumulator) {
        self.sum_sq += other.sum_sq;
        self.max_abs = self.max_abs.max(other.max_abs);
    }

    /// Reduces the accumulated differences of a grid with `n` interior cells per axis.
    pub fn finish(&self, norm: Norm, n: usize) -> f64 {
        match norm {
            Norm::MaxAbs => self.max_abs,
            Norm::Rms => (self.sum_sq / (n * n * n) as f64).sqrt(),
        }
    }
}

/// Decides when a relaxation has converged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvergenceMonitor {
    norm: Norm,
    tolerance: f64,
}

impl ConvergenceMonitor {
    pub fn new(norm: Norm, tolerance: f64) -> Self {
        Self { norm, tolerance }
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Residual between two snapshots of the interior of the same grid.
    ///
    /// # Panics
    ///
    /// Panics if the grids have different sizes.
    pub fn residual(&self, old: &Grid3, new: &Grid3) -> f64 {
        assert_eq!(old.n(), new.n(), "Snapshots of different grids");
        let mut acc = ResidualAccumulator::default();
        for (i, j, k) in new.interior() {
            acc.push(new[(i, j, k)] - old[(i, j, k)]);
        }
        self.finish(&acc, new.n())
    }

    pub fn finish(&self, acc: &ResidualAccumulator, n: usize) -> f64 {
        acc.finish(self.norm, n)
    }

    pub fn is_converged(&self, residual: f64) -> bool {
        residual < self.tolerance
    }
}
