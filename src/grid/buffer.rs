use crate::SolverError;
use anyhow::Result;
use std::ops::{Index, IndexMut};

/// A cubic scalar field with `n` interior cells per axis and a one-cell halo.
///
/// Cells are stored contiguously in row-major `(i, j, k)` order with `k` fastest,
/// `(n + 2)³` of them in total. Indices `0` and `n + 1` on any axis address the
/// halo, which holds the Dirichlet boundary values.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3 {
    n: usize,
    data: Vec<f64>,
}

impl Grid3 {
    /// Allocates a grid with every cell (halo included) set to `value`.
    ///
    /// # Errors
    ///
    /// * [`SolverError::InvalidConfiguration`] if `n` is zero.
    /// * [`SolverError::AllocationFailure`] if the cells cannot be allocated,
    ///   including when their count overflows `usize`.
    pub fn try_new(n: usize, value: f64) -> Result<Self> {
        let cells = Self::cells_for(n)?;
        let mut data = Vec::new();
        data.try_reserve_exact(cells)
            .map_err(|_| SolverError::AllocationFailure { cells })?;
        data.resize(cells, value);
        Ok(Self { n, data })
    }

    pub fn zeros(n: usize) -> Result<Self> {
        Self::try_new(n, 0.0)
    }

    /// Wraps existing cells in row-major order.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly `(n + 2)³` values.
    pub fn from_cells(n: usize, data: Vec<f64>) -> Result<Self> {
        let cells = Self::cells_for(n)?;
        if data.len() != cells {
            return Err(SolverError::InvalidConfiguration(format!(
                "grid with n = {} needs {} cells, got {}",
                n,
                cells,
                data.len()
            ))
            .into());
        }
        Ok(Self { n, data })
    }

    /// Same as [`Clone::clone`], but reports allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())
            .map_err(|_| SolverError::AllocationFailure {
                cells: self.data.len(),
            })?;
        data.extend_from_slice(&self.data);
        Ok(Self { n: self.n, data })
    }

    fn cells_for(n: usize) -> Result<usize> {
        if n == 0 {
            return Err(
                SolverError::InvalidConfiguration("grid size must be positive".into()).into(),
            );
        }
        n.checked_add(2)
            .and_then(|side| side.checked_mul(side)?.checked_mul(side))
            .filter(|&cells| cells.checked_mul(size_of::<f64>()).is_some())
            .ok_or_else(|| SolverError::AllocationFailure { cells: usize::MAX }.into())
    }

    /// Number of interior cells per axis.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of cells per axis, halo included.
    pub fn side(&self) -> usize {
        self.n + 2
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        let s = self.side();
        (i * s + j) * s + k
    }

    fn in_bounds(&self, i: usize, j: usize, k: usize) -> bool {
        let s = self.side();
        i < s && j < s && k < s
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        self.in_bounds(i, j, k).then(|| self.data[self.idx(i, j, k)])
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) -> Result<()> {
        if !self.in_bounds(i, j, k) {
            return Err(SolverError::InvalidConfiguration(format!(
                "cell ({}, {}, {}) is outside of a grid with side {}",
                i,
                j,
                k,
                self.side()
            ))
            .into());
        }
        let idx = self.idx(i, j, k);
        self.data[idx] = value;
        Ok(())
    }

    pub fn is_boundary(&self, i: usize, j: usize, k: usize) -> bool {
        let last = self.n + 1;
        i == 0 || j == 0 || k == 0 || i == last || j == last || k == last
    }

    /// Interior cells in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        let n = self.n;
        (1..=n).flat_map(move |i| (1..=n).flat_map(move |j| (1..=n).map(move |k| (i, j, k))))
    }

    /// Halo cells in row-major order.
    pub fn boundary(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let s = self.side();
        (0..s)
            .flat_map(move |i| (0..s).flat_map(move |j| (0..s).map(move |k| (i, j, k))))
            .filter(|&(i, j, k)| self.is_boundary(i, j, k))
    }

    /// All `(n + 2)³` cells in row-major order.
    pub fn cells(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn fill_boundary(&mut self, value: f64) {
        let s = self.side();
        for i in 0..s {
            for j in 0..s {
                for k in 0..s {
                    if self.is_boundary(i, j, k) {
                        let idx = self.idx(i, j, k);
                        self.data[idx] = value;
                    }
                }
            }
        }
    }

    pub fn fill_interior(&mut self, value: f64) {
        for i in 1..=self.n {
            for j in 1..=self.n {
                let start = self.idx(i, j, 1);
                self.data[start..start + self.n].fill(value);
            }
        }
    }

    /// `max |self - other|` over the interior.
    ///
    /// # Panics
    ///
    /// Panics if the grids have different sizes.
    pub fn max_abs_diff(&self, other: &Grid3) -> f64 {
        assert_eq!(self.n, other.n, "Grids of different sizes");
        self.interior()
            .map(|c| (self[c] - other[c]).abs())
            .fold(0.0, f64::max)
    }

    /// Whether every halo cell of `other` holds the same bits as in `self`.
    pub fn boundary_bits_eq(&self, other: &Grid3) -> bool {
        self.n == other.n
            && self
                .boundary()
                .all(|c| self[c].to_bits() == other[c].to_bits())
    }

    pub fn bytes_total(&self) -> usize {
        self.data.capacity() * size_of::<f64>()
    }
}

impl Index<(usize, usize, usize)> for Grid3 {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &f64 {
        assert!(self.in_bounds(i, j, k), "Cell ({i}, {j}, {k}) out of bounds");
        &self.data[self.idx(i, j, k)]
    }
}

impl IndexMut<(usize, usize, usize)> for Grid3 {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut f64 {
        assert!(self.in_bounds(i, j, k), "Cell ({i}, {j}, {k}) out of bounds");
        let idx = self.idx(i, j, k);
        &mut self.data[idx]
    }
}
