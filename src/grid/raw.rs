use super::Grid3;
use crate::kernel::{Cells, CellsMut};

/// Read-only view of a grid's cells that can be moved into worker tasks.
///
/// The view does not borrow the grid: whoever creates it must keep the grid
/// alive and unmodified until every task holding a copy has been joined.
#[derive(Clone, Copy)]
pub(crate) struct SharedCells {
    ptr: *const f64,
    len: usize,
}

unsafe impl Send for SharedCells {}
unsafe impl Sync for SharedCells {}

impl SharedCells {
    pub(crate) fn new(grid: &Grid3) -> Self {
        let cells = grid.cells();
        Self {
            ptr: cells.as_ptr(),
            len: cells.len(),
        }
    }
}

impl Cells for SharedCells {
    #[inline]
    fn load(&self, idx: usize) -> f64 {
        debug_assert!(idx < self.len);
        unsafe { *self.ptr.add(idx) }
    }
}

/// Mutable view of a grid's cells shared between worker tasks.
///
/// Every cell must be written by at most one task per sweep, and read by another
/// task only after the writer has been joined. The wavefront task graph and the
/// disjoint plane chunks of the Jacobi sweep are what uphold this.
#[derive(Clone, Copy)]
pub(crate) struct SharedCellsMut {
    ptr: *mut f64,
    len: usize,
}

unsafe impl Send for SharedCellsMut {}
unsafe impl Sync for SharedCellsMut {}

impl SharedCellsMut {
    pub(crate) fn new(grid: &mut Grid3) -> Self {
        let cells = grid.cells_mut();
        Self {
            ptr: cells.as_mut_ptr(),
            len: cells.len(),
        }
    }
}

impl Cells for SharedCellsMut {
    #[inline]
    fn load(&self, idx: usize) -> f64 {
        debug_assert!(idx < self.len);
        unsafe { self.ptr.add(idx).read() }
    }
}

impl CellsMut for SharedCellsMut {
    #[inline]
    fn store(&self, idx: usize, value: f64) {
        debug_assert!(idx < self.len);
        unsafe { self.ptr.add(idx).write(value) }
    }
}
