use crate::{Grid3, SolverError};
use anyhow::{anyhow, Result};
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Boundary value used by the radiator setup.
pub const RADIATOR_WALL_TEMPERATURE: f64 = 20.0;
/// Source strength used by the radiator setup.
pub const RADIATOR_SOURCE: f64 = 200.0;

/// Inputs of a solve: the right-hand side and the starting solution field whose
/// halo already holds the Dirichlet boundary values.
#[derive(Clone, Debug)]
pub struct Problem {
    source: Grid3,
    initial: Grid3,
}

impl Problem {
    /// # Errors
    ///
    /// Returns an error if the two fields have different sizes.
    pub fn new(source: Grid3, initial: Grid3) -> Result<Self> {
        if source.n() != initial.n() {
            return Err(SolverError::InvalidConfiguration(format!(
                "source field has n = {}, initial field has n = {}",
                source.n(),
                initial.n()
            ))
            .into());
        }
        Ok(Self { source, initial })
    }

    /// Zero source, `boundary` on the halo and `start` everywhere inside.
    pub fn uniform(n: usize, boundary: f64, start: f64) -> Result<Self> {
        let source = Grid3::zeros(n)?;
        let mut initial = Grid3::try_new(n, start)?;
        initial.fill_boundary(boundary);
        Self::new(source, initial)
    }

    /// Like [`Problem::uniform`], with `value` on a `side³` block of source cells
    /// at the centre of the grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is empty or does not fit into the interior.
    pub fn centered_block(
        n: usize,
        boundary: f64,
        start: f64,
        side: usize,
        value: f64,
    ) -> Result<Self> {
        if side == 0 || side > n {
            return Err(SolverError::InvalidConfiguration(format!(
                "source block of side {} does not fit into n = {}",
                side, n
            ))
            .into());
        }
        let mut problem = Self::uniform(n, boundary, start)?;
        let lo = (n - side) / 2 + 1;
        let block = lo..lo + side;
        problem.fill_source(block.clone(), block.clone(), block, value);
        Ok(problem)
    }

    /// A radiator in a room: walls at 20 degrees and a heat source of 200 on the
    /// box `N/2 <= i <= 2N/3`, `N/6 <= j <= N/3`, `N/3 <= k <= 2N/3`.
    pub fn radiator(n: usize, start: f64) -> Result<Self> {
        let mut problem = Self::uniform(n, RADIATOR_WALL_TEMPERATURE, start)?;
        problem.fill_source(
            n / 2..2 * n / 3 + 1,
            n / 6..n / 3 + 1,
            n / 3..2 * n / 3 + 1,
            RADIATOR_SOURCE,
        );
        Ok(problem)
    }

    /// Replaces every interior start value with a uniform sample from `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if `range` is empty or not finite.
    pub fn with_random_interior(mut self, seed: u64, range: Range<f64>) -> Result<Self> {
        if !(range.start.is_finite() && range.end.is_finite() && range.start < range.end) {
            return Err(anyhow!("Invalid range of start values: {:?}", range));
        }
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let cells: Vec<_> = self.initial.interior().collect();
        for c in cells {
            self.initial[c] = rng.random_range(range.clone());
        }
        Ok(self)
    }

    /// Sets the source on the given index box, clipped to the interior.
    fn fill_source(&mut self, i: Range<usize>, j: Range<usize>, k: Range<usize>, value: f64) {
        let n = self.n();
        let clip = |r: Range<usize>| r.start.max(1)..r.end.min(n + 1);
        for i in clip(i) {
            for j in clip(j.clone()) {
                for k in clip(k.clone()) {
                    self.source[(i, j, k)] = value;
                }
            }
        }
    }

    pub fn n(&self) -> usize {
        self.initial.n()
    }

    pub fn source(&self) -> &Grid3 {
        &self.source
    }

    pub fn initial(&self) -> &Grid3 {
        &self.initial
    }

    pub fn into_parts(self) -> (Grid3, Grid3) {
        (self.source, self.initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const SEED: u64 = 42;

    #[test]
    fn test_centered_block() {
        let problem = Problem::centered_block(10, 20.0, 0.0, 2, 200.0).unwrap();
        let source = problem.source();
        let hot: Vec<_> = source.interior().filter(|&c| source[c] != 0.0).collect();
        assert_eq!(hot.len(), 8);
        assert!(hot
            .iter()
            .all(|&(i, j, k)| [i, j, k].iter().all(|x| (5..=6).contains(x))));
        assert!(problem.initial().boundary().all(|c| problem.initial()[c] == 20.0));
        assert!(problem.initial().interior().all(|c| problem.initial()[c] == 0.0));
    }

    #[test]
    fn test_centered_block_must_fit() {
        assert!(Problem::centered_block(4, 0.0, 0.0, 5, 1.0).is_err());
        assert!(Problem::centered_block(4, 0.0, 0.0, 0, 1.0).is_err());
        assert!(Problem::centered_block(4, 0.0, 0.0, 4, 1.0).is_ok());
    }

    #[test]
    fn test_radiator_box() {
        let n = 12;
        let problem = Problem::radiator(n, 0.0).unwrap();
        let source = problem.source();
        for (i, j, k) in source.interior() {
            let inside = (6..=8).contains(&i) && (2..=4).contains(&j) && (4..=8).contains(&k);
            let expected = if inside { RADIATOR_SOURCE } else { 0.0 };
            assert_eq!(source[(i, j, k)], expected, "cell ({i}, {j}, {k})");
        }
        // the source never leaks into the halo, even when N/6 == 0
        let small = Problem::radiator(4, 0.0).unwrap();
        assert!(small.source().boundary().all(|c| small.source()[c] == 0.0));
    }

    #[test]
    fn test_random_interior_is_seeded() {
        let a = Problem::uniform(5, 1.0, 0.0)
            .unwrap()
            .with_random_interior(SEED, -1.0..1.0)
            .unwrap();
        let b = Problem::uniform(5, 1.0, 0.0)
            .unwrap()
            .with_random_interior(SEED, -1.0..1.0)
            .unwrap();
        assert_eq!(a.initial(), b.initial());
        assert!(a.initial().interior().all(|c| (-1.0..1.0).contains(&a.initial()[c])));
        assert!(a.initial().boundary().all(|c| a.initial()[c] == 1.0));
        assert!(Problem::uniform(5, 1.0, 0.0)
            .unwrap()
            .with_random_interior(SEED, 1.0..1.0)
            .is_err());
    }

    #[test]
    fn test_mismatched_fields() {
        let source = Grid3::zeros(3).unwrap();
        let initial = Grid3::zeros(4).unwrap();
        assert!(Problem::new(source, initial).is_err());
    }
}
