use super::Grid3;
use anyhow::Result;

/// Two arenas of the same shape and a flag telling which one is current.
///
/// A sweep reads the current arena and writes the other one through
/// [`DoubleBuffer::split`]; [`DoubleBuffer::swap`] then flips the roles without
/// moving any data. Both operations need `&mut self`, so the roles cannot change
/// while a sweep still holds the split borrows.
#[derive(Debug)]
pub struct DoubleBuffer {
    arenas: [Grid3; 2],
    current: usize,
}

impl DoubleBuffer {
    /// The scratch arena starts as a copy of `initial`, halo included, so both
    /// arenas always carry the same boundary values.
    pub fn new(initial: Grid3) -> Result<Self> {
        let scratch = initial.try_clone()?;
        Ok(Self {
            arenas: [initial, scratch],
            current: 0,
        })
    }

    pub fn current(&self) -> &Grid3 {
        &self.arenas[self.current]
    }

    pub fn next(&self) -> &Grid3 {
        &self.arenas[1 - self.current]
    }

    /// Borrows the current arena for reading and the next one for writing.
    pub fn split(&mut self) -> (&Grid3, &mut Grid3) {
        let [a, b] = &mut self.arenas;
        if self.current == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    pub fn into_current(self) -> Grid3 {
        let [a, b] = self.arenas;
        if self.current == 0 {
            a
        } else {
            b
        }
    }

    pub fn bytes_total(&self) -> usize {
        self.arenas.iter().map(Grid3::bytes_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_flips_roles_without_copy() {
        let mut initial = Grid3::zeros(2).unwrap();
        initial.fill_boundary(1.0);
        let mut buffer = DoubleBuffer::new(initial).unwrap();
        assert_eq!(buffer.current(), buffer.next());

        let (current, next) = buffer.split();
        next[(1, 1, 1)] = current[(1, 1, 1)] + 5.0;
        let before = buffer.next().cells().as_ptr();

        buffer.swap();
        assert_eq!(buffer.current()[(1, 1, 1)], 5.0);
        assert_eq!(buffer.next()[(1, 1, 1)], 0.0);
        assert_eq!(buffer.current().cells().as_ptr(), before);

        buffer.swap();
        assert_eq!(buffer.current()[(1, 1, 1)], 0.0);
        buffer.swap();
        assert_eq!(buffer.into_current()[(1, 1, 1)], 5.0);
    }

    #[test]
    fn test_both_arenas_share_boundary() {
        let mut initial = Grid3::zeros(3).unwrap();
        initial.fill_boundary(20.0);
        initial.fill_interior(7.0);
        let buffer = DoubleBuffer::new(initial).unwrap();
        assert!(buffer.current().boundary_bits_eq(buffer.next()));
    }
}
