//! Layer-ring geometry. Four directed strips of cells per ring.

/// Strips carried around by one ring rotation.
pub(crate) const RING_STRIPS: usize = 4;

/// One straight run of cells on a single face.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Strip {
    side: usize,
    row: isize,
    col: isize,
    row_step: isize,
    col_step: isize,
}

impl Strip {
    /// Cell `i` along the strip as `(side, row, col)`.
    #[inline(always)]
    pub fn cell(&self, i: usize) -> (usize, usize, usize) {
        let i = i as isize;
        (
            self.side,
            (self.row + i * self.row_step) as usize,
            (self.col + i * self.col_step) as usize,
        )
    }
}

/// The belt of cells a `(side, layer)` turn carries around the cube.
///
/// Strips are listed so that cell `i` of strip `j` lands on cell `i` of
/// strip `j + 1` under a clockwise turn viewed from outside `side`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ring {
    pub strips: [Strip; RING_STRIPS],
    pub len: usize,
}

impl Ring {
    /// Strip geometry per side. Row and column conventions per face are
    /// fixed by the serialized form; each arm below is checked against
    /// the clockwise-from-outside move definition by the grid tests.
    pub fn around(size: usize, side: usize, layer: usize) -> Ring {
        let n = size as isize;
        let l = layer as isize;
        let m = n - 1 - l;
        let strips = match side {
            0 => [
                strip(4, l, n - 1, 0, -1),
                strip(3, l, n - 1, 0, -1),
                strip(2, l, n - 1, 0, -1),
                strip(1, l, n - 1, 0, -1),
            ],
            1 => [
                strip(0, 0, l, 1, 0),
                strip(2, 0, l, 1, 0),
                strip(5, 0, l, 1, 0),
                strip(4, n - 1, m, -1, 0),
            ],
            2 => [
                strip(0, m, 0, 0, 1),
                strip(3, 0, l, 1, 0),
                strip(5, l, n - 1, 0, -1),
                strip(1, n - 1, m, -1, 0),
            ],
            3 => [
                strip(0, n - 1, m, -1, 0),
                strip(4, 0, l, 1, 0),
                strip(5, n - 1, m, -1, 0),
                strip(2, n - 1, m, -1, 0),
            ],
            4 => [
                strip(0, l, n - 1, 0, -1),
                strip(1, 0, l, 1, 0),
                strip(5, m, n - 1, 0, -1),
                strip(3, n - 1, m, -1, 0),
            ],
            _ => [
                strip(2, m, 0, 0, 1),
                strip(3, m, 0, 0, 1),
                strip(4, m, 0, 0, 1),
                strip(1, m, 0, 0, 1),
            ],
        };
        Ring { strips, len: size }
    }
}

#[inline(always)]
fn strip(side: usize, row: isize, col: isize, row_step: isize, col_step: isize) -> Strip {
    Strip {
        side,
        row,
        col,
        row_step,
        col_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_strips_stay_in_bounds() {
        for size in [1usize, 2, 3, 5, 8] {
            for side in 0..6 {
                for layer in 0..size {
                    let ring = Ring::around(size, side, layer);
                    for s in &ring.strips {
                        for i in 0..ring.len {
                            let (face, row, col) = s.cell(i);
                            assert!(face < 6 && row < size && col < size);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_strips_are_disjoint() {
        for size in [2usize, 3, 5] {
            for side in 0..6 {
                for layer in 0..size {
                    let ring = Ring::around(size, side, layer);
                    let mut seen = HashSet::new();
                    for s in &ring.strips {
                        for i in 0..ring.len {
                            assert!(seen.insert(s.cell(i)), "overlapping ring cells");
                        }
                    }
                    assert_eq!(seen.len(), 4 * size);
                }
            }
        }
    }

    #[test]
    fn test_ring_avoids_its_own_side() {
        for side in 0..6 {
            let ring = Ring::around(3, side, 0);
            for s in &ring.strips {
                for i in 0..ring.len {
                    let (face, _, _) = s.cell(i);
                    assert_ne!(face, side);
                }
            }
        }
    }

    #[test]
    fn test_rings_of_distinct_layers_are_disjoint() {
        let size = 4;
        for side in 0..6 {
            let mut seen = HashSet::new();
            for layer in 0..size {
                let ring = Ring::around(size, side, layer);
                for s in &ring.strips {
                    for i in 0..ring.len {
                        assert!(seen.insert(s.cell(i)));
                    }
                }
            }
        }
    }
}
