//! Side/layer to rotation-plane classification. Static tables, no state.
//!
//! Faces are numbered U(0), L(1), F(2), R(3), B(4), D(5). A rotation is
//! named by the face it is viewed from and the layer depth under that
//! face; two rotations touch the same cells only if they resolve to the
//! same plane.

/// Number of faces on the cube.
pub const NUM_SIDES: usize = 6;

/// Number of rotation-plane classes.
pub const NUM_AXES: usize = 3;

/// One of the three classes of parallel rotation planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Axis {
    /// Planes parallel to the up/down faces.
    Ud = 0,
    /// Planes parallel to the left/right faces.
    Lr = 1,
    /// Planes parallel to the front/back faces.
    Fb = 2,
}

impl Axis {
    pub const ALL: [Axis; NUM_AXES] = [Axis::Ud, Axis::Lr, Axis::Fb];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A rotation plane: which axis, and how deep along it.
///
/// Writes conflict iff their planes are equal; a whole-state read
/// conflicts with every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plane {
    pub axis: Axis,
    pub depth: usize,
}

impl Plane {
    /// Classify a `(side, layer)` rotation on a cube of the given size.
    ///
    /// Sides 0, 1 and 2 index depth from their own face; their opposites
    /// mirror it, so that e.g. `(0, k)` and `(5, size-1-k)` name the same
    /// plane. Callers validate ranges; the mapping itself is total.
    #[inline]
    pub const fn of(size: usize, side: usize, layer: usize) -> Self {
        let mirror = size - 1 - layer;
        match side {
            0 => Plane { axis: Axis::Ud, depth: layer },
            1 => Plane { axis: Axis::Lr, depth: layer },
            2 => Plane { axis: Axis::Fb, depth: layer },
            3 => Plane { axis: Axis::Lr, depth: mirror },
            4 => Plane { axis: Axis::Fb, depth: mirror },
            _ => Plane { axis: Axis::Ud, depth: mirror },
        }
    }
}

const OPPOSITE: [u8; NUM_SIDES] = [5, 3, 4, 1, 2, 0];

const _: () = {
    let mut side = 0;
    while side < NUM_SIDES {
        assert!(OPPOSITE[OPPOSITE[side] as usize] as usize == side);
        side += 1;
    }
};

/// The face on the far side: 0↔5, 1↔3, 2↔4.
#[inline(always)]
pub const fn opposite(side: usize) -> usize {
    OPPOSITE[side] as usize
}
