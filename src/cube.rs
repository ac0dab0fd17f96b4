//! The public facade: validate, classify, admit, hook, turn, release.

use std::fmt;

use thiserror::Error;

use crate::core::cancel::{CancelToken, Cancelled};
use crate::core::conflict::{Plane, NUM_SIDES};
use crate::core::metrics::SchedMetrics;
use crate::core::sched::AccessScheduler;
use crate::grid::Grid;

/// Why a cube call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CubeError {
    /// Side, layer or size outside the valid range.
    #[error("side, layer or size out of range")]
    InvalidArgument,
    /// Cooperative cancellation delivered before the body began.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<Cancelled> for CubeError {
    fn from(_: Cancelled) -> Self {
        CubeError::Cancelled
    }
}

type RotateHook = Box<dyn Fn(usize, usize) + Send + Sync>;
type ShowHook = Box<dyn Fn() + Send + Sync>;

/// User callbacks run inside the critical section, around the grid
/// primitive. They may block or sleep; admission is held throughout,
/// and a panic in a hook still releases it.
pub struct Hooks {
    pub before_rotate: RotateHook,
    pub after_rotate: RotateHook,
    pub before_show: ShowHook,
    pub after_show: ShowHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            before_rotate: Box::new(|_, _| {}),
            after_rotate: Box::new(|_, _| {}),
            before_show: Box::new(|| {}),
            after_show: Box::new(|| {}),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hooks { .. }")
    }
}

/// A shared N×N×N cube: concurrent layer turns, whole-state reads.
///
/// All methods take `&self`; share the cube by reference or `Arc` and
/// call it from as many threads as you like.
#[derive(Debug)]
pub struct Cube {
    grid: Grid,
    sched: AccessScheduler,
    hooks: Hooks,
}

impl Cube {
    /// A solved cube with no-op hooks. `size` must be at least 1.
    pub fn new(size: usize) -> Result<Self, CubeError> {
        Self::with_hooks(size, Hooks::default())
    }

    pub fn with_hooks(size: usize, hooks: Hooks) -> Result<Self, CubeError> {
        if size == 0 {
            return Err(CubeError::InvalidArgument);
        }
        Ok(Self {
            grid: Grid::new(size),
            sched: AccessScheduler::new(size),
            hooks,
        })
    }

    pub const fn num_sides(&self) -> usize {
        NUM_SIDES
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn metrics(&self) -> &SchedMetrics {
        self.sched.metrics()
    }

    /// Turn `layer` under `side` clockwise, as seen from outside `side`.
    pub fn rotate(&self, side: usize, layer: usize) -> Result<(), CubeError> {
        self.rotate_inner(side, layer, None)
    }

    /// Like [`rotate`](Self::rotate), but abandons the attempt with
    /// [`CubeError::Cancelled`] if the token fires while the call is
    /// still pending or parked. A cancelled turn has not touched the
    /// grid; once the body runs, it completes.
    pub fn rotate_with(
        &self,
        token: &CancelToken,
        side: usize,
        layer: usize,
    ) -> Result<(), CubeError> {
        self.rotate_inner(side, layer, Some(token))
    }

    /// Render the whole state as `6·N·N` color digits, faces in id
    /// order U, L, F, R, B, D, row-major.
    pub fn show(&self) -> Result<String, CubeError> {
        self.show_inner(None)
    }

    /// Like [`show`](Self::show), with cooperative cancellation.
    pub fn show_with(&self, token: &CancelToken) -> Result<String, CubeError> {
        self.show_inner(Some(token))
    }

    fn rotate_inner(
        &self,
        side: usize,
        layer: usize,
        token: Option<&CancelToken>,
    ) -> Result<(), CubeError> {
        if side >= NUM_SIDES || layer >= self.grid.size() {
            return Err(CubeError::InvalidArgument);
        }
        let plane = Plane::of(self.grid.size(), side, layer);
        let _admission = self.sched.acquire_write(plane, token)?;
        (self.hooks.before_rotate)(side, layer);
        self.grid.apply_rotation(side, layer);
        (self.hooks.after_rotate)(side, layer);
        Ok(())
    }

    fn show_inner(&self, token: Option<&CancelToken>) -> Result<String, CubeError> {
        let _admission = self.sched.acquire_read(token)?;
        (self.hooks.before_show)();
        let state = self.grid.serialize_state();
        (self.hooks.after_show)();
        Ok(state)
    }
}
