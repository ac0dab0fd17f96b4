//! # Rotor
//!
//! A concurrent N×N×N twisty-cube engine built around a plane-aware
//! admission scheduler.
//!
//! ## Core Philosophy
//!
//! The cube geometry is mechanical; the interesting problem is admission.
//! Rotations on the same axis at distinct depths commute, so the scheduler
//! admits whole cohorts of them at once, while readers and cross-axis
//! writers are sequenced through explicit, starvation-free hand-off.
//!
//! ## Primary API Surface
//!
//! - [`Cube`] - The facade: `rotate`, `show`, user hooks around both
//! - [`CancelToken`] - Cooperative cancellation for blocked operations
//! - [`AccessScheduler`] - The admission core, usable on its own
//! - [`Plane`] / [`Axis`] - Conflict classification of rotations
//!
//! ## Concurrency Contract
//!
//! - Writers on one axis at distinct depths run concurrently.
//! - Readers run concurrently with each other, never with writers.
//! - A release alternates reader batches with round-robin writer rounds,
//!   so neither side can starve the other.
//! - Cancellation is honored while parked and masked once the body runs.
//!
//! ## Example
//!
//! ```rust
//! use rotor::prelude::*;
//!
//! let cube = Cube::new(3)?;
//! cube.rotate(3, 0)?;
//! let state = cube.show()?;
//! assert_eq!(state.len(), 6 * 3 * 3);
//! # Ok::<(), rotor::CubeError>(())
//! ```

#![forbid(unsafe_code)]

pub mod core;
pub mod cube;
pub mod grid;

/// Prelude for convenient imports of primary API types.
pub mod prelude {
    pub use crate::core::{Axis, CancelToken, Cancelled, Plane};
    pub use crate::cube::{Cube, CubeError, Hooks};
    pub use crate::grid::Grid;
}

// Re-export primary types at crate root for convenience.
pub use crate::core::{
    opposite, AccessScheduler, Axis, CancelToken, Cancelled, DepthSet, Plane, ReadGuard,
    SchedMetrics, WriteGuard, NUM_AXES, NUM_SIDES,
};
pub use crate::cube::{Cube, CubeError, Hooks};
pub use crate::grid::Grid;
