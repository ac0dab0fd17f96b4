//! The guts. Classification, admission, cancellation, counters.

pub mod cancel;
pub mod conflict;
pub mod depths;
pub mod metrics;
pub mod sched;

pub use cancel::{CancelToken, Cancelled};
pub use conflict::{opposite, Axis, Plane, NUM_AXES, NUM_SIDES};
pub use depths::DepthSet;
pub use metrics::{SchedMetrics, WaitHistogram};
pub use sched::{AccessScheduler, ReadGuard, WriteGuard};
