//! Plane-aware admission. One mutex, one gate per plane, explicit wake-up.
//!
//! The scheduler admits whole-state readers and per-plane writers into a
//! shared critical section under three rules:
//!
//! - readers share the section with readers only;
//! - writers share it with writers on the same axis at distinct depths;
//! - everyone else parks on a gate and is woken explicitly.
//!
//! Admission of parked operations is decided by whichever thread runs the
//! release rule, never by the woken thread itself. The releasing thread
//! performs the entry bookkeeping of everyone it admits and deposits one
//! grant per admission on the corresponding gate before notifying it, so
//! the scheduler state already reflects the incoming cohort when the
//! mutex is released. A freshly arriving operation therefore cannot slip
//! past a grant holder, which is what a hand-off of the mutex itself
//! would otherwise have to prevent.
//!
//! Release order: all waiting readers as one batch, otherwise one writer
//! round on the next non-empty axis in round-robin order, taking one
//! waiter per free depth in ascending depth order. A writer arriving on
//! the active axis with a free depth still parks and joins the next
//! round; letting it slip in ahead of the cursor would let one busy axis
//! starve the other two.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::trace;

use super::cancel::{CancelToken, Cancelled, Wake, WatchGuard};
use super::conflict::{Axis, Plane, NUM_AXES};
use super::depths::DepthSet;
use super::metrics::SchedMetrics;

/// Scheduler bookkeeping. Only ever touched with the mutex held.
#[derive(Debug)]
struct SchedState {
    active_readers: u32,
    active_writers: u32,
    writing_axis: Option<Axis>,
    busy_depths: DepthSet,
    waiting_readers: u32,
    waiting_writers_by_axis: [u32; NUM_AXES],
    /// Waiting-writer count per gate, indexed `axis * depths + depth`.
    waiting_writers: Box<[u32]>,
    /// Admissions granted at a release point, not yet consumed.
    reader_grants: u32,
    writer_grants: Box<[u32]>,
    /// Round-robin cursor; the next writer round starts on the axis after
    /// this one, so the very first round starts on axis 0.
    last_axis: usize,
}

impl SchedState {
    fn new(depths: usize) -> Self {
        let gates = NUM_AXES * depths;
        Self {
            active_readers: 0,
            active_writers: 0,
            writing_axis: None,
            busy_depths: DepthSet::new(depths),
            waiting_readers: 0,
            waiting_writers_by_axis: [0; NUM_AXES],
            waiting_writers: vec![0u32; gates].into_boxed_slice(),
            reader_grants: 0,
            writer_grants: vec![0u32; gates].into_boxed_slice(),
            last_axis: NUM_AXES - 1,
        }
    }

    #[inline]
    fn writers_pending(&self) -> bool {
        self.active_writers > 0 || self.waiting_writers_by_axis.iter().any(|&w| w > 0)
    }

    #[inline]
    fn no_waiting_writers(&self) -> bool {
        self.waiting_writers_by_axis.iter().all(|&w| w == 0)
    }
}

struct Shared {
    depths: usize,
    state: Mutex<SchedState>,
    reader_gate: Condvar,
    writer_gates: Box<[Condvar]>,
    metrics: SchedMetrics,
}

#[derive(Clone, Copy)]
enum GateId {
    Readers,
    Writer(usize),
}

/// Rouses one gate of one scheduler when a token is cancelled.
struct GateWaker {
    shared: Arc<Shared>,
    gate: GateId,
}

impl Wake for GateWaker {
    fn wake(&self) {
        // Taking the state mutex first closes the window where a waiter
        // has decided to park but has not yet entered the wait: either it
        // still holds the mutex and will re-check the flag, or it is
        // already parked and the notification reaches it.
        let _state = lock(&self.shared.state);
        match self.gate {
            GateId::Readers => self.shared.reader_gate.notify_all(),
            GateId::Writer(gate) => self.shared.writer_gates[gate].notify_all(),
        }
    }
}

/// The admission core. One per cube, shareable across any thread count.
pub struct AccessScheduler {
    shared: Arc<Shared>,
}

impl AccessScheduler {
    /// Build a scheduler for `depths` layers per axis.
    pub fn new(depths: usize) -> Self {
        assert!(depths >= 1, "a cube has at least one layer per axis");
        let gates = NUM_AXES * depths;
        let writer_gates: Vec<Condvar> = (0..gates).map(|_| Condvar::new()).collect();
        Self {
            shared: Arc::new(Shared {
                depths,
                state: Mutex::new(SchedState::new(depths)),
                reader_gate: Condvar::new(),
                writer_gates: writer_gates.into_boxed_slice(),
                metrics: SchedMetrics::new(),
            }),
        }
    }

    pub fn depths(&self) -> usize {
        self.shared.depths
    }

    pub fn metrics(&self) -> &SchedMetrics {
        &self.shared.metrics
    }

    /// Admit a writer on `plane`, parking until compatible.
    ///
    /// With a token, cancellation is honored before the mutex is taken
    /// and at every resumption from the gate; once this returns a guard
    /// the operation is committed and runs to completion.
    pub fn acquire_write(
        &self,
        plane: Plane,
        token: Option<&CancelToken>,
    ) -> Result<WriteGuard<'_>, Cancelled> {
        debug_assert!(plane.depth < self.shared.depths);
        if let Some(token) = token {
            token.checkpoint()?;
        }

        let shared = &self.shared;
        let gate = shared.gate(plane.axis, plane.depth);
        let mut state = lock(&shared.state);

        if state.active_readers == 0 && state.active_writers == 0 {
            state.writing_axis = Some(plane.axis);
            state.busy_depths.insert(plane.depth);
            state.active_writers += 1;
            shared.metrics.direct_admissions.incr();
            trace!(axis = plane.axis.index(), depth = plane.depth, "write admitted");
            return Ok(WriteGuard { sched: self, plane });
        }

        // Even a write compatible with the active cohort parks here; it
        // is admitted by a release round, never by barging in.
        state.waiting_writers_by_axis[plane.axis.index()] += 1;
        state.waiting_writers[gate] += 1;
        let _watch = self.watch(token, GateId::Writer(gate));
        trace!(axis = plane.axis.index(), depth = plane.depth, "write parked");

        let parked_at = Instant::now();
        let granted = loop {
            if state.writer_grants[gate] > 0 {
                state.writer_grants[gate] -= 1;
                break true;
            }
            if token.is_some_and(|t| t.is_cancelled()) {
                break false;
            }
            state = wait(&shared.writer_gates[gate], state);
        };
        shared
            .metrics
            .gate_wait
            .record(parked_at.elapsed().as_nanos() as u64);

        if granted {
            // The release round already moved this writer's books to
            // active. A cancellation observed now leaves through the
            // ordinary exit so the hand-off still happens.
            if token.is_some_and(|t| t.is_cancelled()) {
                shared.exit_write(&mut state, plane);
                shared.metrics.cancellations.incr();
                return Err(Cancelled);
            }
            shared.metrics.parked_admissions.incr();
            return Ok(WriteGuard { sched: self, plane });
        }

        // Cancelled while still parked: undo the waiting marks and pass
        // on whatever this departure unblocks.
        state.waiting_writers_by_axis[plane.axis.index()] -= 1;
        state.waiting_writers[gate] -= 1;
        shared.waiter_withdrew(&mut state);
        shared.metrics.cancellations.incr();
        trace!(axis = plane.axis.index(), depth = plane.depth, "write cancelled");
        Err(Cancelled)
    }

    /// Admit a whole-state reader. Readers yield to pending writers on
    /// entry and are released in one batch when the last writer leaves.
    pub fn acquire_read(
        &self,
        token: Option<&CancelToken>,
    ) -> Result<ReadGuard<'_>, Cancelled> {
        if let Some(token) = token {
            token.checkpoint()?;
        }

        let shared = &self.shared;
        let mut state = lock(&shared.state);

        if !state.writers_pending() {
            state.active_readers += 1;
            shared.metrics.direct_admissions.incr();
            trace!(readers = state.active_readers, "read admitted");
            return Ok(ReadGuard { sched: self });
        }

        state.waiting_readers += 1;
        let _watch = self.watch(token, GateId::Readers);
        trace!("read parked");

        let parked_at = Instant::now();
        let granted = loop {
            if state.reader_grants > 0 {
                state.reader_grants -= 1;
                break true;
            }
            if token.is_some_and(|t| t.is_cancelled()) {
                break false;
            }
            state = wait(&shared.reader_gate, state);
        };
        shared
            .metrics
            .gate_wait
            .record(parked_at.elapsed().as_nanos() as u64);

        if granted {
            if token.is_some_and(|t| t.is_cancelled()) {
                shared.exit_read(&mut state);
                shared.metrics.cancellations.incr();
                return Err(Cancelled);
            }
            shared.metrics.parked_admissions.incr();
            return Ok(ReadGuard { sched: self });
        }

        // A parked reader holds nothing back, so withdrawing is just
        // dropping the waiting mark.
        state.waiting_readers -= 1;
        shared.metrics.cancellations.incr();
        trace!("read cancelled");
        Err(Cancelled)
    }

    fn watch(&self, token: Option<&CancelToken>, gate: GateId) -> Option<WatchGuard> {
        token.map(|t| {
            t.watch(Arc::new(GateWaker {
                shared: Arc::clone(&self.shared),
                gate,
            }))
        })
    }
}

impl std::fmt::Debug for AccessScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessScheduler")
            .field("depths", &self.shared.depths)
            .finish()
    }
}

impl Shared {
    #[inline]
    fn gate(&self, axis: Axis, depth: usize) -> usize {
        axis.index() * self.depths + depth
    }

    /// Exit protocol for a writer. When the cohort drains, the release
    /// rule picks the next group.
    fn exit_write(&self, state: &mut SchedState, plane: Plane) {
        state.active_writers -= 1;
        state.busy_depths.remove(plane.depth);
        debug_assert_eq!(state.busy_depths.len(), state.active_writers);
        if state.active_writers == 0 {
            debug_assert!(state.busy_depths.is_empty());
            state.writing_axis = None;
            self.release_next(state);
        }
    }

    /// Exit protocol for a reader. The last reader out releases writers;
    /// readers queued behind pending writers stay queued.
    fn exit_read(&self, state: &mut SchedState) {
        state.active_readers -= 1;
        if state.active_readers == 0 {
            self.admit_writer_round(state);
        }
    }

    /// Release rule at a full drain: waiting readers first, as one batch,
    /// otherwise one round-robin writer round.
    fn release_next(&self, state: &mut SchedState) {
        if state.waiting_readers > 0 {
            self.admit_reader_batch(state);
        } else {
            self.admit_writer_round(state);
        }
    }

    /// Everyone waiting to read enters together.
    fn admit_reader_batch(&self, state: &mut SchedState) {
        debug_assert_eq!(state.active_writers, 0);
        let batch = state.waiting_readers;
        state.waiting_readers = 0;
        state.active_readers += batch;
        state.reader_grants += batch;
        self.metrics.reader_batches.incr();
        trace!(batch, "reader batch released");
        self.reader_gate.notify_all();
    }

    /// Advance the cursor to the next axis with waiters and admit one
    /// writer per free depth there, lowest depth first.
    fn admit_writer_round(&self, state: &mut SchedState) {
        for step in 1..=NUM_AXES {
            let axis = Axis::ALL[(state.last_axis + step) % NUM_AXES];
            if state.waiting_writers_by_axis[axis.index()] == 0 {
                continue;
            }
            state.last_axis = axis.index();
            state.writing_axis = Some(axis);
            let mut admitted = 0u32;
            for depth in 0..self.depths {
                let gate = self.gate(axis, depth);
                if state.waiting_writers[gate] == 0 || state.busy_depths.contains(depth) {
                    continue;
                }
                state.waiting_writers[gate] -= 1;
                state.waiting_writers_by_axis[axis.index()] -= 1;
                state.busy_depths.insert(depth);
                state.active_writers += 1;
                state.writer_grants[gate] += 1;
                self.writer_gates[gate].notify_all();
                admitted += 1;
            }
            debug_assert!(admitted > 0);
            self.metrics.admission_rounds.incr();
            trace!(axis = axis.index(), admitted, "writer round released");
            return;
        }
    }

    /// A parked writer withdrew before being granted. If it was the last
    /// pending writer, the readers it alone was holding back may enter.
    fn waiter_withdrew(&self, state: &mut SchedState) {
        if state.active_writers == 0 && state.waiting_readers > 0 && state.no_waiting_writers() {
            self.admit_reader_batch(state);
        }
    }
}

/// Write admission. Dropping it runs the exit protocol, panics included.
#[must_use]
#[derive(Debug)]
pub struct WriteGuard<'a> {
    sched: &'a AccessScheduler,
    plane: Plane,
}

impl WriteGuard<'_> {
    pub fn plane(&self) -> Plane {
        self.plane
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        let shared = &self.sched.shared;
        let mut state = lock(&shared.state);
        shared.exit_write(&mut state, self.plane);
    }
}

/// Read admission. Dropping it runs the exit protocol, panics included.
#[must_use]
#[derive(Debug)]
pub struct ReadGuard<'a> {
    sched: &'a AccessScheduler,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        let shared = &self.sched.shared;
        let mut state = lock(&shared.state);
        shared.exit_read(&mut state);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn wait<'a>(gate: &Condvar, guard: MutexGuard<'a, SchedState>) -> MutexGuard<'a, SchedState> {
    gate.wait(guard).unwrap_or_else(PoisonError::into_inner)
}
