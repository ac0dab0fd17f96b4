//! Lightweight scheduler metrics. No allocations, no locks, just atomics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic event counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline(always)]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// 64-bucket gate-wait histogram. Power-of-two scale: bucket[i] counts
/// waits below 2^(i+3) ns. Cache-line aligned to avoid false sharing.
#[repr(C, align(64))]
pub struct WaitHistogram {
    buckets: [AtomicU64; 64],
}

impl WaitHistogram {
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const ZERO: AtomicU64 = AtomicU64::new(0);
        Self {
            buckets: [ZERO; 64],
        }
    }

    /// Record one wait. Branchless bucket selection.
    #[inline(always)]
    pub fn record(&self, wait_ns: u64) {
        let bucket = Self::bucket_for(wait_ns);
        self.buckets[bucket].fetch_add(1, Ordering::Relaxed);
    }

    /// Bucket index for a given wait. Power-of-two scale starting at 8ns.
    #[inline(always)]
    pub const fn bucket_for(wait_ns: u64) -> usize {
        if wait_ns < 8 {
            0
        } else {
            let bits = 64 - wait_ns.leading_zeros() as usize;
            let idx = bits - 3;
            if idx > 63 {
                63
            } else {
                idx
            }
        }
    }

    /// Upper bound (exclusive) for bucket i in nanoseconds.
    #[inline(always)]
    pub const fn bucket_le(bucket: usize) -> u64 {
        if bucket >= 61 {
            u64::MAX
        } else {
            1u64 << (bucket + 3)
        }
    }

    /// Total samples across all buckets.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).sum()
    }

    /// Compute percentile (0-100). Returns the bucket upper bound.
    pub fn percentile(&self, pct: u8) -> u64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let target = (total as u128 * pct as u128 / 100) as u64;
        let mut cumulative = 0u64;
        for (i, bucket) in self.buckets.iter().enumerate() {
            cumulative += bucket.load(Ordering::Relaxed);
            if cumulative >= target {
                return Self::bucket_le(i);
            }
        }
        Self::bucket_le(63)
    }
}

impl Default for WaitHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WaitHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitHistogram")
            .field("total", &self.total())
            .finish()
    }
}

/// Admission counters plus the gate-wait histogram.
#[derive(Debug, Default)]
pub struct SchedMetrics {
    /// Operations that entered without parking.
    pub direct_admissions: Counter,
    /// Operations admitted after a gate wait.
    pub parked_admissions: Counter,
    /// Round-robin writer rounds run at release points.
    pub admission_rounds: Counter,
    /// Reader batches released at writer exits.
    pub reader_batches: Counter,
    /// Operations that left through the cancellation path.
    pub cancellations: Counter,
    /// Time spent parked on a gate, admission or not.
    pub gate_wait: WaitHistogram,
}

impl SchedMetrics {
    pub const fn new() -> Self {
        Self {
            direct_admissions: Counter::new(),
            parked_admissions: Counter::new(),
            admission_rounds: Counter::new(),
            reader_batches: Counter::new(),
            cancellations: Counter::new(),
            gate_wait: WaitHistogram::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increments() {
        let counter = Counter::new();
        counter.incr();
        counter.incr();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(WaitHistogram::bucket_for(0), 0);
        assert_eq!(WaitHistogram::bucket_for(7), 0);
        assert_eq!(WaitHistogram::bucket_for(8), 1);
        assert_eq!(WaitHistogram::bucket_for(15), 1);
        assert_eq!(WaitHistogram::bucket_for(16), 2);
        assert_eq!(WaitHistogram::bucket_for(u64::MAX), 63);
    }

    #[test]
    fn test_record_and_total() {
        let hist = WaitHistogram::new();
        hist.record(10);
        hist.record(100);
        hist.record(1_000_000);
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn test_percentile_monotone() {
        let hist = WaitHistogram::new();
        for ns in [10u64, 20, 40, 80, 160, 320, 640, 1280] {
            hist.record(ns);
        }
        assert!(hist.percentile(50) <= hist.percentile(99));
    }
}
