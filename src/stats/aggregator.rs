//! Counter tables
//!
//! Atomic per-operation counters plus the worker-local batch that feeds them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::workload::Operation;
use super::Report;

const OPS: usize = Operation::ALL.len();

/// A snapshot of per-operation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Completed exchanges, any status
    pub completed: [u64; OPS],

    /// Completed exchanges with a non-success status
    pub failed: [u64; OPS],
}

impl OpCounts {
    pub fn completed(&self, op: Operation) -> u64 {
        self.completed[op.index()]
    }

    pub fn failed(&self, op: Operation) -> u64 {
        self.failed[op.index()]
    }

    /// Total completed exchanges across operations
    pub fn total(&self) -> u64 {
        self.completed.iter().sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.failed.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Accumulate another snapshot into this one
    pub fn add(&mut self, other: &OpCounts) {
        for i in 0..OPS {
            self.completed[i] += other.completed[i];
            self.failed[i] += other.failed[i];
        }
    }
}

/// Process-wide counters, shared by all workers
#[derive(Debug, Default)]
pub struct StatsAggregator {
    completed: [AtomicU64; OPS],
    failed: [AtomicU64; OPS],
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed exchange
    pub fn increment(&self, op: Operation, success: bool) {
        self.add(op, 1, u64::from(!success));
    }

    /// Add a batch of `completed` exchanges, `failed` of which had a failure status
    pub fn add(&self, op: Operation, completed: u64, failed: u64) {
        let i = op.index();
        if completed > 0 {
            self.completed[i].fetch_add(completed, Ordering::Relaxed);
        }
        if failed > 0 {
            self.failed[i].fetch_add(failed, Ordering::Relaxed);
        }
    }

    /// Current counts, without resetting
    pub fn snapshot(&self) -> OpCounts {
        let mut counts = OpCounts::default();
        for i in 0..OPS {
            counts.completed[i] = self.completed[i].load(Ordering::Relaxed);
            counts.failed[i] = self.failed[i].load(Ordering::Relaxed);
        }
        counts
    }

    /// Read and reset every counter
    ///
    /// Each counter is reduced by exactly the amount read, so increments
    /// racing with the drain carry over to the next one.
    pub fn drain(&self) -> OpCounts {
        let mut counts = OpCounts::default();
        for i in 0..OPS {
            counts.completed[i] = drain_counter(&self.completed[i]);
            counts.failed[i] = drain_counter(&self.failed[i]);
        }
        counts
    }

    /// Drain into a report covering `elapsed`
    pub fn report(&self, elapsed: Duration) -> Report {
        Report::new(self.drain(), elapsed)
    }
}

fn drain_counter(counter: &AtomicU64) -> u64 {
    let value = counter.load(Ordering::Relaxed);
    if value > 0 {
        counter.fetch_sub(value, Ordering::Relaxed);
    }
    value
}

/// Uncontended per-worker counters, flushed into the aggregator in batches
#[derive(Debug, Default)]
pub struct LocalCounters {
    counts: OpCounts,
    pending: u64,
}

impl LocalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, op: Operation, success: bool) {
        let i = op.index();
        self.counts.completed[i] += 1;
        if !success {
            self.counts.failed[i] += 1;
        }
        self.pending += 1;
    }

    /// Exchanges recorded since the last flush
    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Push everything recorded so far into `stats` and reset
    pub fn flush_into(&mut self, stats: &StatsAggregator) {
        if self.pending == 0 {
            return;
        }
        for op in Operation::ALL {
            stats.add(op, self.counts.completed(op), self.counts.failed(op));
        }
        self.counts = OpCounts::default();
        self.pending = 0;
    }
}
