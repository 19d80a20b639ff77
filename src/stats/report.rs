//! Throughput reports
//!
//! The reporter drains the aggregator on a fixed interval and logs one
//! line per interval.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::controller::StopSignal;
use crate::workload::Operation;
use super::{OpCounts, StatsAggregator};

/// Counts drained over one interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub counts: OpCounts,
    pub elapsed: Duration,
}

impl Report {
    pub fn new(counts: OpCounts, elapsed: Duration) -> Self {
        Self { counts, elapsed }
    }

    /// Operations per second over the interval
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.counts.total() as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ops/s ({} ops in {:.2}s)", self.throughput(), self.counts.total(), self.elapsed.as_secs_f64())?;
        for op in Operation::ALL {
            write!(f, " {}={}", op, self.counts.completed(op))?;
            let failed = self.counts.failed(op);
            if failed > 0 {
                write!(f, "/{} failed", failed)?;
            }
        }
        Ok(())
    }
}

/// Periodic reporter
pub struct Reporter {
    stats: Arc<StatsAggregator>,
    interval: Duration,
    halt: StopSignal,
}

impl Reporter {
    pub fn new(stats: Arc<StatsAggregator>, interval: Duration, halt: StopSignal) -> Self {
        Self { stats, interval, halt }
    }

    /// Report every interval until halted
    ///
    /// Performs a final drain once halted and returns the sum of
    /// everything drained.
    pub fn run(self) -> OpCounts {
        let mut totals = OpCounts::default();
        let mut last = Instant::now();

        loop {
            let halted = self.halt.wait_timeout(self.interval);
            let now = Instant::now();
            let report = self.stats.report(now - last);
            last = now;
            totals.add(&report.counts);

            if !halted || !report.counts.is_empty() {
                tracing::info!("{}", report);
            }
            if halted {
                return totals;
            }
        }
    }
}
