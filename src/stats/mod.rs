//! Stats Module
//!
//! Per-operation counters shared by all workers, and the periodic
//! throughput report built from them.
//!
//! ## Concurrency Model
//! - Workers count into an uncontended `LocalCounters` and flush in batches
//! - `StatsAggregator` holds one atomic counter per operation and outcome
//! - The reporter drains counters by subtracting what it read, so an
//!   increment landing between the read and the reset is never lost

mod aggregator;
mod report;

pub use aggregator::{LocalCounters, OpCounts, StatsAggregator};
pub use report::{Report, Reporter};
