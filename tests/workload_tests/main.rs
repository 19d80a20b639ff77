//! Workload Tests
//!
//! Command stream coverage, key partitioning, the shared queue and
//! operation sequence parsing.

mod sequence_tests;
