//! # binhammer
//!
//! A load generator for key-value cache servers speaking the binary
//! request/response protocol:
//! - Byte-exact request encoding and staged response decoding
//! - Shuffled, pass-based command streams over a synthetic key space
//! - One thread and one persistent connection per worker
//! - Lock-free per-operation counters drained into periodic reports
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Controller                             │
//! │          (start workers, duration timer, join all)           │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//! ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//! │  Worker 0   │  ...   │  Worker N   │        │  Reporter   │
//! │ CommandStream│       │ CommandStream│       │ (interval)  │
//! └──────┬──────┘        └──────┬──────┘        └──────▲──────┘
//!        │ encode / decode      │                      │ drain
//!        ▼                      ▼                      │
//! ┌─────────────┐        ┌─────────────┐        ┌──────┴──────┐
//! │ Connection  │        │ Connection  │        │    Stats    │
//! │   (TCP)     │        │   (TCP)     │ ─────▶ │ (atomics)   │
//! └─────────────┘        └─────────────┘  flush └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod workload;
pub mod stats;
pub mod worker;
pub mod controller;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HammerError, Result};
pub use config::{Config, Dispatch, KeyMode};
pub use controller::{Controller, ControllerState, RunSummary, StopSignal};
pub use network::{Connection, Connector, TcpConnector};
pub use stats::StatsAggregator;
pub use workload::Operation;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of binhammer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
