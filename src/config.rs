//! Configuration for binhammer
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{HammerError, Result};
use crate::protocol::MAX_BODY_LEN;
use crate::workload::Operation;

pub use crate::workload::KeyMode;

/// Main configuration for a load run
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target Configuration
    // -------------------------------------------------------------------------
    /// Transport protocol: `tcp`, `tcp4` or `tcp6`
    pub protocol: String,

    /// Destination host:port
    pub address: String,

    /// Connection read timeout
    pub read_timeout: Option<Duration>,

    /// Connection write timeout
    pub write_timeout: Option<Duration>,

    // -------------------------------------------------------------------------
    // Workload Configuration
    // -------------------------------------------------------------------------
    /// Number of workers, each with its own connection
    pub concurrency: usize,

    /// Size of the key space `[0, key_count)`
    pub key_count: u64,

    /// Length of the value sent with every insert
    pub value_size: usize,

    /// Operations applied pass by pass
    pub sequence: Vec<Operation>,

    /// How operations are assigned to keys
    pub key_mode: KeyMode,

    /// How commands reach workers
    pub dispatch: Dispatch,

    /// Flags and expiry carried in insert extras
    pub item_flags: u32,
    pub item_expiry: u32,

    /// Seed for key permutations; random when unset
    pub seed: Option<u64>,

    // -------------------------------------------------------------------------
    // Pipelining Configuration
    // -------------------------------------------------------------------------
    /// Requests in flight per connection (1 = strict request/response)
    pub pipeline_depth: usize,

    /// Send quiet opcodes followed by a NOOP fence (requires pipelining)
    pub quiet: bool,

    // -------------------------------------------------------------------------
    // Run Control Configuration
    // -------------------------------------------------------------------------
    /// Stop after this long; run until interrupted when unset
    pub duration: Option<Duration>,

    /// Interval between throughput reports
    pub report_interval: Duration,

    /// Operations between local counter flushes and stop checks
    pub flush_every: u64,
}

/// Command dispatch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Each worker owns a disjoint slice of the key space (no coordination)
    Partitioned,

    /// One producer feeds a bounded queue shared by all workers
    Shared { queue_depth: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: "tcp".to_string(),
            address: "localhost:11211".to_string(),
            read_timeout: None,
            write_timeout: None,
            concurrency: 32,
            key_count: 1_000_000,
            value_size: 20,
            sequence: Operation::DEFAULT_SEQUENCE.to_vec(),
            key_mode: KeyMode::Cycle,
            dispatch: Dispatch::Partitioned,
            item_flags: 19,
            item_expiry: 0,
            seed: None,
            pipeline_depth: 1,
            quiet: false,
            duration: None,
            report_interval: Duration::from_secs(5),
            flush_every: 1000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration before any worker is started
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.protocol.as_str(), "tcp" | "tcp4" | "tcp6") {
            return Err(HammerError::Config(format!(
                "Unsupported protocol: {:?}",
                self.protocol
            )));
        }
        if self.sequence.is_empty() {
            return Err(HammerError::Config("Operation sequence is empty".to_string()));
        }
        if self.flush_every == 0 {
            return Err(HammerError::Config("Flush interval must be positive".to_string()));
        }
        if self.report_interval.is_zero() {
            return Err(HammerError::Config("Report interval must be positive".to_string()));
        }
        if self.pipeline_depth == 0 {
            return Err(HammerError::Config("Pipeline depth must be positive".to_string()));
        }
        if self.quiet && self.pipeline_depth < 2 {
            return Err(HammerError::Config(
                "Quiet opcodes require a pipeline depth of at least 2".to_string(),
            ));
        }
        if let Dispatch::Shared { queue_depth } = self.dispatch {
            if queue_depth == 0 {
                return Err(HammerError::Config("Queue depth must be positive".to_string()));
            }
            // Stateful tracking assumes one worker per key, so commands on
            // a key reach the server in the order they were generated
            if self.key_mode == KeyMode::Stateful {
                return Err(HammerError::Config(
                    "Stateful key mode requires partitioned dispatch".to_string(),
                ));
            }
        }
        // Extras (8) + longest key + value must fit the body limit
        let longest_key = crate::workload::key_name(self.key_count.saturating_sub(1)).len();
        if (self.value_size as u64) + 8 + longest_key as u64 > u64::from(MAX_BODY_LEN) {
            return Err(HammerError::Config(format!(
                "Value size {} does not fit in a frame",
                self.value_size
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the transport protocol (`tcp`, `tcp4`, `tcp6`)
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.protocol = protocol.into();
        self
    }

    /// Set the destination host:port
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.config.address = addr.into();
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = Some(timeout);
        self
    }

    /// Set the number of workers
    pub fn concurrency(mut self, count: usize) -> Self {
        self.config.concurrency = count;
        self
    }

    /// Set the key space size
    pub fn key_count(mut self, count: u64) -> Self {
        self.config.key_count = count;
        self
    }

    /// Set the insert value length (in bytes)
    pub fn value_size(mut self, size: usize) -> Self {
        self.config.value_size = size;
        self
    }

    /// Set the operation sequence
    pub fn sequence(mut self, sequence: Vec<Operation>) -> Self {
        self.config.sequence = sequence;
        self
    }

    pub fn key_mode(mut self, mode: KeyMode) -> Self {
        self.config.key_mode = mode;
        self
    }

    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    /// Set flags and expiry for inserted items
    pub fn item(mut self, flags: u32, expiry: u32) -> Self {
        self.config.item_flags = flags;
        self.config.item_expiry = expiry;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn pipeline_depth(mut self, depth: usize) -> Self {
        self.config.pipeline_depth = depth;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }

    /// Set the run duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Set the report interval
    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.config.report_interval = interval;
        self
    }

    /// Set the counter flush cadence (in operations)
    pub fn flush_every(mut self, ops: u64) -> Self {
        self.config.flush_every = ops;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
