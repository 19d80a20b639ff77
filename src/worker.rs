//! Worker
//!
//! Drives one connection: takes commands, exchanges frames with the
//! server and counts every completed exchange.
//!
//! ## Failure Model
//! - Transport or framing errors end this worker only
//! - A non-success status is counted and the loop continues
//! - The stop signal is checked whenever local counters are flushed

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::config::Config;
use crate::controller::StopSignal;
use crate::error::{HammerError, Result};
use crate::network::Connection;
use crate::protocol::{RequestFrame, ResponseFrame};
use crate::stats::{LocalCounters, StatsAggregator};
use crate::workload::{Command, CommandStream, Operation};

/// How often a worker waiting on the shared queue re-checks the stop signal
const RECV_POLL: Duration = Duration::from_millis(50);

/// Where a worker gets its commands from
pub enum CommandSource {
    /// Worker-owned slice of the key space
    Partitioned(CommandStream),

    /// Shared bounded queue
    Shared(Receiver<Command>),
}

/// Settings common to all workers of a run
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub flush_every: u64,
    pub pipeline_depth: usize,
    pub quiet: bool,
    pub item_flags: u32,
    pub item_expiry: u32,
    pub value: Bytes,
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            flush_every: config.flush_every,
            pipeline_depth: config.pipeline_depth,
            quiet: config.quiet,
            item_flags: config.item_flags,
            item_expiry: config.item_expiry,
            value: Bytes::from(vec![b'x'; config.value_size]),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Why a worker stopped
#[derive(Debug)]
pub enum WorkerExit {
    /// Observed the stop signal
    Stopped,

    /// Transport or framing failure
    Failed(HammerError),
}

/// One unit of concurrency
pub struct Worker {
    id: usize,
    connection: Connection,
    source: CommandSource,
    stats: Arc<StatsAggregator>,
    stop: StopSignal,
    settings: Arc<WorkerSettings>,
    local: LocalCounters,
    next_opaque: u32,
}

impl Worker {
    pub fn new(
        id: usize,
        connection: Connection,
        source: CommandSource,
        stats: Arc<StatsAggregator>,
        stop: StopSignal,
        settings: Arc<WorkerSettings>,
    ) -> Self {
        Self {
            id,
            connection,
            source,
            stats,
            stop,
            settings,
            local: LocalCounters::new(),
            next_opaque: 0,
        }
    }

    /// Run until stopped or a transport error occurs
    ///
    /// Local counters are always flushed before returning.
    pub fn run(mut self) -> WorkerExit {
        tracing::debug!(worker = self.id, peer = %self.connection.peer_addr(), "Worker started");

        let result = if self.settings.pipeline_depth > 1 {
            self.run_pipelined()
        } else {
            self.run_serial()
        };
        self.local.flush_into(&self.stats);

        match result {
            Ok(()) => {
                tracing::debug!(worker = self.id, "Worker stopped");
                WorkerExit::Stopped
            }
            Err(e) => {
                let kind = if e.is_framing() { "framing" } else { "transport" };
                tracing::warn!(worker = self.id, peer = %self.connection.peer_addr(), "Worker terminated on {} error: {}", kind, e);
                WorkerExit::Failed(e)
            }
        }
    }

    /// One outstanding request at a time
    fn run_serial(&mut self) -> Result<()> {
        loop {
            let Some(command) = self.next_command() else {
                self.idle();
                return Ok(());
            };

            let opaque = self.take_opaque();
            let request = self.request_for(&command, opaque);
            let response = self.connection.exchange(&request)?;
            if response.opaque != opaque {
                return Err(HammerError::UnexpectedOpaque(response.opaque));
            }
            self.record(command.operation, &response);

            if self.checkpoint() {
                return Ok(());
            }
        }
    }

    /// Up to `pipeline_depth` requests in flight, matched by opaque
    fn run_pipelined(&mut self) -> Result<()> {
        let depth = self.settings.pipeline_depth;
        let quiet = self.settings.quiet;
        let mut outstanding: HashMap<u32, Operation> = HashMap::with_capacity(depth);

        loop {
            let mut exhausted = false;
            while outstanding.len() < depth {
                match self.next_command() {
                    Some(command) => {
                        let opaque = self.take_opaque();
                        let request = self.request_for(&command, opaque);
                        self.connection.queue(&request)?;
                        outstanding.insert(opaque, command.operation);
                    }
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }

            if outstanding.is_empty() {
                self.idle();
                return Ok(());
            }

            if quiet {
                let fence = self.take_opaque();
                self.connection.queue(&RequestFrame::noop().with_opaque(fence))?;
                self.connection.flush()?;
                self.drain_quiet(&mut outstanding, fence)?;
            } else {
                self.connection.flush()?;
                while !outstanding.is_empty() {
                    let response = self.connection.recv()?;
                    let operation = outstanding
                        .remove(&response.opaque)
                        .ok_or(HammerError::UnexpectedOpaque(response.opaque))?;
                    self.record(operation, &response);
                }
            }

            if exhausted {
                self.idle();
                return Ok(());
            }
            if self.checkpoint() {
                return Ok(());
            }
        }
    }

    /// Read replies up to the NOOP fence
    ///
    /// Quiet requests reply only on error (GETQ also on a hit). Whatever is
    /// still outstanding once the fence answers completed silently.
    fn drain_quiet(&mut self, outstanding: &mut HashMap<u32, Operation>, fence: u32) -> Result<()> {
        loop {
            let response = self.connection.recv()?;
            if response.opaque == fence {
                break;
            }
            let operation = outstanding
                .remove(&response.opaque)
                .ok_or(HammerError::UnexpectedOpaque(response.opaque))?;
            self.record(operation, &response);
        }

        for (_, operation) in outstanding.drain() {
            // A silent GETQ is a miss
            self.local.record(operation, operation != Operation::Fetch);
        }
        Ok(())
    }

    fn next_command(&mut self) -> Option<Command> {
        match &mut self.source {
            CommandSource::Partitioned(stream) => stream.next(),
            CommandSource::Shared(receiver) => loop {
                match receiver.recv_timeout(RECV_POLL) {
                    Ok(command) => return Some(command),
                    Err(RecvTimeoutError::Timeout) => {
                        if self.stop.is_raised() {
                            return None;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => return None,
                }
            },
        }
    }

    fn request_for(&self, command: &Command, opaque: u32) -> RequestFrame {
        let opcode = command.operation.opcode(self.settings.quiet);
        let key = Bytes::from(command.key.clone().into_bytes());
        let request = match command.operation {
            Operation::Insert => RequestFrame::store(
                opcode,
                key,
                self.settings.item_flags,
                self.settings.item_expiry,
                self.settings.value.clone(),
            ),
            Operation::Fetch | Operation::Delete => RequestFrame::new(opcode, key),
        };
        request.with_opaque(opaque)
    }

    fn take_opaque(&mut self) -> u32 {
        let opaque = self.next_opaque;
        self.next_opaque = self.next_opaque.wrapping_add(1);
        opaque
    }

    fn record(&mut self, operation: Operation, response: &ResponseFrame) {
        let success = response.is_success();
        if !success {
            tracing::trace!(worker = self.id, %operation, status = ?response.status(), "Non-success status");
        }
        self.local.record(operation, success);
    }

    /// Flush counters once a batch is full; true if the worker should stop
    fn checkpoint(&mut self) -> bool {
        if self.local.pending() < self.settings.flush_every {
            return false;
        }
        self.local.flush_into(&self.stats);
        self.stop.is_raised()
    }

    /// Nothing left to send: publish counts and wait for the stop signal
    fn idle(&mut self) {
        self.local.flush_into(&self.stats);
        tracing::debug!(worker = self.id, "No more commands, idling until stopped");
        self.stop.wait();
    }
}
