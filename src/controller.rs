//! Controller Module
//!
//! Owns the stats aggregator and supervises worker lifetimes.
//!
//! ## Lifecycle
//! ```text
//! Idle ──run()──▶ Running ──stop raised──▶ Draining ──all joined──▶ Stopped
//! ```
//!
//! ## Responsibilities
//! - Start one thread per worker, each connecting on its own
//! - Start the reporter and, when configured, the duration timer
//! - Block until every worker has exited, then take a final report

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::{Config, Dispatch};
use crate::error::{HammerError, Result};
use crate::network::Connector;
use crate::stats::{OpCounts, Reporter, StatsAggregator};
use crate::worker::{CommandSource, Worker, WorkerExit, WorkerSettings};
use crate::workload::{CommandStream, SharedSource};

// =============================================================================
// Stop Signal
// =============================================================================

/// Cooperative, process-wide stop flag
///
/// Cloning shares the flag. Raising it is permanent.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<SignalInner>,
}

#[derive(Debug, Default)]
struct SignalInner {
    raised: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every waiter
    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::Release);
        let _guard = self.inner.lock.lock();
        self.inner.cond.notify_all();
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::Acquire)
    }

    /// Block until raised
    pub fn wait(&self) {
        let mut guard = self.inner.lock.lock();
        while !self.is_raised() {
            self.inner.cond.wait(&mut guard);
        }
    }

    /// Block until raised or `timeout` elapses; returns whether it was raised
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock();
        while !self.is_raised() {
            if self.inner.cond.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_raised()
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    /// Stop raised, workers finishing their in-flight operation
    Draining,
    Stopped,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Everything counted during the run
    pub totals: OpCounts,

    /// Workers that exited on the stop signal
    pub workers_stopped: usize,

    /// Workers that exited on a connect, transport or framing error
    pub workers_failed: usize,

    pub elapsed: Duration,
}

impl RunSummary {
    /// Average operations per second over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.totals.total() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Supervises workers for one run
pub struct Controller {
    config: Config,
    stats: Arc<StatsAggregator>,
    stop: StopSignal,
    state: Mutex<ControllerState>,
}

impl Controller {
    /// Create a controller, rejecting invalid configuration up front
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: Arc::new(StatsAggregator::new()),
            stop: StopSignal::new(),
            state: Mutex::new(ControllerState::Idle),
        })
    }

    /// Handle for stopping the run from elsewhere (e.g. Ctrl+C)
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stats(&self) -> Arc<StatsAggregator> {
        Arc::clone(&self.stats)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        match *self.state.lock() {
            ControllerState::Running if self.stop.is_raised() => ControllerState::Draining,
            state => state,
        }
    }

    fn set_state(&self, state: ControllerState) {
        *self.state.lock() = state;
    }

    /// Run the workload until every worker has exited
    ///
    /// Workers exit when the stop signal is raised (by the duration timer
    /// or externally) or on their own transport failure. Returns once all
    /// of them have been joined.
    pub fn run<C: Connector + 'static>(&self, connector: Arc<C>) -> Result<RunSummary> {
        {
            let mut state = self.state.lock();
            if *state != ControllerState::Idle {
                return Err(HammerError::Config("Controller has already run".to_string()));
            }
            *state = ControllerState::Running;
        }

        tracing::info!(
            "Connecting {} clients to {}/{}",
            self.config.concurrency,
            self.config.protocol,
            self.config.address
        );

        let started = Instant::now();
        let halt = StopSignal::new();
        let reporter = {
            let reporter = Reporter::new(self.stats(), self.config.report_interval, halt.clone());
            thread::Builder::new()
                .name("reporter".to_string())
                .spawn(move || reporter.run())?
        };

        let timer = match self.spawn_timer() {
            Ok(timer) => timer,
            Err(e) => {
                halt.raise();
                let _ = reporter.join();
                self.set_state(ControllerState::Stopped);
                return Err(e);
            }
        };

        let result = self.spawn_and_join(connector);

        // Release the timer and producer even if workers ended on their own
        self.stop.raise();
        if let Some(timer) = timer {
            let _ = timer.join();
        }
        halt.raise();
        let totals = match reporter.join() {
            Ok(totals) => totals,
            Err(_) => {
                tracing::warn!("Reporter panicked");
                self.stats.drain()
            }
        };
        self.set_state(ControllerState::Stopped);

        let (workers_stopped, workers_failed) = result?;
        let summary = RunSummary {
            totals,
            workers_stopped,
            workers_failed,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Run finished: {} ops in {:.2}s ({:.2} ops/s), {} workers failed",
            summary.totals.total(),
            summary.elapsed.as_secs_f64(),
            summary.throughput(),
            summary.workers_failed
        );
        Ok(summary)
    }

    /// Start the duration timer, if a duration is configured
    fn spawn_timer(&self) -> Result<Option<JoinHandle<()>>> {
        let Some(duration) = self.config.duration else {
            return Ok(None);
        };
        let stop = self.stop.clone();
        let handle = thread::Builder::new()
            .name("timer".to_string())
            .spawn(move || {
                if !stop.wait_timeout(duration) {
                    tracing::info!("Run duration of {:?} elapsed, stopping", duration);
                    stop.raise();
                }
            })?;
        Ok(Some(handle))
    }

    /// Start every worker and wait for all of them; returns (stopped, failed)
    fn spawn_and_join<C: Connector + 'static>(&self, connector: Arc<C>) -> Result<(usize, usize)> {
        let config = &self.config;
        let settings = Arc::new(WorkerSettings::from_config(config));

        let shared = match config.dispatch {
            Dispatch::Shared { queue_depth } => {
                let stream = CommandStream::new(
                    config.key_count,
                    config.sequence.clone(),
                    config.key_mode,
                    config.seed,
                );
                Some(SharedSource::spawn(stream, queue_depth, self.stop.clone())?)
            }
            Dispatch::Partitioned => None,
        };

        let mut handles: Vec<JoinHandle<WorkerExit>> = Vec::with_capacity(config.concurrency);
        let mut spawn_error = None;
        for id in 0..config.concurrency {
            let source = match &shared {
                Some(shared) => CommandSource::Shared(shared.receiver()),
                None => CommandSource::Partitioned(CommandStream::partitioned(
                    config.key_count,
                    id,
                    config.concurrency,
                    config.sequence.clone(),
                    config.key_mode,
                    config.seed,
                )),
            };
            let connector = Arc::clone(&connector);
            let stats = self.stats();
            let stop = self.stop.clone();
            let settings = Arc::clone(&settings);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || match connector.connect() {
                    Ok(connection) => Worker::new(id, connection, source, stats, stop, settings).run(),
                    Err(e) => {
                        tracing::warn!(worker = id, "Failed to connect: {}", e);
                        WorkerExit::Failed(e)
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Stop what did start, then report the failure
                    self.stop.raise();
                    spawn_error = Some(HammerError::Io(e));
                    break;
                }
            }
        }

        let mut stopped = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.join() {
                Ok(WorkerExit::Stopped) => stopped += 1,
                Ok(WorkerExit::Failed(_)) => failed += 1,
                Err(_) => {
                    tracing::warn!("Worker panicked");
                    failed += 1;
                }
            }
        }
        tracing::debug!("All workers joined");

        if let Some(shared) = shared {
            self.stop.raise();
            shared.join();
        }

        match spawn_error {
            Some(e) => Err(e),
            None => Ok((stopped, failed)),
        }
    }
}
