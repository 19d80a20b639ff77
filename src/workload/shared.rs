//! Shared command source
//!
//! A single producer thread runs a `CommandStream` and feeds a bounded
//! queue that all workers receive from. Each command is delivered to
//! exactly one worker; a full queue blocks the producer.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, SendTimeoutError};

use crate::controller::StopSignal;
use crate::error::{HammerError, Result};
use super::{Command, CommandStream};

/// How often a blocked producer re-checks the stop signal
const PRODUCER_POLL: Duration = Duration::from_millis(50);

/// Bounded queue of commands shared by all workers
pub struct SharedSource {
    receiver: Receiver<Command>,
    producer: Option<JoinHandle<()>>,
}

impl SharedSource {
    /// Start the producer thread
    ///
    /// The queue closes once the stream is exhausted or `stop` is raised.
    pub fn spawn(stream: CommandStream, queue_depth: usize, stop: StopSignal) -> Result<Self> {
        if queue_depth == 0 {
            return Err(HammerError::Config("Queue depth must be positive".to_string()));
        }

        let (sender, receiver) = channel::bounded(queue_depth);
        let producer = thread::Builder::new()
            .name("command-producer".to_string())
            .spawn(move || {
                for mut command in stream {
                    loop {
                        match sender.send_timeout(command, PRODUCER_POLL) {
                            Ok(()) => break,
                            Err(SendTimeoutError::Timeout(pending)) => {
                                if stop.is_raised() {
                                    return;
                                }
                                command = pending;
                            }
                            Err(SendTimeoutError::Disconnected(_)) => return,
                        }
                    }
                    if stop.is_raised() {
                        return;
                    }
                }
                tracing::debug!("Command stream exhausted, closing shared queue");
            })?;

        Ok(Self {
            receiver,
            producer: Some(producer),
        })
    }

    /// A receiving handle for one worker
    pub fn receiver(&self) -> Receiver<Command> {
        self.receiver.clone()
    }

    /// Wait for the producer thread to exit
    ///
    /// Only returns once the stop signal is raised, every receiver is
    /// dropped or the stream is exhausted.
    pub fn join(mut self) {
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                tracing::warn!("Command producer panicked");
            }
        }
    }
}
