//! Workload Module
//!
//! Generates the command stream driven against the server.
//!
//! ## Responsibilities
//! - Map logical operations to wire opcodes
//! - Permute the key space once per pass to avoid hot-key clustering
//! - Partition the key space across workers, or feed a shared bounded queue
//!
//! ## Key Modes
//! - `Cycle`: every pass applies one operation to every key, then advances
//!   to the next operation in the sequence
//! - `Stateful`: tracks which keys are present and only inserts absent
//!   keys / deletes present keys

mod stream;
mod shared;

pub use stream::{CommandStream, KeyMode};
pub use shared::SharedSource;

use std::fmt;
use std::str::FromStr;

use crate::error::{HammerError, Result};
use crate::protocol::Opcode;

/// Logical operation issued against a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Insert,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Fetch, Operation::Insert, Operation::Delete];

    /// Default sequence: insert, fetch, delete
    pub const DEFAULT_SEQUENCE: [Operation; 3] =
        [Operation::Insert, Operation::Fetch, Operation::Delete];

    /// Dense index, used for counter tables
    pub fn index(self) -> usize {
        match self {
            Operation::Fetch => 0,
            Operation::Insert => 1,
            Operation::Delete => 2,
        }
    }

    /// Wire opcode for this operation
    pub fn opcode(self, quiet: bool) -> Opcode {
        let opcode = match self {
            Operation::Fetch => Opcode::Get,
            Operation::Insert => Opcode::Add,
            Operation::Delete => Opcode::Delete,
        };
        if quiet { opcode.quiet() } else { opcode }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Insert => "insert",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = HammerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fetch" | "get" => Ok(Operation::Fetch),
            "insert" | "add" | "set" => Ok(Operation::Insert),
            "delete" | "del" => Ok(Operation::Delete),
            other => Err(HammerError::Config(format!("Unknown operation: {:?}", other))),
        }
    }
}

/// Parse a comma-separated operation sequence such as `insert,fetch,delete`
pub fn parse_sequence(s: &str) -> Result<Vec<Operation>> {
    let sequence = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.parse::<Operation>())
        .collect::<Result<Vec<Operation>>>()?;

    if sequence.is_empty() {
        return Err(HammerError::Config("Operation sequence is empty".to_string()));
    }
    Ok(sequence)
}

/// A single unit of work for a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operation: Operation,
    pub key: String,
    /// Worker index owning this key
    pub partition: usize,
}

/// Key name for index `i` in the key space
pub fn key_name(i: u64) -> String {
    format!("k{}", i)
}
