//! Command stream
//!
//! Lazy, effectively infinite sequence of commands over a key space.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{key_name, Command, Operation};

/// How operations are assigned to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// One operation per pass over the whole (permuted) key space
    #[default]
    Cycle,

    /// Track key presence; insert only absent keys, delete only present keys
    Stateful,
}

/// Generates commands for one partition of the key space
///
/// Each pass visits every key of the partition exactly once, in a freshly
/// shuffled order, under a single operation. After the pass the stream
/// advances to the next operation of the sequence, wrapping around.
pub struct CommandStream {
    /// Key of slot `s` is `first + s * stride`
    first: u64,
    stride: u64,
    slots: usize,

    /// Partition index stamped on every command
    partition: usize,

    sequence: Vec<Operation>,
    mode: KeyMode,
    rng: StdRng,

    /// Current permutation of slots
    order: Vec<usize>,
    cursor: usize,

    /// Index into `sequence` for the current pass
    step: usize,
    passes: u64,

    /// Stateful mode: which slots currently hold a value
    present: Vec<bool>,
    emitted_this_pass: bool,
    idle_passes: usize,
}

impl CommandStream {
    /// Stream over the whole key space `[0, key_count)`
    pub fn new(key_count: u64, sequence: Vec<Operation>, mode: KeyMode, seed: Option<u64>) -> Self {
        Self::partitioned(key_count, 0, 1, sequence, mode, seed)
    }

    /// Stream over the keys `k` in `[0, key_count)` with `k % count == index`
    ///
    /// # Panics
    /// If `count` is zero, `index >= count` or `sequence` is empty.
    pub fn partitioned(
        key_count: u64,
        index: usize,
        count: usize,
        sequence: Vec<Operation>,
        mode: KeyMode,
        seed: Option<u64>,
    ) -> Self {
        assert!(count > 0 && index < count, "partition {} of {}", index, count);
        assert!(!sequence.is_empty(), "operation sequence is empty");

        let first = index as u64;
        let stride = count as u64;
        let slots = if key_count > first {
            ((key_count - first - 1) / stride + 1) as usize
        } else {
            0
        };

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_os_rng(),
        };

        let mut stream = Self {
            first,
            stride,
            slots,
            partition: index,
            sequence,
            mode,
            rng,
            order: (0..slots).collect(),
            cursor: 0,
            step: 0,
            passes: 0,
            present: match mode {
                KeyMode::Cycle => Vec::new(),
                KeyMode::Stateful => vec![false; slots],
            },
            emitted_this_pass: false,
            idle_passes: 0,
        };
        stream.order.shuffle(&mut stream.rng);
        stream
    }

    /// Number of keys in this stream's partition
    pub fn key_count(&self) -> usize {
        self.slots
    }

    /// Number of completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Operation applied during the current pass
    pub fn current_operation(&self) -> Operation {
        self.sequence[self.step]
    }

    fn key_of(&self, slot: usize) -> u64 {
        self.first + slot as u64 * self.stride
    }

    /// Finish the current pass: advance the operation and reshuffle
    fn next_pass(&mut self) {
        if self.emitted_this_pass {
            self.idle_passes = 0;
        } else {
            self.idle_passes += 1;
        }
        self.emitted_this_pass = false;
        self.passes += 1;
        self.cursor = 0;
        self.step = (self.step + 1) % self.sequence.len();
        self.order.shuffle(&mut self.rng);
    }

    /// Stateful mode: apply `operation` to `slot` if valid for its state
    fn admit(&mut self, slot: usize, operation: Operation) -> bool {
        match self.mode {
            KeyMode::Cycle => true,
            KeyMode::Stateful => match operation {
                Operation::Fetch => true,
                Operation::Insert if !self.present[slot] => {
                    self.present[slot] = true;
                    true
                }
                Operation::Delete if self.present[slot] => {
                    self.present[slot] = false;
                    true
                }
                _ => false,
            },
        }
    }
}

impl Iterator for CommandStream {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        if self.slots == 0 {
            return None;
        }

        loop {
            // A full sequence of passes without output means nothing is valid anymore
            if self.idle_passes >= self.sequence.len() {
                return None;
            }
            if self.cursor == self.order.len() {
                self.next_pass();
                continue;
            }

            let slot = self.order[self.cursor];
            self.cursor += 1;
            let operation = self.current_operation();

            if self.admit(slot, operation) {
                self.emitted_this_pass = true;
                return Some(Command {
                    operation,
                    key: key_name(self.key_of(slot)),
                    partition: self.partition,
                });
            }
        }
    }
}
