//! Verification queue — matches adapter echoes against commands we wrote.
//!
//! Every command written to the adapter is pushed here; every decoded
//! event is compared with the oldest unverified command. A command is
//! verified when the power line reports the same address and function.

use std::fmt;

use x10hub_domain::address::Address;
use x10hub_domain::event::DeviceEvent;
use x10hub_domain::function::Function;

/// Default number of commands awaiting verification.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// A command written to the adapter and not yet heard back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub address: Address,
    pub function: Function,
}

impl PendingCommand {
    fn matches(&self, event: &DeviceEvent) -> bool {
        self.address == event.address && self.function == event.function
    }
}

/// Outcome of [`VerificationQueue::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The queue was full; the oldest unverified command was dropped.
    Saturated(QueueSnapshot),
}

/// Outcome of [`VerificationQueue::match_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Nothing is waiting for verification.
    Idle,
    /// The oldest pending command was confirmed.
    Verified(PendingCommand),
    /// The event did not originate from our own writes.
    Unmatched,
}

/// Fixed-capacity ring of unverified commands.
#[derive(Debug)]
pub struct VerificationQueue {
    slots: Vec<Option<PendingCommand>>,
    write: usize,
    read: usize,
}

impl Default for VerificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl VerificationQueue {
    /// Create a queue; capacities below 2 are raised to 2.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(2)],
            write: 0,
            read: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Number of commands waiting for verification.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.write + self.capacity() - self.read) % self.capacity()
    }

    /// Record a written command.
    ///
    /// When the queue is already full of unconfirmed commands the oldest is
    /// dropped and a snapshot of the queue before the drop is returned.
    pub fn push(&mut self, address: Address, function: Function) -> PushOutcome {
        self.slots[self.write] = Some(PendingCommand { address, function });
        let next = (self.write + 1) % self.capacity();
        if next == self.read {
            let snapshot = self.snapshot_of(self.capacity());
            tracing::warn!(
                capacity = self.capacity(),
                "verification queue saturated, device may be disconnected\n{snapshot}"
            );
            self.slots[self.read] = None;
            self.read = (self.read + 1) % self.capacity();
            self.write = next;
            return PushOutcome::Saturated(snapshot);
        }
        self.write = next;
        PushOutcome::Queued
    }

    /// Try to verify the oldest pending command with a decoded event.
    pub fn match_event(&mut self, event: &DeviceEvent) -> MatchOutcome {
        if self.is_empty() {
            return MatchOutcome::Idle;
        }
        match self.slots[self.read] {
            Some(pending) if pending.matches(event) => {
                self.slots[self.read] = None;
                self.read = (self.read + 1) % self.capacity();
                MatchOutcome::Verified(pending)
            }
            _ => MatchOutcome::Unmatched,
        }
    }

    /// Diagnostic view of the queue, oldest unverified command first.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        self.snapshot_of(self.len())
    }

    fn snapshot_of(&self, count: usize) -> QueueSnapshot {
        let pending = (0..count)
            .filter_map(|offset| self.slots[(self.read + offset) % self.capacity()])
            .collect();
        QueueSnapshot {
            capacity: self.capacity(),
            read: self.read,
            write: self.write,
            pending,
        }
    }
}

/// A copy of the queue contents for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub capacity: usize,
    pub read: usize,
    pub write: usize,
    pub pending: Vec<PendingCommand>,
}

impl fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verification queue: {} pending of {} (read {}, write {})",
            self.pending.len(),
            self.capacity,
            self.read,
            self.write
        )?;
        for command in &self.pending {
            write!(f, "\n  {} {}", command.address, command.function)?;
        }
        Ok(())
    }
}
