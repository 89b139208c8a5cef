//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the protocol engine and the outside
//! world: the serial link, the shell, and the events log file. The engine
//! only sees these traits, so tests drive it with in-memory fakes.

pub mod action_runner;
pub mod event_log;
pub mod transport;

pub use action_runner::{ActionError, ActionOutcome, ActionRunner};
pub use event_log::{EventLog, EventLogError};
pub use transport::{NullTransport, Transport, TransportError};
