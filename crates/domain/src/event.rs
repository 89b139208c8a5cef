//! Event — a function observed at an address on the power line.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::function::Function;
use crate::state::DeviceState;
use crate::time::{Timestamp, format_event_time};

/// One decoded `<address> <function>` pair from an adapter reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub address: Address,
    pub function: Function,
}

impl DeviceEvent {
    #[must_use]
    pub fn new(address: Address, function: Function) -> Self {
        Self { address, function }
    }

    /// State implied by the event's function, if any.
    #[must_use]
    pub fn implied_state(&self) -> Option<DeviceState> {
        self.function.implied_state()
    }
}

impl std::fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.address, self.function)
    }
}

/// An entry for the external events log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub address: Address,
    pub function: Function,
    pub description: String,
    pub timestamp: Timestamp,
}

impl std::fmt::Display for EventRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Device {} ({}) {} {}",
            self.description,
            self.address,
            self.function,
            format_event_time(&self.timestamp)
        )
    }
}
