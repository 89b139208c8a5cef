//! Device state — what the engine believes a device is doing.

use serde::{Deserialize, Serialize};

use crate::function::Function;

/// Tri-state belief about a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    #[default]
    Unknown,
    On,
    Off,
}

impl DeviceState {
    /// Whether a state has been observed (anything but [`Unknown`](Self::Unknown)).
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// The function that drives a device into this state.
    #[must_use]
    pub fn as_function(self) -> Option<Function> {
        match self {
            Self::On => Some(Function::On),
            Self::Off => Some(Function::Off),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.pad("On"),
            Self::Off => f.pad("Off"),
            Self::Unknown => f.pad("Unknown"),
        }
    }
}
