//! Serial link configuration.

use serde::Deserialize;

/// Configuration for the TI103 serial link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device node the adapter is attached to.
    pub device: String,
    /// Line speed; the TI103 talks 9600 8N1.
    pub baud_rate: u32,
    /// How long a blocking read may wait, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyS0".to_string(),
            baud_rate: 9600,
            timeout_ms: 20,
        }
    }
}
