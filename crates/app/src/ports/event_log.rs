//! Event log port — the external, human-readable record of device events.

use std::path::Path;

use x10hub_domain::event::EventRecord;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("failed to open events log {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write events log")]
    Write(#[from] std::io::Error),
}

/// Destination for [`EventRecord`]s.
pub trait EventLog {
    /// Point the log at another file, or disable it with `None`.
    fn redirect(&mut self, path: Option<&Path>);

    /// Append one record. A disabled log accepts and drops it.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError`] when the file cannot be opened or written.
    fn append(&mut self, record: &EventRecord) -> Result<(), EventLogError>;
}
