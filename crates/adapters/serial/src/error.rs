//! Serial adapter error types.

use x10hub_app::ports::TransportError;

/// Errors specific to the serial adapter.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The device node could not be opened or configured.
    #[error("failed to open serial device {device}")]
    Open {
        device: String,
        #[source]
        source: serialport::Error,
    },

    /// The port reported an error outside of plain reads and writes.
    #[error("serial port error")]
    Port(#[from] serialport::Error),

    #[error("serial i/o error")]
    Io(#[from] std::io::Error),
}

impl SerialError {
    /// Convert into a [`TransportError`] for propagation across the port
    /// boundary.
    pub fn into_transport(self) -> TransportError {
        match self {
            Self::Io(err) => TransportError::Io(err),
            other => TransportError::Open(Box::new(other)),
        }
    }
}

impl From<SerialError> for TransportError {
    fn from(err: SerialError) -> Self {
        err.into_transport()
    }
}
