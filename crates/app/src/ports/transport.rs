//! Transport port — the byte link to the power-line adapter.

use std::io;

/// Failure talking to the adapter.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    Unavailable,

    #[error("transport i/o error")]
    Io(#[from] io::Error),

    #[error("failed to open transport")]
    Open(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A byte link that may come and go.
///
/// While [`is_available`](Self::is_available) is `false` the engine runs in
/// offline mode and echoes its own commands locally.
pub trait Transport {
    fn is_available(&self) -> bool;

    /// Read what is available without blocking for long.
    ///
    /// `Ok(0)` means nothing to read right now.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the link failed; implementations
    /// should drop to unavailable on fatal errors.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write `bytes`, returning how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unavailable`] when offline.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Try to (re)establish the link.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Open`] when the device cannot be opened.
    fn reconnect(&mut self) -> Result<(), TransportError>;
}

/// A transport that is never connected; everything runs offline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn is_available(&self) -> bool {
        false
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(0)
    }

    fn write(&mut self, _bytes: &[u8]) -> Result<usize, TransportError> {
        Err(TransportError::Unavailable)
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        Err(TransportError::Unavailable)
    }
}
