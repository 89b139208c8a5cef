//! # x10hub-adapter-serial
//!
//! Serial adapter — implements the [`Transport`] port over the TI103's
//! RS-232 link (9600 baud, 8N1, no flow control).
//!
//! The port is opened lazily: a device that is missing at startup, or that
//! fails mid-run, leaves the transport unavailable and the engine carries
//! on in offline mode until [`Transport::reconnect`] succeeds.
//!
//! ## Dependency rule
//! Depends on `x10hub-app` only; never on other adapters.

pub mod config;
pub mod error;

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use x10hub_app::ports::{Transport, TransportError};

pub use config::SerialConfig;
pub use error::SerialError;

/// [`Transport`] backed by a serial device.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a transport without opening the device yet.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    /// Create a transport and try to open the device right away.
    ///
    /// Failure is logged and leaves the transport unavailable.
    #[must_use]
    pub fn open(config: SerialConfig) -> Self {
        let mut transport = Self::new(config);
        if let Err(error) = transport.connect() {
            tracing::warn!(%error, device = %transport.config.device, "serial device unavailable, running offline");
        }
        transport
    }

    #[must_use]
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn connect(&mut self) -> Result<(), SerialError> {
        let port = serialport::new(&self.config.device, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .open()
            .map_err(|source| SerialError::Open {
                device: self.config.device.clone(),
                source,
            })?;
        tracing::info!(device = %self.config.device, baud_rate = self.config.baud_rate, "serial device opened");
        self.port = Some(port);
        Ok(())
    }

    fn disconnect(&mut self, error: &dyn std::error::Error) {
        tracing::warn!(%error, device = %self.config.device, "serial device failed, going offline");
        self.port = None;
    }
}

impl Transport for SerialTransport {
    fn is_available(&self) -> bool {
        self.port.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(0);
        };
        match port.bytes_to_read() {
            Ok(0) => return Ok(0),
            Ok(_) => {}
            Err(error) => {
                self.disconnect(&error);
                return Err(SerialError::Port(error).into());
            }
        }
        match port.read(buf) {
            Ok(n) => Ok(n),
            Err(error) if matches!(error.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(error) => {
                self.disconnect(&error);
                Err(SerialError::Io(error).into())
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::Unavailable);
        };
        match port.write(bytes) {
            Ok(n) => Ok(n),
            Err(error) => {
                self.disconnect(&error);
                Err(SerialError::Io(error).into())
            }
        }
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.port = None;
        self.connect().map_err(SerialError::into_transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_device() -> SerialConfig {
        SerialConfig {
            device: "/nonexistent/x10hub-tty".to_string(),
            ..SerialConfig::default()
        }
    }

    #[test]
    fn should_start_unavailable_when_not_opened() {
        let transport = SerialTransport::new(SerialConfig::default());
        assert!(!transport.is_available());
    }

    #[test]
    fn should_stay_offline_when_device_is_missing() {
        let transport = SerialTransport::open(missing_device());
        assert!(!transport.is_available());
    }

    #[test]
    fn should_report_nothing_to_read_while_offline() {
        let mut transport = SerialTransport::new(missing_device());
        let mut buf = [0u8; 16];
        assert_eq!(transport.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn should_refuse_writes_while_offline() {
        let mut transport = SerialTransport::new(missing_device());
        assert!(matches!(transport.write(b"$>2800008C#"), Err(TransportError::Unavailable)));
    }

    #[test]
    fn should_fail_to_reconnect_missing_device() {
        let mut transport = SerialTransport::new(missing_device());
        let err = transport.reconnect().unwrap_err();
        assert!(matches!(err, TransportError::Open(_)));
        assert!(!transport.is_available());
    }
}
