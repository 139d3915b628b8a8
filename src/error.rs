//! # Error Module
//!
//! This module provides custom error types for the `radar_turret` controller.
//! It uses the `thiserror` crate for ergonomic error handling.
//!
//! Malformed lines from the sensor are not errors: they are dropped where they
//! are parsed. Only transport and setup failures surface here.

use thiserror::Error;

/// Result type alias for `radar_turret` operations.
pub type Result<T> = std::result::Result<T, TurretError>;

/// Main error type for the turret controller.
#[derive(Debug, Error)]
pub enum TurretError {
    /// Serial port operation failed.
    #[error("Serial port error: {0}")]
    SerialPort(#[from] tokio_serial::Error),

    /// Failed to open serial port.
    #[error("Failed to open serial port '{port_name}': {reason}")]
    PortOpen { port_name: String, reason: String },

    /// No attached device matched the configured USB identifiers.
    #[error("No serial device found with vendor id {vendor_id:#06x} and product id {product_id:#06x}")]
    PortNotFound { vendor_id: u16, product_id: u16 },

    /// Failed to write to serial port.
    #[error("Failed to write to serial port: {0}")]
    PortWrite(String),

    /// Channel communication error.
    #[error("Channel communication error: {0}")]
    Channel(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIo(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TurretError {
    /// Creates a new port open error.
    #[must_use]
    pub fn port_open(port_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PortOpen {
            port_name: port_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new port-not-found error.
    #[must_use]
    pub fn port_not_found(vendor_id: u16, product_id: u16) -> Self {
        Self::PortNotFound {
            vendor_id,
            product_id,
        }
    }

    /// Creates a new port write error.
    #[must_use]
    pub fn port_write(msg: impl Into<String>) -> Self {
        Self::PortWrite(msg.into())
    }

    /// Creates a new channel error.
    #[must_use]
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Creates a new config parse error.
    #[must_use]
    pub fn config_parse(msg: impl Into<String>) -> Self {
        Self::ConfigParse(msg.into())
    }

    /// Creates a new invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_open_error() {
        let error = TurretError::port_open("/dev/ttyACM0", "Permission denied");
        let msg = error.to_string();
        assert!(msg.contains("/dev/ttyACM0"));
        assert!(msg.contains("Permission denied"));
    }

    #[test]
    fn test_port_not_found_error() {
        let error = TurretError::port_not_found(0x2341, 0x0043);
        let msg = error.to_string();
        assert!(msg.contains("0x2341"));
        assert!(msg.contains("0x0043"));
    }

    #[test]
    fn test_port_write_error() {
        let error = TurretError::port_write("queue full");
        assert!(error.to_string().contains("queue full"));
    }

    #[test]
    fn test_channel_error() {
        let error = TurretError::channel("Receiver dropped");
        assert!(error.to_string().contains("Receiver dropped"));
    }

    #[test]
    fn test_invalid_config_error() {
        let error = TurretError::invalid_config("laser_min_cm > laser_max_cm");
        assert!(error.to_string().contains("laser_min_cm"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: TurretError = io.into();
        assert!(matches!(error, TurretError::FileIo(_)));
    }
}
